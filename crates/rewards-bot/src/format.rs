// Copyright 2026 Boundless Foundation, Inc.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Rendering of a [`Report`] into chat messages.

use std::fmt::Write as _;

use chrono::DateTime;
use serde::Serialize;

use crate::{
    amount::plain_string,
    model::{Report, TokenReport},
};

/// Width of the label column in the fixed-width block.
const LABEL_WIDTH: usize = 33;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct EmbedField {
    pub name: String,
    pub value: String,
    pub inline: bool,
}

/// A structured multi-field message.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Embed {
    pub title: String,
    pub fields: Vec<EmbedField>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

/// A report rendered both as a fixed-width text block and as an embed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FormattedMessage {
    pub text: String,
    pub embed: Embed,
}

impl FormattedMessage {
    pub fn render(report: &Report) -> Self {
        Self { text: render_text(report), embed: render_embed(report) }
    }
}

fn event_rows(report: &Report) -> Vec<(&'static str, String)> {
    let event = &report.event;
    vec![
        ("cycle", event.cycle.to_string()),
        ("root", format!("{:#x}", event.root)),
        ("contentHash", format!("{:#x}", event.content_hash)),
        ("startBlock", event.start_block.to_string()),
        ("endBlock", event.end_block.to_string()),
        ("timestamp", event.timestamp.to_string()),
        ("blockNumber", event.block_number.to_string()),
        ("accounts", report.accounts.to_string()),
    ]
}

fn token_rows(token: &TokenReport) -> Vec<(&'static str, String)> {
    let summary = &token.summary;
    let mut rows = vec![
        ("count", summary.count.to_string()),
        ("sum", plain_string(&summary.sum)),
        ("mean", plain_string(&summary.mean)),
        ("median", plain_string(&summary.median)),
        ("min", plain_string(&summary.min)),
        ("max", plain_string(&summary.max)),
    ];
    if let Some(usd) = &summary.usd {
        rows.push(("price(usd)", plain_string(&usd.price)));
        rows.push(("sum(usd)", plain_string(&usd.sum)));
        rows.push(("mean(usd)", plain_string(&usd.mean)));
    }
    rows
}

fn render_text(report: &Report) -> String {
    let mut out = String::from("```\n");
    for (label, value) in event_rows(report) {
        let _ = writeln!(out, "{label:<LABEL_WIDTH$} {value}");
    }
    for token in &report.tokens {
        for (stat, value) in token_rows(token) {
            let label = format!("{} {stat}", token.name);
            let _ = writeln!(out, "{label:<LABEL_WIDTH$} {value}");
        }
    }
    out.push_str("```");
    out
}

fn render_embed(report: &Report) -> Embed {
    let mut fields: Vec<EmbedField> = event_rows(report)
        .into_iter()
        .map(|(name, value)| EmbedField {
            name: name.to_string(),
            value,
            inline: !matches!(name, "root" | "contentHash"),
        })
        .collect();

    for token in &report.tokens {
        let value = token_rows(token)
            .into_iter()
            .map(|(stat, value)| format!("{stat}: {value}"))
            .collect::<Vec<_>>()
            .join("\n");
        fields.push(EmbedField { name: token.name.clone(), value, inline: false });
    }

    Embed {
        title: format!("Rewards cycle {}", report.event.cycle),
        fields,
        timestamp: i64::try_from(report.event.timestamp)
            .ok()
            .and_then(|secs| DateTime::from_timestamp(secs, 0))
            .map(|time| time.to_rfc3339()),
    }
}
