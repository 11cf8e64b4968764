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

//! HTTP query surface over the cached report.

use anyhow::{Context, Result};
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use crate::cache::ReportReader;

pub const REWARDS_PATH: &str = "rewards";
pub const SUMMARY_PATH: &str = "rewards/summary";
pub const HEALTH_PATH: &str = "health";

const NO_REPORT: &str = "No rewards report has been computed yet";

#[derive(Serialize)]
struct ErrMsg {
    r#type: String,
    msg: String,
}

#[derive(Debug, Serialize)]
struct Health {
    status: &'static str,
    cycle: Option<u64>,
}

fn not_found() -> Response {
    (StatusCode::NOT_FOUND, Json(ErrMsg { r#type: "NotFound".into(), msg: NO_REPORT.into() }))
        .into_response()
}

/// The cached message text, the same text the last announcement carried.
async fn rewards(State(reader): State<ReportReader>) -> Response {
    match reader.message() {
        Some(message) => message.text.into_response(),
        None => not_found(),
    }
}

async fn summary(State(reader): State<ReportReader>) -> Response {
    match reader.report() {
        Some(report) => Json(report).into_response(),
        None => not_found(),
    }
}

async fn health(State(reader): State<ReportReader>) -> Json<Health> {
    Json(Health { status: "ok", cycle: reader.cycle() })
}

/// Create the application router
pub fn app(reader: ReportReader) -> Router {
    Router::new()
        .route(&format!("/{REWARDS_PATH}"), get(rewards))
        .route(&format!("/{SUMMARY_PATH}"), get(summary))
        .route(&format!("/{HEALTH_PATH}"), get(health))
        .with_state(reader)
}

/// Serve the query API on `listener` until `cancel_token` fires.
pub async fn serve(
    listener: TcpListener,
    reader: ReportReader,
    cancel_token: CancellationToken,
) -> Result<()> {
    if let Ok(addr) = listener.local_addr() {
        tracing::info!("Rewards query API listening on: {addr}");
    }
    axum::serve(listener, app(reader))
        .with_graceful_shutdown(async move { cancel_token.cancelled().await })
        .await
        .context("Rewards query API failed")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::net::{Ipv4Addr, SocketAddr};

    use alloy::primitives::B256;
    use chrono::Utc;

    use super::*;
    use crate::{
        cache::{CacheEntry, ReportCache},
        format::FormattedMessage,
        model::{Report, RewardsTree, RootUpdateEvent},
    };

    fn entry(cycle: u64) -> CacheEntry {
        let event = RootUpdateEvent {
            cycle,
            root: B256::repeat_byte(1),
            content_hash: B256::repeat_byte(2),
            start_block: 100,
            end_block: 200,
            timestamp: 1_610_000_000,
            block_number: 210,
        };
        let tree = RewardsTree::from_slice(
            br#"{"merkleRoot": "0x0101010101010101010101010101010101010101010101010101010101010101", "endBlock": 200}"#,
        )
        .unwrap();
        let report = Report { event, accounts: 0, tokens: vec![], generated_at: Utc::now() };
        let message = FormattedMessage::render(&report);
        CacheEntry::new(tree, report, message)
    }

    async fn spawn(cache: &ReportCache) -> (String, CancellationToken) {
        let listener = TcpListener::bind(SocketAddr::from((Ipv4Addr::LOCALHOST, 0))).await.unwrap();
        let addr = listener.local_addr().unwrap();
        let cancel = CancellationToken::new();
        tokio::spawn(serve(listener, cache.reader(), cancel.clone()));
        (format!("http://{addr}"), cancel)
    }

    #[tokio::test]
    async fn not_found_before_first_report() {
        let cache = ReportCache::new();
        let (base, cancel) = spawn(&cache).await;

        let res = reqwest::get(format!("{base}/{REWARDS_PATH}")).await.unwrap();
        assert_eq!(res.status(), reqwest::StatusCode::NOT_FOUND);
        let res = reqwest::get(format!("{base}/{SUMMARY_PATH}")).await.unwrap();
        assert_eq!(res.status(), reqwest::StatusCode::NOT_FOUND);

        let health: serde_json::Value =
            reqwest::get(format!("{base}/{HEALTH_PATH}")).await.unwrap().json().await.unwrap();
        assert_eq!(health["status"], "ok");
        assert!(health["cycle"].is_null());
        cancel.cancel();
    }

    #[tokio::test]
    async fn echoes_cached_message() {
        let cache = ReportCache::new();
        let (base, cancel) = spawn(&cache).await;

        cache.replace(entry(5));
        let expected = cache.current().unwrap().message.text.clone();
        let body =
            reqwest::get(format!("{base}/{REWARDS_PATH}")).await.unwrap().text().await.unwrap();
        assert_eq!(body, expected);

        cache.replace(entry(6));
        let summary: serde_json::Value =
            reqwest::get(format!("{base}/{SUMMARY_PATH}")).await.unwrap().json().await.unwrap();
        assert_eq!(summary["event"]["cycle"], 6);
        assert_eq!(summary["accounts"], 0);
        cancel.cancel();
    }
}
