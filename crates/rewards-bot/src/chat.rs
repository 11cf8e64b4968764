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

//! Outbound chat channel.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use thiserror::Error;
use url::Url;

use crate::{errors::CodedError, format::FormattedMessage, impl_coded_debug};

pub const DISCORD_API_URL: &str = "https://discord.com";

#[derive(Error)]
pub enum ChatError {
    #[error("chat request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid chat endpoint: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl_coded_debug!(ChatError);

impl CodedError for ChatError {
    fn code(&self) -> &str {
        match self {
            ChatError::Http(_) => "[R-CHT-7001]",
            ChatError::InvalidUrl(_) => "[R-CHT-7002]",
        }
    }
}

/// How reports are posted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum MessageStyle {
    /// Fixed-width code block.
    #[default]
    Text,
    /// Structured embed with one field per value.
    Embed,
}

#[async_trait]
pub trait ChatChannel: Send + Sync {
    async fn send(&self, message: &FormattedMessage) -> Result<(), ChatError>;
}

/// Posts to a Discord channel through the bot REST API.
#[derive(Clone, Debug)]
pub struct DiscordChannel {
    client: Client,
    api_url: Url,
    token: String,
    channel_id: String,
    style: MessageStyle,
}

impl DiscordChannel {
    pub fn new(
        token: String,
        channel_id: String,
        style: MessageStyle,
        timeout: Duration,
    ) -> Result<Self, ChatError> {
        let client = Client::builder().timeout(timeout).build()?;
        let api_url = Url::parse(DISCORD_API_URL)?;
        Ok(Self { client, api_url, token, channel_id, style })
    }

    pub fn with_api_url(mut self, url: Url) -> Self {
        self.api_url = url;
        self
    }

    fn payload(&self, message: &FormattedMessage) -> serde_json::Value {
        match self.style {
            MessageStyle::Text => json!({ "content": message.text }),
            MessageStyle::Embed => json!({ "embeds": [message.embed] }),
        }
    }
}

#[async_trait]
impl ChatChannel for DiscordChannel {
    async fn send(&self, message: &FormattedMessage) -> Result<(), ChatError> {
        let url = self.api_url.join(&format!("/api/v10/channels/{}/messages", self.channel_id))?;

        self.client
            .post(url)
            .header(reqwest::header::AUTHORIZATION, format!("Bot {}", self.token))
            .json(&self.payload(message))
            .send()
            .await?
            .error_for_status()?;

        tracing::debug!("Posted {:?} message to channel {}", self.style, self.channel_id);
        Ok(())
    }
}
