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

//! Watches a rewards tree contract for new Merkle roots, checks the published rewards document
//! against the chain, and announces a per-token distribution summary to a chat channel.

use std::{path::PathBuf, sync::Arc, time::Duration};

use alloy::{
    primitives::Address, providers::ProviderBuilder, rpc::client::RpcClient,
    transports::layers::RetryBackoffLayer,
};
use anyhow::{ensure, Context, Result};
use clap::Parser;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use url::Url;

pub mod amount;
pub mod api;
pub mod cache;
pub mod chain;
pub mod chat;
pub mod contracts;
pub mod errors;
pub mod format;
pub mod model;
pub mod monitor;
pub mod price;
pub mod reconcile;
pub mod storage;
pub mod summary;
pub mod tokens;

use crate::{
    chain::{BadgerTree, RewardsContract},
    chat::{DiscordChannel, MessageStyle},
    monitor::{MonitorConfig, RewardsMonitor},
    price::CoinGeckoLookup,
    storage::{FileTreeSource, S3TreeSource, TreeSource},
    tokens::TokenRegistry,
};

/// Compute units per second assumed by the RPC retry layer.
const RPC_RETRY_CU: u64 = 200;

const CHAT_TIMEOUT: Duration = Duration::from_secs(30);

/// Command line arguments
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// URL of the Ethereum RPC endpoint.
    #[clap(long, env)]
    pub rpc_url: Url,

    /// Address of the rewards tree contract.
    #[clap(long, env)]
    pub badger_tree_address: Address,

    /// Discord bot token used to post announcements.
    #[clap(long, env, hide_env_values = true)]
    pub bot_token_rewards: String,

    /// Discord channel that receives announcements.
    #[clap(long, env)]
    pub discord_channel_id: String,

    /// Read rewards documents from `--local-tree-dir` and skip validation against the chain.
    #[clap(long, env, default_value_t = false)]
    pub test_mode: bool,

    /// Seconds between polls of the contract.
    #[clap(long, env, default_value_t = 300)]
    pub poll_interval: u64,

    /// Bucket holding published rewards documents.
    #[clap(long, env, default_value = "badger-json")]
    pub tree_bucket: String,

    /// Key prefix of rewards documents within the bucket.
    #[clap(long, env, default_value = "rewards/")]
    pub tree_prefix: String,

    /// Directory of rewards documents used in test mode.
    #[clap(long, env, default_value = "data")]
    pub local_tree_dir: PathBuf,

    /// AWS region of the bucket. Defaults to the AWS configuration chain.
    #[clap(long, env)]
    pub aws_region: Option<String>,

    /// Base URL of the CoinGecko API.
    #[clap(long, env)]
    pub coingecko_api_url: Option<Url>,

    /// Timeout in seconds for a single price lookup.
    #[clap(long, env, default_value_t = 10)]
    pub price_timeout: u64,

    /// Report token amounts without USD values.
    #[clap(long, env, default_value_t = false)]
    pub disable_prices: bool,

    /// TOML token list extending or overriding the built-in tokens.
    #[clap(long, env)]
    pub token_list: Option<PathBuf>,

    /// Additional tokens left out of the summary, comma separated.
    #[clap(long, env, value_delimiter = ',')]
    pub excluded_tokens: Vec<Address>,

    /// How announcements are rendered in the channel.
    #[clap(long, env, value_enum, default_value_t = MessageStyle::Text)]
    pub message_style: MessageStyle,

    /// Base URL of the Discord API.
    #[clap(long, env, hide = true)]
    pub discord_api_url: Option<Url>,

    /// Announce the report built at start-up as well.
    #[clap(long, env, default_value_t = false)]
    pub announce_on_startup: bool,

    /// Verify every claim proof in the document against the on-chain root.
    #[clap(long, env, default_value_t = false)]
    pub verify_proofs: bool,

    /// First block scanned for root updates.
    #[clap(long, env)]
    pub start_block: Option<u64>,

    /// Maximum number of blocks per log query.
    #[clap(long, env, default_value_t = monitor::DEFAULT_EVENTS_POLL_BLOCKS)]
    pub events_poll_blocks: u64,

    /// Bind address of the query API.
    #[clap(long, env, default_value = "0.0.0.0:8080")]
    pub bind_addr: String,

    /// Log in JSON format.
    #[clap(long, env, default_value_t = false)]
    pub log_json: bool,

    /// Maximum number of retries of an RPC request.
    #[clap(long, env, default_value_t = 10)]
    pub rpc_retry_max: u32,

    /// Initial backoff in milliseconds between RPC retries.
    #[clap(long, env, default_value_t = 1000)]
    pub rpc_retry_backoff: u64,
}

impl Args {
    /// Rejects configurations that cannot run, before anything is started.
    pub fn validate(&self) -> Result<()> {
        ensure!(!self.bot_token_rewards.trim().is_empty(), "BOT_TOKEN_REWARDS must not be empty");
        ensure!(
            !self.discord_channel_id.is_empty()
                && self.discord_channel_id.chars().all(|c| c.is_ascii_digit()),
            "DISCORD_CHANNEL_ID must be a numeric channel id, got {:?}",
            self.discord_channel_id
        );
        ensure!(self.badger_tree_address != Address::ZERO, "BADGER_TREE_ADDRESS must be set");
        ensure!(self.poll_interval > 0, "POLL_INTERVAL must be greater than zero");
        ensure!(self.events_poll_blocks > 0, "EVENTS_POLL_BLOCKS must be greater than zero");
        Ok(())
    }

    pub fn monitor_config(&self) -> MonitorConfig {
        MonitorConfig {
            poll_interval: Duration::from_secs(self.poll_interval),
            bypass_validation: self.test_mode,
            verify_proofs: self.verify_proofs,
            announce_on_startup: self.announce_on_startup,
            start_block: self.start_block,
            events_poll_blocks: self.events_poll_blocks,
        }
    }

    pub async fn token_registry(&self) -> Result<TokenRegistry> {
        let mut registry = TokenRegistry::builtin();
        if let Some(path) = &self.token_list {
            registry = registry.load(path).await.context("Failed to load token list")?;
        }
        Ok(registry.with_excluded(self.excluded_tokens.iter().copied()))
    }

    async fn tree_source(&self) -> Arc<dyn TreeSource> {
        if self.test_mode {
            tracing::warn!(
                "Test mode: reading rewards documents from {} without validation",
                self.local_tree_dir.display()
            );
            Arc::new(FileTreeSource::new(self.local_tree_dir.clone()))
        } else {
            tracing::info!(
                "Reading rewards documents from s3://{}/{}",
                self.tree_bucket,
                self.tree_prefix
            );
            Arc::new(
                S3TreeSource::new(
                    self.tree_bucket.clone(),
                    self.tree_prefix.clone(),
                    self.aws_region.clone(),
                )
                .await,
            )
        }
    }
}

/// Builds the monitor and the query API from `args` and runs both until shutdown.
pub async fn run(args: &Args) -> Result<()> {
    args.validate()?;

    let registry = args.token_registry().await?;

    let client = RpcClient::builder()
        .layer(RetryBackoffLayer::new(args.rpc_retry_max, args.rpc_retry_backoff, RPC_RETRY_CU))
        .http(args.rpc_url.clone());
    let provider = ProviderBuilder::new().disable_recommended_fillers().connect_client(client);
    let tree = BadgerTree::new(args.badger_tree_address, provider);
    let chain_id = tree.chain_id().await.context("Failed to query chain id")?;
    tracing::info!("Watching rewards tree {} on chain {chain_id}", tree.address());
    let contract: Arc<dyn RewardsContract> = Arc::new(tree);

    let mut chat = DiscordChannel::new(
        args.bot_token_rewards.clone(),
        args.discord_channel_id.clone(),
        args.message_style,
        CHAT_TIMEOUT,
    )
    .context("Failed to build Discord client")?;
    if let Some(url) = &args.discord_api_url {
        chat = chat.with_api_url(url.clone());
    }

    let mut monitor = RewardsMonitor::new(
        contract,
        args.tree_source().await,
        Arc::new(chat),
        registry,
        args.monitor_config(),
    );
    if args.disable_prices {
        tracing::info!("Price lookups disabled, reporting token amounts only");
    } else {
        let mut lookup = CoinGeckoLookup::new(Duration::from_secs(args.price_timeout))
            .context("Failed to build price client")?;
        if let Some(url) = &args.coingecko_api_url {
            lookup = lookup.with_api_url(url.clone());
        }
        monitor = monitor.with_prices(Arc::new(lookup));
    }

    let cancel_token = CancellationToken::new();
    let listener = TcpListener::bind(&args.bind_addr)
        .await
        .with_context(|| format!("Failed to bind query API to {}", args.bind_addr))?;
    let mut api_task = tokio::spawn(api::serve(listener, monitor.reader(), cancel_token.clone()));
    let monitor_task = tokio::spawn(monitor.run(cancel_token.clone()));

    let api_result = tokio::select! {
        _ = shutdown_signal() => {
            tracing::info!("Shutdown signal received");
            cancel_token.cancel();
            api_task.await
        }
        res = &mut api_task => {
            cancel_token.cancel();
            res
        }
    };

    monitor_task.await.context("Rewards monitor task panicked")?;
    api_result.context("Query API task panicked")??;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {err}");
            std::future::pending::<()>().await;
        }
    };

    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!("Failed to install SIGTERM handler: {err}");
                std::future::pending::<()>().await;
            }
        }
    };

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
