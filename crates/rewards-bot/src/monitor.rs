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

//! Fixed-interval poller driving fetch, validation, summarisation and announcement of new cycles.

use std::{sync::Arc, time::Duration};

use chrono::Utc;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use crate::{
    cache::{CacheEntry, ReportCache, ReportReader},
    chain::{ChainError, RewardsContract},
    chat::ChatChannel,
    errors::CodedError,
    format::FormattedMessage,
    impl_coded_debug,
    model::{Report, RootUpdateEvent, TokenReport},
    price::PriceLookup,
    reconcile::{validate, verify_claims, ValidationError},
    storage::{StorageError, TreeSource},
    summary::{apply_prices, summarize, SummaryError},
    tokens::TokenRegistry,
};

/// Default number of blocks per `RootUpdated` log query.
pub const DEFAULT_EVENTS_POLL_BLOCKS: u64 = 10_000;

#[derive(Error)]
pub enum PipelineError {
    #[error("upstream unavailable: {0}")]
    UpstreamChain(#[from] ChainError),

    #[error("upstream unavailable: {0}")]
    UpstreamStorage(#[from] StorageError),

    #[error("rewards document rejected: {0}")]
    Validation(#[from] ValidationError),

    #[error("summary failed: {0}")]
    Summary(#[from] SummaryError),
}

impl_coded_debug!(PipelineError);

impl PipelineError {
    /// Whether the failure came from a collaborator rather than from the published data.
    pub fn is_upstream(&self) -> bool {
        matches!(self, PipelineError::UpstreamChain(_) | PipelineError::UpstreamStorage(_))
    }
}

impl CodedError for PipelineError {
    fn code(&self) -> &str {
        match self {
            PipelineError::UpstreamChain(err) => err.code(),
            PipelineError::UpstreamStorage(err) => err.code(),
            PipelineError::Validation(err) => err.code(),
            PipelineError::Summary(err) => err.code(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct MonitorConfig {
    pub poll_interval: Duration,
    /// Accept any document without checking it against the chain.
    pub bypass_validation: bool,
    /// Check every published claim proof against the on-chain root.
    pub verify_proofs: bool,
    /// Post the report built at start-up, not only reports for later cycles.
    pub announce_on_startup: bool,
    /// First block scanned for `RootUpdated` logs. Without it the first run reads the current
    /// merkle data and scanning starts at the head.
    pub start_block: Option<u64>,
    pub events_poll_blocks: u64,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(300),
            bypass_validation: false,
            verify_proofs: false,
            announce_on_startup: false,
            start_block: None,
            events_poll_blocks: DEFAULT_EVENTS_POLL_BLOCKS,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MonitorState {
    Idle,
    Reconciling { cycle: u64 },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickOutcome {
    /// The on-chain cycle matches the cached report.
    Unchanged,
    /// A new report replaced the cache.
    Updated { cycle: u64, announced: bool },
}

pub struct RewardsMonitor {
    contract: Arc<dyn RewardsContract>,
    trees: Arc<dyn TreeSource>,
    prices: Option<Arc<dyn PriceLookup>>,
    chat: Arc<dyn ChatChannel>,
    registry: TokenRegistry,
    config: MonitorConfig,
    cache: ReportCache,
    state: MonitorState,
    chain_id: Option<u64>,
    /// Cycle observed by the first poll. A report for it is the start-up report.
    startup_cycle: Option<u64>,
    /// Highest block whose `RootUpdated` logs have been processed.
    last_seen_block: Option<u64>,
}

impl RewardsMonitor {
    pub fn new(
        contract: Arc<dyn RewardsContract>,
        trees: Arc<dyn TreeSource>,
        chat: Arc<dyn ChatChannel>,
        registry: TokenRegistry,
        config: MonitorConfig,
    ) -> Self {
        let last_seen_block = config.start_block.map(|block| block.saturating_sub(1));
        Self {
            contract,
            trees,
            prices: None,
            chat,
            registry,
            config,
            cache: ReportCache::new(),
            state: MonitorState::Idle,
            chain_id: None,
            startup_cycle: None,
            last_seen_block,
        }
    }

    pub fn with_prices(mut self, prices: Arc<dyn PriceLookup>) -> Self {
        self.prices = Some(prices);
        self
    }

    pub fn reader(&self) -> ReportReader {
        self.cache.reader()
    }

    pub fn state(&self) -> MonitorState {
        self.state
    }

    pub fn last_seen_block(&self) -> Option<u64> {
        self.last_seen_block
    }

    async fn chain_id(&mut self) -> Result<u64, ChainError> {
        if let Some(chain_id) = self.chain_id {
            return Ok(chain_id);
        }
        let chain_id = self.contract.chain_id().await?;
        self.chain_id = Some(chain_id);
        Ok(chain_id)
    }

    /// Runs one poll: detects a new cycle and, if there is one, rebuilds and announces the report.
    ///
    /// On failure the cache and the log cursor are left as they were.
    pub async fn tick(&mut self) -> Result<TickOutcome, PipelineError> {
        let cycle = self.contract.current_cycle().await?;
        let startup_cycle = *self.startup_cycle.get_or_insert(cycle);
        let cached = self.cache.cycle();
        if cached == Some(cycle) {
            tracing::debug!("Cycle {cycle} unchanged");
            return Ok(TickOutcome::Unchanged);
        }

        tracing::info!("Cycle changed from {cached:?} to {cycle}, reconciling");
        self.state = MonitorState::Reconciling { cycle };
        let result = self.reconcile(cycle).await;
        self.state = MonitorState::Idle;
        let (entry, head) = result?;

        let startup = cached.is_none() && cycle == startup_cycle;
        let message = entry.message.clone();
        let accounts = entry.tree().account_entries();
        if let Some(previous) = self.cache.replace(entry) {
            tracing::info!(
                "Replaced cycle {} report ({} accounts) with cycle {cycle} ({accounts} accounts)",
                previous.cycle(),
                previous.tree().account_entries()
            );
        }
        self.last_seen_block = Some(head);

        let announced = if startup && !self.config.announce_on_startup {
            tracing::info!("Cached start-up report for cycle {cycle}");
            false
        } else {
            self.announce(cycle, &message).await
        };

        Ok(TickOutcome::Updated { cycle, announced })
    }

    async fn announce(&self, cycle: u64, message: &FormattedMessage) -> bool {
        match self.chat.send(message).await {
            Ok(()) => {
                tracing::info!("Announced rewards cycle {cycle}");
                true
            }
            Err(err) => {
                tracing::error!("Failed to announce cycle {cycle}: {err:?}");
                false
            }
        }
    }

    /// Finds the event for `cycle` and builds its report. Returns the entry and the head block the
    /// log scan reached.
    async fn reconcile(&mut self, cycle: u64) -> Result<(CacheEntry, u64), PipelineError> {
        let chain_id = self.chain_id().await?;
        let (event, head) = self.find_event(cycle).await?;

        let span = tracing::info_span!(
            "reconcile",
            cycle = event.cycle,
            content_hash = %event.content_hash,
            block_number = event.block_number
        );
        match self.build_entry(event.clone(), chain_id).instrument(span).await {
            Ok(entry) => Ok((entry, head)),
            Err(err) => {
                tracing::error!(
                    cycle = event.cycle,
                    content_hash = %event.content_hash,
                    start_block = event.start_block,
                    end_block = event.end_block,
                    block_number = event.block_number,
                    "Discarding rewards update: {err:?}"
                );
                Err(err)
            }
        }
    }

    async fn find_event(&self, cycle: u64) -> Result<(RootUpdateEvent, u64), PipelineError> {
        let head = self.contract.block_number().await?;

        let Some(last_seen) = self.last_seen_block else {
            let event = self.contract.current_merkle_data().await?;
            tracing::debug!("Using current merkle data for cycle {}", event.cycle);
            return Ok((event, head));
        };

        let chunk = self.config.events_poll_blocks.max(1);
        let mut newest: Option<RootUpdateEvent> = None;
        let mut from_block = last_seen.saturating_add(1);
        while from_block <= head {
            let chunk_end = std::cmp::min(from_block.saturating_add(chunk - 1), head);
            for event in self.contract.root_updates(from_block, chunk_end).await? {
                if event.cycle != cycle {
                    tracing::info!("Skipping superseded cycle {} root update", event.cycle);
                    continue;
                }
                newest = Some(event);
            }
            from_block = chunk_end.saturating_add(1);
        }

        match newest {
            Some(event) => Ok((event, head)),
            None => {
                tracing::warn!(
                    "No RootUpdated log for cycle {cycle} past block {last_seen}, using merkle data"
                );
                Ok((self.contract.current_merkle_data().await?, head))
            }
        }
    }

    async fn build_entry(
        &self,
        event: RootUpdateEvent,
        chain_id: u64,
    ) -> Result<CacheEntry, PipelineError> {
        let tree = self.trees.fetch_tree(&event, chain_id).await?;

        validate(&tree, &event, self.config.bypass_validation)?;
        if self.config.verify_proofs && !self.config.bypass_validation {
            verify_claims(&tree, event.root)?;
        }

        let mut summaries = summarize(&tree, &self.registry, self.registry.excluded())?;
        if let Some(prices) = &self.prices {
            let failures = apply_prices(&mut summaries, &self.registry, prices.as_ref()).await;
            if !failures.is_empty() {
                tracing::warn!("{} tokens reported without USD values", failures.len());
            }
        }

        let tokens = summaries
            .into_iter()
            .map(|(token, summary)| TokenReport {
                token,
                name: self
                    .registry
                    .get(&token)
                    .map(|info| info.name.clone())
                    .unwrap_or_else(|| token.to_string()),
                summary,
            })
            .collect();

        let report =
            Report { event, accounts: tree.account_entries(), tokens, generated_at: Utc::now() };
        let message = FormattedMessage::render(&report);
        tracing::debug!("Built report for {} tokens", report.tokens.len());

        Ok(CacheEntry::new(tree, report, message))
    }

    /// Polls every `poll_interval` until cancelled. The first poll happens immediately.
    pub async fn run(mut self, cancel_token: CancellationToken) {
        tracing::info!("Starting rewards monitor, polling every {:?}", self.config.poll_interval);

        let mut interval = tokio::time::interval(self.config.poll_interval);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    match self.tick().await {
                        Err(err) if err.is_upstream() => {
                            tracing::warn!("Rewards poll skipped, upstream unavailable: {err:?}");
                        }
                        Err(err) => {
                            tracing::error!("Rewards poll failed, keeping cached report: {err:?}");
                        }
                        Ok(_) => {}
                    }
                }
                _ = cancel_token.cancelled() => {
                    tracing::info!("Rewards monitor shutting down");
                    break;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{
        collections::HashMap,
        sync::{
            atomic::{AtomicBool, Ordering},
            Mutex,
        },
    };

    use alloy::primitives::B256;
    use async_trait::async_trait;
    use serde_json::json;
    use tracing_test::traced_test;

    use super::*;
    use crate::{chat::ChatError, tokens::BADGER};

    struct ChainState {
        cycle: u64,
        head: u64,
        current: RootUpdateEvent,
        events: Vec<RootUpdateEvent>,
        scans: Vec<(u64, u64)>,
    }

    struct MockContract(Mutex<ChainState>);

    impl MockContract {
        fn new(current: RootUpdateEvent, head: u64) -> Self {
            Self(Mutex::new(ChainState {
                cycle: current.cycle,
                head,
                current,
                events: vec![],
                scans: vec![],
            }))
        }

        fn publish(&self, event: RootUpdateEvent, head: u64) {
            let mut state = self.0.lock().unwrap();
            state.cycle = event.cycle;
            state.head = head;
            state.current = event.clone();
            state.events.push(event);
        }

        fn scans(&self) -> Vec<(u64, u64)> {
            self.0.lock().unwrap().scans.clone()
        }
    }

    #[async_trait]
    impl RewardsContract for MockContract {
        async fn chain_id(&self) -> Result<u64, ChainError> {
            Ok(1)
        }

        async fn block_number(&self) -> Result<u64, ChainError> {
            Ok(self.0.lock().unwrap().head)
        }

        async fn current_cycle(&self) -> Result<u64, ChainError> {
            Ok(self.0.lock().unwrap().cycle)
        }

        async fn current_merkle_data(&self) -> Result<RootUpdateEvent, ChainError> {
            Ok(self.0.lock().unwrap().current.clone())
        }

        async fn root_updates(
            &self,
            from_block: u64,
            to_block: u64,
        ) -> Result<Vec<RootUpdateEvent>, ChainError> {
            let mut state = self.0.lock().unwrap();
            state.scans.push((from_block, to_block));
            Ok(state
                .events
                .iter()
                .filter(|event| (from_block..=to_block).contains(&event.block_number))
                .cloned()
                .collect())
        }
    }

    #[derive(Default)]
    struct MemorySource(Mutex<HashMap<String, Vec<u8>>>);

    impl MemorySource {
        fn insert(&self, event: &RootUpdateEvent, document: serde_json::Value) {
            self.0
                .lock()
                .unwrap()
                .insert(event.file_name(1), serde_json::to_vec(&document).unwrap());
        }
    }

    #[async_trait]
    impl TreeSource for MemorySource {
        async fn fetch(&self, name: &str) -> Result<Vec<u8>, StorageError> {
            self.0
                .lock()
                .unwrap()
                .get(name)
                .cloned()
                .ok_or_else(|| StorageError::NotFound(name.to_string()))
        }
    }

    #[derive(Default)]
    struct RecordingChannel {
        sent: Mutex<Vec<FormattedMessage>>,
        fail: AtomicBool,
    }

    impl RecordingChannel {
        fn sent(&self) -> Vec<FormattedMessage> {
            self.sent.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ChatChannel for RecordingChannel {
        async fn send(&self, message: &FormattedMessage) -> Result<(), ChatError> {
            if self.fail.load(Ordering::SeqCst) {
                return Err(ChatError::InvalidUrl(url::ParseError::EmptyHost));
            }
            self.sent.lock().unwrap().push(message.clone());
            Ok(())
        }
    }

    fn event(cycle: u64, block_number: u64) -> RootUpdateEvent {
        RootUpdateEvent {
            cycle,
            root: B256::repeat_byte(cycle as u8),
            content_hash: B256::repeat_byte(0x80 | cycle as u8),
            start_block: block_number - 200,
            end_block: block_number - 10,
            timestamp: 1_610_000_000 + cycle,
            block_number,
        }
    }

    fn document(event: &RootUpdateEvent, root: B256) -> serde_json::Value {
        json!({
            "merkleRoot": root,
            "cycle": event.cycle,
            "startBlock": event.start_block.to_string(),
            "endBlock": event.end_block,
            "userData": {
                "native.badger": {
                    "0x1111111111111111111111111111111111111111": {
                        "totals": { (BADGER.to_string()): "1000000000000000000" }
                    },
                    "0x2222222222222222222222222222222222222222": {
                        "totals": { (BADGER.to_string()): 3e18 }
                    }
                }
            }
        })
    }

    struct Harness {
        contract: Arc<MockContract>,
        source: Arc<MemorySource>,
        chat: Arc<RecordingChannel>,
        monitor: RewardsMonitor,
    }

    fn harness(config: MonitorConfig) -> Harness {
        let first = event(5, 1_000);
        let contract = Arc::new(MockContract::new(first.clone(), 1_000));
        let source = Arc::new(MemorySource::default());
        source.insert(&first, document(&first, first.root));
        let chat = Arc::new(RecordingChannel::default());
        let monitor = RewardsMonitor::new(
            contract.clone(),
            source.clone(),
            chat.clone(),
            TokenRegistry::builtin(),
            config,
        );
        Harness { contract, source, chat, monitor }
    }

    #[tokio::test]
    #[traced_test]
    async fn startup_primes_cache_without_announcing() {
        let mut h = harness(MonitorConfig::default());
        let reader = h.monitor.reader();
        assert!(reader.message().is_none());

        let outcome = h.monitor.tick().await.unwrap();
        assert_eq!(outcome, TickOutcome::Updated { cycle: 5, announced: false });
        assert!(h.chat.sent().is_empty());
        assert_eq!(reader.cycle(), Some(5));
        assert_eq!(h.monitor.last_seen_block(), Some(1_000));
        assert_eq!(h.monitor.state(), MonitorState::Idle);
        assert!(logs_contain("Cached start-up report for cycle 5"));

        assert_eq!(h.monitor.tick().await.unwrap(), TickOutcome::Unchanged);
        assert!(h.contract.scans().is_empty());
    }

    #[tokio::test]
    async fn new_cycle_after_failed_startup_is_announced() {
        let mut h = harness(MonitorConfig::default());
        let first = event(5, 1_000);
        h.source.insert(&first, document(&first, B256::repeat_byte(0xee)));

        assert!(h.monitor.tick().await.is_err());
        assert!(h.monitor.reader().message().is_none());

        let next = event(6, 1_100);
        h.source.insert(&next, document(&next, next.root));
        h.contract.publish(next, 1_150);

        let outcome = h.monitor.tick().await.unwrap();
        assert_eq!(outcome, TickOutcome::Updated { cycle: 6, announced: true });
        assert_eq!(h.chat.sent().len(), 1);
    }

    #[tokio::test]
    async fn startup_cycle_retried_after_failure_stays_silent() {
        let mut h = harness(MonitorConfig::default());
        let first = event(5, 1_000);
        h.source.insert(&first, document(&first, B256::repeat_byte(0xee)));
        assert!(h.monitor.tick().await.is_err());

        h.source.insert(&first, document(&first, first.root));
        let outcome = h.monitor.tick().await.unwrap();
        assert_eq!(outcome, TickOutcome::Updated { cycle: 5, announced: false });
        assert!(h.chat.sent().is_empty());
    }

    #[tokio::test]
    async fn announce_on_startup() {
        let mut h = harness(MonitorConfig { announce_on_startup: true, ..Default::default() });
        let outcome = h.monitor.tick().await.unwrap();
        assert_eq!(outcome, TickOutcome::Updated { cycle: 5, announced: true });
        assert_eq!(h.chat.sent().len(), 1);
    }

    #[tokio::test]
    async fn new_cycle_sends_exactly_one_message() {
        let mut h = harness(MonitorConfig::default());
        h.monitor.tick().await.unwrap();

        let next = event(6, 1_100);
        h.source.insert(&next, document(&next, next.root));
        h.contract.publish(next, 1_150);

        let outcome = h.monitor.tick().await.unwrap();
        assert_eq!(outcome, TickOutcome::Updated { cycle: 6, announced: true });
        assert_eq!(h.monitor.tick().await.unwrap(), TickOutcome::Unchanged);

        let sent = h.chat.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(Some(sent[0].clone()), h.monitor.reader().message());
        assert!(sent[0].text.contains("cycle"));
        assert_eq!(h.monitor.last_seen_block(), Some(1_150));
        assert_eq!(h.contract.scans(), vec![(1_001, 1_150)]);

        let report = h.monitor.reader().report().unwrap();
        assert_eq!(report.accounts, 2);
        assert_eq!(report.tokens.len(), 1);
        assert_eq!(report.tokens[0].name, "BADGER");
    }

    #[tokio::test]
    #[traced_test]
    async fn root_mismatch_keeps_previous_report() {
        let mut h = harness(MonitorConfig::default());
        h.monitor.tick().await.unwrap();
        let before = h.monitor.reader().message();

        let next = event(6, 1_100);
        h.source.insert(&next, document(&next, B256::repeat_byte(0xee)));
        h.contract.publish(next, 1_150);

        let err = h.monitor.tick().await.unwrap_err();
        assert!(matches!(err, PipelineError::Validation(ValidationError::RootMismatch { .. })));
        assert!(!err.is_upstream());
        assert!(h.chat.sent().is_empty());
        assert_eq!(h.monitor.reader().message(), before);
        assert_eq!(h.monitor.reader().cycle(), Some(5));
        assert_eq!(h.monitor.last_seen_block(), Some(1_000));
        assert_eq!(h.monitor.state(), MonitorState::Idle);
        assert!(logs_contain("Discarding rewards update"));
    }

    #[tokio::test]
    async fn bypass_accepts_mismatched_root() {
        let mut h = harness(MonitorConfig { bypass_validation: true, ..Default::default() });
        h.monitor.tick().await.unwrap();

        let next = event(6, 1_100);
        h.source.insert(&next, document(&next, B256::repeat_byte(0xee)));
        h.contract.publish(next, 1_150);

        let outcome = h.monitor.tick().await.unwrap();
        assert_eq!(outcome, TickOutcome::Updated { cycle: 6, announced: true });
    }

    #[tokio::test]
    async fn missing_document_is_upstream_failure() {
        let mut h = harness(MonitorConfig::default());
        h.monitor.tick().await.unwrap();

        h.contract.publish(event(6, 1_100), 1_150);

        let err = h.monitor.tick().await.unwrap_err();
        assert!(matches!(err, PipelineError::UpstreamStorage(StorageError::NotFound(_))));
        assert!(err.is_upstream());
        assert_eq!(h.monitor.reader().cycle(), Some(5));

        // Retried on the next tick once the document shows up.
        let next = event(6, 1_100);
        h.source.insert(&next, document(&next, next.root));
        let outcome = h.monitor.tick().await.unwrap();
        assert_eq!(outcome, TickOutcome::Updated { cycle: 6, announced: true });
    }

    #[tokio::test]
    async fn scans_logs_in_chunks() {
        let mut h = harness(MonitorConfig { events_poll_blocks: 100, ..Default::default() });
        h.monitor.tick().await.unwrap();

        let next = event(6, 1_120);
        h.source.insert(&next, document(&next, next.root));
        h.contract.publish(next, 1_250);

        h.monitor.tick().await.unwrap();
        assert_eq!(h.contract.scans(), vec![(1_001, 1_100), (1_101, 1_200), (1_201, 1_250)]);
        assert_eq!(h.monitor.last_seen_block(), Some(1_250));
    }

    #[tokio::test]
    async fn takes_newest_event_for_current_cycle() {
        let mut h = harness(MonitorConfig::default());
        h.monitor.tick().await.unwrap();

        let skipped = event(6, 1_050);
        h.contract.publish(skipped, 1_060);
        let latest = event(7, 1_100);
        h.source.insert(&latest, document(&latest, latest.root));
        h.contract.publish(latest, 1_150);

        let outcome = h.monitor.tick().await.unwrap();
        assert_eq!(outcome, TickOutcome::Updated { cycle: 7, announced: true });
        assert_eq!(h.chat.sent().len(), 1);
    }

    #[tokio::test]
    async fn falls_back_to_current_merkle_data() {
        let mut h = harness(MonitorConfig::default());
        h.monitor.tick().await.unwrap();

        // Event emitted before the cursor, so the scan window holds nothing.
        let next = event(6, 900);
        h.source.insert(&next, document(&next, next.root));
        h.contract.publish(next, 1_150);

        let outcome = h.monitor.tick().await.unwrap();
        assert_eq!(outcome, TickOutcome::Updated { cycle: 6, announced: true });
    }

    #[tokio::test]
    async fn failed_send_keeps_new_report() {
        let mut h = harness(MonitorConfig::default());
        h.monitor.tick().await.unwrap();

        let next = event(6, 1_100);
        h.source.insert(&next, document(&next, next.root));
        h.contract.publish(next, 1_150);
        h.chat.fail.store(true, Ordering::SeqCst);

        let outcome = h.monitor.tick().await.unwrap();
        assert_eq!(outcome, TickOutcome::Updated { cycle: 6, announced: false });
        assert_eq!(h.monitor.reader().cycle(), Some(6));
        assert_eq!(h.monitor.tick().await.unwrap(), TickOutcome::Unchanged);
    }

    #[tokio::test]
    async fn start_block_scans_from_configured_block() {
        let mut h = harness(MonitorConfig { start_block: Some(990), ..Default::default() });
        let first = event(5, 1_000);
        h.contract.publish(first, 1_000);

        h.monitor.tick().await.unwrap();
        assert_eq!(h.contract.scans(), vec![(990, 1_000)]);
    }

    #[tokio::test]
    async fn run_stops_on_cancel() {
        let h = harness(MonitorConfig {
            poll_interval: Duration::from_millis(10),
            ..Default::default()
        });
        let reader = h.monitor.reader();
        let cancel = CancellationToken::new();
        let task = tokio::spawn(h.monitor.run(cancel.clone()));

        let mut watcher = reader.clone();
        assert!(watcher.changed().await);
        assert_eq!(reader.cycle(), Some(5));

        cancel.cancel();
        task.await.unwrap();
    }
}
