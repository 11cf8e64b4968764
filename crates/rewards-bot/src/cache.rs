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

//! The single current report, swapped whole.

use std::sync::Arc;

use tokio::sync::watch;

use crate::{
    format::FormattedMessage,
    model::{Report, RewardsTree},
};

/// Everything produced by one successful pipeline run.
#[derive(Debug)]
pub struct CacheEntry {
    pub(crate) tree: RewardsTree,
    pub report: Report,
    pub message: FormattedMessage,
}

impl CacheEntry {
    pub fn new(tree: RewardsTree, report: Report, message: FormattedMessage) -> Self {
        Self { tree, report, message }
    }

    pub fn cycle(&self) -> u64 {
        self.report.event.cycle
    }

    pub(crate) fn tree(&self) -> &RewardsTree {
        &self.tree
    }
}

/// Owner of the current report. Only the monitor holds one.
#[derive(Debug)]
pub struct ReportCache {
    current: watch::Sender<Option<Arc<CacheEntry>>>,
}

impl Default for ReportCache {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportCache {
    pub fn new() -> Self {
        let (current, _) = watch::channel(None);
        Self { current }
    }

    /// Read-only handle for query handlers.
    pub fn reader(&self) -> ReportReader {
        ReportReader { current: self.current.subscribe() }
    }

    /// Replaces the current entry; readers see either the old or the new entry in full.
    pub fn replace(&self, entry: CacheEntry) -> Option<Arc<CacheEntry>> {
        self.current.send_replace(Some(Arc::new(entry)))
    }

    pub fn current(&self) -> Option<Arc<CacheEntry>> {
        self.current.borrow().clone()
    }

    pub fn cycle(&self) -> Option<u64> {
        self.current.borrow().as_ref().map(|entry| entry.cycle())
    }
}

/// Read-only view of the current report. The rewards document itself is not exposed.
#[derive(Clone, Debug)]
pub struct ReportReader {
    current: watch::Receiver<Option<Arc<CacheEntry>>>,
}

impl ReportReader {
    pub fn message(&self) -> Option<FormattedMessage> {
        self.current.borrow().as_ref().map(|entry| entry.message.clone())
    }

    pub fn report(&self) -> Option<Report> {
        self.current.borrow().as_ref().map(|entry| entry.report.clone())
    }

    pub fn cycle(&self) -> Option<u64> {
        self.current.borrow().as_ref().map(|entry| entry.cycle())
    }

    /// Waits until a different entry is published.
    pub async fn changed(&mut self) -> bool {
        self.current.changed().await.is_ok()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::{format::FormattedMessage, model::RootUpdateEvent};
    use alloy::primitives::B256;
    use chrono::Utc;

    fn entry(cycle: u64) -> CacheEntry {
        let event = RootUpdateEvent {
            cycle,
            root: B256::repeat_byte(cycle as u8),
            content_hash: B256::repeat_byte(0x22),
            start_block: 0,
            end_block: 0,
            timestamp: 0,
            block_number: 0,
        };
        let tree = RewardsTree {
            merkle_root: event.root,
            cycle: Some(cycle),
            start_block: None,
            end_block: 0,
            user_data: BTreeMap::new(),
            claims: BTreeMap::new(),
        };
        let report = Report { event, accounts: 0, tokens: vec![], generated_at: Utc::now() };
        let message = FormattedMessage::render(&report);
        CacheEntry::new(tree, report, message)
    }

    #[test]
    fn empty_until_first_replace() {
        let cache = ReportCache::new();
        let reader = cache.reader();
        assert!(reader.message().is_none());
        assert_eq!(cache.cycle(), None);

        assert!(cache.replace(entry(5)).is_none());
        assert_eq!(reader.cycle(), Some(5));
        assert_eq!(reader.message(), Some(FormattedMessage::render(&entry(5).report)));
    }

    #[test]
    fn replace_returns_previous_entry() {
        let cache = ReportCache::new();
        cache.replace(entry(5));
        let previous = cache.replace(entry(6)).unwrap();

        assert_eq!(previous.cycle(), 5);
        assert_eq!(cache.reader().cycle(), Some(6));
    }

    #[tokio::test]
    async fn readers_keep_old_entry_until_swap() {
        let cache = ReportCache::new();
        cache.replace(entry(5));
        let mut reader = cache.reader();
        let before = reader.message().unwrap();

        let writer = tokio::spawn(async move {
            tokio::time::sleep(std::time::Duration::from_millis(50)).await;
            cache.replace(entry(6));
            cache
        });

        assert_eq!(reader.message().unwrap(), before);
        assert!(reader.changed().await);
        assert_eq!(reader.cycle(), Some(6));
        assert_ne!(reader.message().unwrap(), before);
        writer.await.unwrap();
    }
}
