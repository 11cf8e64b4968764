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

//! Typed records flowing through the pipeline: the on-chain event, the off-chain rewards document
//! and the report built from both.

use std::collections::BTreeMap;

use alloy::primitives::{Address, B256, U256};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::amount::{deserialize_block_number, deserialize_opt_block_number, RawAmount};
use crate::summary::TokenSummary;

/// A `RootUpdated` observation from the rewards tree contract.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RootUpdateEvent {
    pub cycle: u64,
    pub root: B256,
    pub content_hash: B256,
    pub start_block: u64,
    pub end_block: u64,
    /// Unix seconds.
    pub timestamp: u64,
    /// Block at which the tree was published.
    pub block_number: u64,
}

impl RootUpdateEvent {
    /// Name of the rewards document published alongside this root on the given network.
    pub fn file_name(&self, chain_id: u64) -> String {
        rewards_file_name(chain_id, self.content_hash)
    }
}

/// `rewards-<chainId>-<0x contentHash>.json`
pub fn rewards_file_name(chain_id: u64, content_hash: B256) -> String {
    format!("rewards-{chain_id}-{content_hash:#x}.json")
}

/// Per-account record inside a distribution group.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    #[serde(default)]
    pub totals: BTreeMap<Address, RawAmount>,
}

/// A claim entry as published in the tree, used for proof verification.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Claim {
    pub index: U256,
    pub user: Address,
    pub cycle: U256,
    pub tokens: Vec<Address>,
    pub cumulative_amounts: Vec<U256>,
    #[serde(default)]
    pub proof: Vec<B256>,
}

/// The off-chain rewards document for one cycle, identified by its content hash.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RewardsTree {
    pub merkle_root: B256,
    #[serde(default, deserialize_with = "deserialize_opt_block_number")]
    pub cycle: Option<u64>,
    #[serde(default, deserialize_with = "deserialize_opt_block_number")]
    pub start_block: Option<u64>,
    #[serde(deserialize_with = "deserialize_block_number")]
    pub end_block: u64,
    /// Distribution group (sett) name to account to record.
    #[serde(default)]
    pub user_data: BTreeMap<String, BTreeMap<Address, UserRecord>>,
    #[serde(default)]
    pub claims: BTreeMap<Address, Claim>,
}

impl RewardsTree {
    pub fn from_slice(data: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(data)
    }

    /// Number of accounts across all distribution groups.
    pub fn account_entries(&self) -> usize {
        self.user_data.values().map(BTreeMap::len).sum()
    }
}

/// A summarised token, with the name it is displayed under.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TokenReport {
    pub token: Address,
    pub name: String,
    #[serde(flatten)]
    pub summary: TokenSummary,
}

/// Structured result of one pipeline run. Rendering happens once, from this value.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Report {
    pub event: RootUpdateEvent,
    pub accounts: usize,
    pub tokens: Vec<TokenReport>,
    pub generated_at: DateTime<Utc>,
}
