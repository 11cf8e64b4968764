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

//! Read access to the rewards tree contract.

use alloy::{
    primitives::{Address, U256},
    providers::Provider,
};
use async_trait::async_trait;
use thiserror::Error;

use crate::{
    contracts::IBadgerTreeV2::{self, IBadgerTreeV2Instance},
    errors::CodedError,
    impl_coded_debug,
    model::RootUpdateEvent,
};

#[derive(Error)]
pub enum ChainError {
    #[error("contract call failed: {0}")]
    Contract(#[from] alloy::contract::Error),

    #[error("RPC request failed: {0}")]
    Transport(#[from] alloy::transports::TransportError),

    #[error("{field} value {value} does not fit in 64 bits")]
    Overflow { field: &'static str, value: U256 },
}

impl_coded_debug!(ChainError);

impl CodedError for ChainError {
    fn code(&self) -> &str {
        match self {
            ChainError::Contract(_) => "[R-CHN-6001]",
            ChainError::Transport(_) => "[R-CHN-6002]",
            ChainError::Overflow { .. } => "[R-CHN-6003]",
        }
    }
}

fn to_u64(field: &'static str, value: U256) -> Result<u64, ChainError> {
    u64::try_from(value).map_err(|_| ChainError::Overflow { field, value })
}

/// The on-chain side of the rewards tree: the current cycle, the current root and the log of root
/// updates.
#[async_trait]
pub trait RewardsContract: Send + Sync {
    async fn chain_id(&self) -> Result<u64, ChainError>;

    async fn block_number(&self) -> Result<u64, ChainError>;

    async fn current_cycle(&self) -> Result<u64, ChainError>;

    /// The root currently published, as an event for the current cycle.
    async fn current_merkle_data(&self) -> Result<RootUpdateEvent, ChainError>;

    /// `RootUpdated` events emitted in `[from_block, to_block]`, oldest first.
    async fn root_updates(
        &self,
        from_block: u64,
        to_block: u64,
    ) -> Result<Vec<RootUpdateEvent>, ChainError>;
}

/// [`RewardsContract`] backed by an alloy provider.
#[derive(Clone)]
pub struct BadgerTree<P> {
    instance: IBadgerTreeV2Instance<P>,
}

impl<P> BadgerTree<P>
where
    P: Provider + Clone + 'static,
{
    pub fn new(address: Address, provider: P) -> Self {
        Self { instance: IBadgerTreeV2::new(address, provider) }
    }

    pub fn address(&self) -> Address {
        *self.instance.address()
    }
}

impl TryFrom<&IBadgerTreeV2::RootUpdated> for RootUpdateEvent {
    type Error = ChainError;

    fn try_from(event: &IBadgerTreeV2::RootUpdated) -> Result<Self, Self::Error> {
        Ok(RootUpdateEvent {
            cycle: to_u64("cycle", event.cycle)?,
            root: event.root,
            content_hash: event.contentHash,
            start_block: to_u64("startBlock", event.startBlock)?,
            end_block: to_u64("endBlock", event.endBlock)?,
            timestamp: to_u64("timestamp", event.timestamp)?,
            block_number: to_u64("blockNumber", event.blockNumber)?,
        })
    }
}

#[async_trait]
impl<P> RewardsContract for BadgerTree<P>
where
    P: Provider + Clone + 'static,
{
    async fn chain_id(&self) -> Result<u64, ChainError> {
        Ok(self.instance.provider().get_chain_id().await?)
    }

    async fn block_number(&self) -> Result<u64, ChainError> {
        Ok(self.instance.provider().get_block_number().await?)
    }

    async fn current_cycle(&self) -> Result<u64, ChainError> {
        let cycle = self.instance.currentCycle().call().await?;
        to_u64("cycle", cycle)
    }

    async fn current_merkle_data(&self) -> Result<RootUpdateEvent, ChainError> {
        let cycle = self.current_cycle().await?;
        let data = self.instance.getCurrentMerkleData().call().await?;

        Ok(RootUpdateEvent {
            cycle,
            root: data.root,
            content_hash: data.contentHash,
            start_block: to_u64("startBlock", data.startBlock)?,
            end_block: to_u64("endBlock", data.endBlock)?,
            timestamp: to_u64("timestamp", data.timestamp)?,
            block_number: to_u64("blockNumber", data.blockNumber)?,
        })
    }

    async fn root_updates(
        &self,
        from_block: u64,
        to_block: u64,
    ) -> Result<Vec<RootUpdateEvent>, ChainError> {
        let logs = self
            .instance
            .RootUpdated_filter()
            .from_block(from_block)
            .to_block(to_block)
            .query()
            .await?;

        let mut events = Vec::with_capacity(logs.len());
        for (event, log) in &logs {
            match RootUpdateEvent::try_from(event) {
                Ok(event) => events.push(event),
                Err(err) => tracing::error!(
                    "Skipping undecodable RootUpdated log at block {:?}: {err:?}",
                    log.block_number
                ),
            }
        }
        events.sort_by_key(|event| event.block_number);

        tracing::trace!(
            "Processed from block {from_block} to block {to_block} [found {} events]",
            events.len()
        );
        Ok(events)
    }
}
