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

//! Ties an off-chain rewards document to the on-chain root update that referenced it.

use alloy::{
    primitives::{keccak256, Address, B256},
    sol_types::SolValue,
};
use thiserror::Error;

use crate::{
    errors::CodedError,
    impl_coded_debug,
    model::{Claim, RewardsTree, RootUpdateEvent},
};

/// Maximum distance, in blocks, between the document's end block and the publishing block
/// (about one day of mainnet blocks).
pub const FRESHNESS_WINDOW_BLOCKS: u64 = 6500;

#[derive(Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("document root {found} does not match on-chain root {expected}")]
    RootMismatch { expected: B256, found: B256 },

    #[error("end block {end_block} is outside the freshness window of block {block_number}")]
    StaleData { end_block: u64, block_number: u64 },

    #[error("document end block {end_block} is ahead of publish block {block_number}")]
    FutureData { end_block: u64, block_number: u64 },

    #[error("claim proof for {account} does not resolve to root {root}")]
    ProofInvalid { account: Address, root: B256 },

    #[error("claim listed under {account} is for {user}")]
    ClaimAccountMismatch { account: Address, user: Address },
}

impl_coded_debug!(ValidationError);

impl CodedError for ValidationError {
    fn code(&self) -> &str {
        match self {
            ValidationError::RootMismatch { .. } => "[R-REC-1001]",
            ValidationError::StaleData { .. } => "[R-REC-1002]",
            ValidationError::FutureData { .. } => "[R-REC-1003]",
            ValidationError::ProofInvalid { .. } => "[R-REC-1004]",
            ValidationError::ClaimAccountMismatch { .. } => "[R-REC-1005]",
        }
    }
}

/// Checks that `tree` is the document committed to by `event`.
///
/// With `bypass` set (test mode) every document is accepted.
pub fn validate(
    tree: &RewardsTree,
    event: &RootUpdateEvent,
    bypass: bool,
) -> Result<(), ValidationError> {
    if bypass {
        return Ok(());
    }

    if tree.merkle_root != event.root {
        return Err(ValidationError::RootMismatch { expected: event.root, found: tree.merkle_root });
    }

    if tree.end_block.abs_diff(event.block_number) >= FRESHNESS_WINDOW_BLOCKS {
        return Err(ValidationError::StaleData {
            end_block: tree.end_block,
            block_number: event.block_number,
        });
    }

    if event.block_number < tree.end_block {
        return Err(ValidationError::FutureData {
            end_block: tree.end_block,
            block_number: event.block_number,
        });
    }

    Ok(())
}

/// Verifies every published claim against `root`, returning how many were checked.
///
/// The leaf is `keccak256(abi.encode(index, user, cycle, tokens, cumulativeAmounts))`, the node the
/// tree contract checks on claim, and proofs fold with sorted-pair hashing.
pub fn verify_claims(tree: &RewardsTree, root: B256) -> Result<usize, ValidationError> {
    if tree.claims.is_empty() {
        tracing::warn!("Rewards document carries no claims, per-account proofs were not checked");
        return Ok(0);
    }

    for (account, claim) in &tree.claims {
        if claim.user != *account {
            let user = claim.user;
            return Err(ValidationError::ClaimAccountMismatch { account: *account, user });
        }
        if !verify_proof(&claim.proof, root, claim_leaf(claim)) {
            return Err(ValidationError::ProofInvalid { account: *account, root });
        }
    }

    tracing::debug!("Verified {} claim proofs against root {root}", tree.claims.len());
    Ok(tree.claims.len())
}

fn claim_encoding(claim: &Claim) -> Vec<u8> {
    (
        claim.index,
        claim.user,
        claim.cycle,
        claim.tokens.clone(),
        claim.cumulative_amounts.clone(),
    )
        .abi_encode_params()
}

pub fn claim_leaf(claim: &Claim) -> B256 {
    keccak256(claim_encoding(claim))
}

pub fn hash_pair(a: B256, b: B256) -> B256 {
    let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
    let mut buf = [0u8; 64];
    buf[..32].copy_from_slice(lo.as_slice());
    buf[32..].copy_from_slice(hi.as_slice());
    keccak256(buf)
}

pub fn verify_proof(proof: &[B256], root: B256, leaf: B256) -> bool {
    proof.iter().fold(leaf, |node, sibling| hash_pair(node, *sibling)) == root
}
