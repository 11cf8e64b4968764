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

//! Per-token statistics over a rewards document.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use alloy::primitives::Address;
use bigdecimal::{num_bigint::BigInt, BigDecimal, Zero};
use serde::Serialize;
use thiserror::Error;

use crate::{
    amount::serialize_plain,
    errors::CodedError,
    impl_coded_debug,
    model::RewardsTree,
    price::{PriceError, PriceLookup},
    tokens::TokenRegistry,
};

/// Fractional digits kept when a token mean does not terminate.
pub const MEAN_SCALE: i64 = 18;
/// Fractional digits of USD values.
pub const USD_SCALE: i64 = 2;

#[derive(Error, Clone, PartialEq, Eq)]
pub enum SummaryError {
    #[error("token {token} has no metadata, add it to the token list or exclude it")]
    UnknownToken { token: Address },
}

impl_coded_debug!(SummaryError);

impl CodedError for SummaryError {
    fn code(&self) -> &str {
        match self {
            SummaryError::UnknownToken { .. } => "[R-SUM-3001]",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct UsdValue {
    #[serde(serialize_with = "serialize_plain")]
    pub price: BigDecimal,
    #[serde(serialize_with = "serialize_plain")]
    pub sum: BigDecimal,
    #[serde(serialize_with = "serialize_plain")]
    pub mean: BigDecimal,
}

/// Aggregate over every per-account total of one token, in whole token units.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TokenSummary {
    pub count: usize,
    #[serde(serialize_with = "serialize_plain")]
    pub sum: BigDecimal,
    #[serde(serialize_with = "serialize_plain")]
    pub mean: BigDecimal,
    #[serde(serialize_with = "serialize_plain")]
    pub median: BigDecimal,
    #[serde(serialize_with = "serialize_plain")]
    pub min: BigDecimal,
    #[serde(serialize_with = "serialize_plain")]
    pub max: BigDecimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usd: Option<UsdValue>,
}

impl TokenSummary {
    /// Builds the statistics from scaled values. Returns `None` for an empty set.
    pub fn from_values(mut values: Vec<BigDecimal>) -> Option<Self> {
        if values.is_empty() {
            return None;
        }
        values.sort();

        let count = values.len();
        let sum: BigDecimal = values.iter().sum();
        let mean = (&sum / &BigDecimal::from(count as u64)).round(MEAN_SCALE);
        let mid = count / 2;
        let median = if count % 2 == 0 {
            (&values[mid - 1] + &values[mid]) / BigDecimal::from(2u32)
        } else {
            values[mid].clone()
        };

        Some(Self {
            count,
            sum,
            mean,
            median,
            min: values[0].clone(),
            max: values[count - 1].clone(),
            usd: None,
        })
    }

    fn price_with(&mut self, price: BigDecimal) {
        let sum = (&self.sum * &price).round(USD_SCALE);
        let mean = (&sum / &BigDecimal::from(self.count as u64)).round(USD_SCALE);
        self.usd = Some(UsdValue { price, sum, mean });
    }
}

/// Multiplier converting a raw amount into whole token units.
fn unit_scale(decimals: u8) -> BigDecimal {
    BigDecimal::new(BigInt::from(1), i64::from(decimals))
}

/// Collects every account total per token across all distribution groups and summarises it.
///
/// Tokens in `excluded` are skipped. Any other token must be known to `registry`.
pub fn summarize(
    tree: &RewardsTree,
    registry: &TokenRegistry,
    excluded: &BTreeSet<Address>,
) -> Result<BTreeMap<Address, TokenSummary>, SummaryError> {
    let mut collected: BTreeMap<Address, Vec<&BigDecimal>> = BTreeMap::new();
    for accounts in tree.user_data.values() {
        for record in accounts.values() {
            for (token, amount) in &record.totals {
                if excluded.contains(token) {
                    continue;
                }
                collected.entry(*token).or_default().push(amount.value());
            }
        }
    }

    let mut summaries = BTreeMap::new();
    for (token, raw) in collected {
        let info = registry.get(&token).ok_or(SummaryError::UnknownToken { token })?;
        let scale = unit_scale(info.decimals);
        let values = raw.into_iter().map(|amount| amount * &scale).collect();
        if let Some(summary) = TokenSummary::from_values(values) {
            summaries.insert(token, summary);
        }
    }

    Ok(summaries)
}

/// Adds USD values to `summaries`, querying each distinct price id once.
///
/// Tokens without a price id are left unpriced. Lookup failures are returned and the token is
/// left unpriced; the summary itself stays valid.
pub async fn apply_prices(
    summaries: &mut BTreeMap<Address, TokenSummary>,
    registry: &TokenRegistry,
    lookup: &dyn PriceLookup,
) -> Vec<(Address, PriceError)> {
    let mut quotes: HashMap<String, Result<BigDecimal, PriceError>> = HashMap::new();
    let mut failures = Vec::new();

    for (token, summary) in summaries.iter_mut() {
        let Some(price_id) = registry.get(token).and_then(|info| info.price_id.as_deref()) else {
            tracing::debug!("No price id for token {token}, skipping USD values");
            continue;
        };

        if !quotes.contains_key(price_id) {
            let quote = lookup.spot_price(price_id).await;
            quotes.insert(price_id.to_string(), quote);
        }

        match &quotes[price_id] {
            Ok(price) => summary.price_with(price.clone()),
            Err(err) => {
                tracing::warn!("No USD price for token {token} ({price_id}): {err}");
                failures.push((*token, err.clone()));
            }
        }
    }

    failures
}
