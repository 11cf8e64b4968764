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

//! Spot USD prices for reward tokens.

use std::{collections::HashMap, str::FromStr, time::Duration};

use async_trait::async_trait;
use bigdecimal::{BigDecimal, Zero};
use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;
use url::Url;

use crate::{errors::CodedError, impl_coded_debug};

pub const COINGECKO_API_URL: &str = "https://api.coingecko.com";

#[derive(Error, Clone, PartialEq, Eq)]
pub enum PriceError {
    #[error("no USD quote for {0}")]
    PriceUnavailable(String),

    #[error("price service request failed: {0}")]
    Http(String),

    #[error("invalid price data: {0}")]
    InvalidPrice(String),
}

impl_coded_debug!(PriceError);

impl CodedError for PriceError {
    fn code(&self) -> &str {
        match self {
            PriceError::PriceUnavailable(_) => "[R-PRC-4001]",
            PriceError::Http(_) => "[R-PRC-4002]",
            PriceError::InvalidPrice(_) => "[R-PRC-4003]",
        }
    }
}

impl From<reqwest::Error> for PriceError {
    fn from(err: reqwest::Error) -> Self {
        PriceError::Http(err.to_string())
    }
}

/// Source of spot prices keyed by a provider specific coin id.
#[async_trait]
pub trait PriceLookup: Send + Sync {
    async fn spot_price(&self, price_id: &str) -> Result<BigDecimal, PriceError>;
}

#[derive(Deserialize)]
struct CoinGeckoQuote {
    usd: serde_json::Number,
}

type CoinGeckoPriceResponse = HashMap<String, CoinGeckoQuote>;

/// CoinGecko `simple/price` lookup.
#[derive(Clone, Debug)]
pub struct CoinGeckoLookup {
    client: Client,
    api_url: Url,
}

impl CoinGeckoLookup {
    pub fn new(timeout: Duration) -> Result<Self, PriceError> {
        let api_url = Url::parse(COINGECKO_API_URL)
            .map_err(|err| PriceError::InvalidPrice(err.to_string()))?;
        let client = Client::builder()
            .timeout(timeout)
            // The free API rejects requests without a user agent.
            .user_agent(concat!("rewards-bot/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { client, api_url })
    }

    pub fn with_api_url(mut self, url: Url) -> Self {
        self.api_url = url;
        self
    }
}

#[async_trait]
impl PriceLookup for CoinGeckoLookup {
    async fn spot_price(&self, price_id: &str) -> Result<BigDecimal, PriceError> {
        let mut url = self.api_url.clone();
        url.set_path("/api/v3/simple/price");
        url.query_pairs_mut().append_pair("ids", price_id).append_pair("vs_currencies", "usd");

        tracing::trace!(%url, "querying spot price");
        let response = self.client.get(url).send().await?.error_for_status()?;
        let data: CoinGeckoPriceResponse = response.json().await?;

        let quote =
            data.get(price_id).ok_or_else(|| PriceError::PriceUnavailable(price_id.to_string()))?;
        let price = BigDecimal::from_str(&quote.usd.to_string())
            .map_err(|err| PriceError::InvalidPrice(format!("{price_id}: {err}")))?;
        if price <= BigDecimal::zero() {
            return Err(PriceError::InvalidPrice(format!("{price_id}: non-positive price {price}")));
        }

        Ok(price)
    }
}

/// Prices from a fixed table, keyed by price id.
#[derive(Clone, Debug, Default)]
pub struct StaticPriceLookup {
    prices: HashMap<String, BigDecimal>,
}

impl StaticPriceLookup {
    pub fn new(prices: impl IntoIterator<Item = (String, BigDecimal)>) -> Self {
        Self { prices: prices.into_iter().collect() }
    }
}

#[async_trait]
impl PriceLookup for StaticPriceLookup {
    async fn spot_price(&self, price_id: &str) -> Result<BigDecimal, PriceError> {
        self.prices
            .get(price_id)
            .cloned()
            .ok_or_else(|| PriceError::PriceUnavailable(price_id.to_string()))
    }
}
