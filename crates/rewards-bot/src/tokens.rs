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

//! Metadata for the tokens a rewards tree distributes.

use std::{
    collections::{BTreeSet, HashMap},
    path::Path,
};

use alloy::primitives::{address, Address};
use serde::Deserialize;
use thiserror::Error;

use crate::{errors::CodedError, impl_coded_debug};

pub const BADGER: Address = address!("3472A5A71965499acd81997a54BBA8D852C6E53d");
/// Rebasing token; amounts in the tree are shares, not balances.
pub const DIGG: Address = address!("798D1bE841a82a273720CE31c822C61a67a601C3");
pub const XSUSHI: Address = address!("8798249c2E607446EfB7Ad49eC89dD1865Ff4272");
pub const FARM: Address = address!("a0246c9032bC3A600820415aE600c6388619A14D");

#[derive(Error)]
pub enum TokenListError {
    #[error("Failed to read token list {path}: {source}")]
    Read { path: String, source: std::io::Error },

    #[error("Failed to parse token list: {0}")]
    Parse(#[from] toml::de::Error),
}

impl_coded_debug!(TokenListError);

impl CodedError for TokenListError {
    fn code(&self) -> &str {
        match self {
            TokenListError::Read { .. } => "[R-TOK-2001]",
            TokenListError::Parse(_) => "[R-TOK-2002]",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct TokenInfo {
    /// Display name.
    pub name: String,
    /// CoinGecko coin id, `None` for tokens without a spot price.
    #[serde(default)]
    pub price_id: Option<String>,
    pub decimals: u8,
}

impl TokenInfo {
    pub fn new(name: &str, price_id: Option<&str>, decimals: u8) -> Self {
        Self { name: name.to_string(), price_id: price_id.map(str::to_string), decimals }
    }
}

#[derive(Deserialize)]
struct TokenListFile {
    #[serde(default)]
    tokens: Vec<TokenListEntry>,
    #[serde(default)]
    excluded: Vec<Address>,
}

#[derive(Deserialize)]
struct TokenListEntry {
    address: Address,
    #[serde(flatten)]
    info: TokenInfo,
}

/// Lookup table from token address to its metadata, plus the tokens left out of summaries.
#[derive(Clone, Debug)]
pub struct TokenRegistry {
    tokens: HashMap<Address, TokenInfo>,
    excluded: BTreeSet<Address>,
}

impl Default for TokenRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl TokenRegistry {
    /// Empty registry with nothing excluded.
    pub fn empty() -> Self {
        Self { tokens: HashMap::new(), excluded: BTreeSet::new() }
    }

    /// Tokens distributed by the mainnet Badger tree. DIGG is excluded until rebasing shares can
    /// be converted to balances.
    pub fn builtin() -> Self {
        let tokens = HashMap::from([
            (BADGER, TokenInfo::new("BADGER", Some("badger-dao"), 18)),
            (DIGG, TokenInfo::new("DIGG", Some("digg"), 9)),
            (XSUSHI, TokenInfo::new("xSUSHI", Some("xsushi"), 18)),
            (FARM, TokenInfo::new("FARM", Some("harvest-finance"), 18)),
        ]);
        Self { tokens, excluded: BTreeSet::from([DIGG]) }
    }

    pub fn with_token(mut self, address: Address, info: TokenInfo) -> Self {
        self.tokens.insert(address, info);
        self
    }

    pub fn with_excluded(mut self, excluded: impl IntoIterator<Item = Address>) -> Self {
        self.excluded.extend(excluded);
        self
    }

    /// Merges a TOML token list into this registry; entries in the file win.
    ///
    /// ```toml
    /// excluded = ["0x798D1bE841a82a273720CE31c822C61a67a601C3"]
    ///
    /// [[tokens]]
    /// address = "0x3472A5A71965499acd81997a54BBA8D852C6E53d"
    /// name = "BADGER"
    /// price_id = "badger-dao"
    /// decimals = 18
    /// ```
    pub fn merge_toml(mut self, data: &str) -> Result<Self, TokenListError> {
        let file: TokenListFile = toml::from_str(data)?;
        for entry in file.tokens {
            self.tokens.insert(entry.address, entry.info);
        }
        self.excluded.extend(file.excluded);
        Ok(self)
    }

    pub async fn load(self, path: &Path) -> Result<Self, TokenListError> {
        let data = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| TokenListError::Read { path: path.display().to_string(), source })?;
        let registry = self.merge_toml(&data)?;
        tracing::debug!(
            "Loaded token list from {}: {} tokens, {} excluded",
            path.display(),
            registry.tokens.len(),
            registry.excluded.len()
        );
        Ok(registry)
    }

    pub fn get(&self, token: &Address) -> Option<&TokenInfo> {
        self.tokens.get(token)
    }

    pub fn is_excluded(&self, token: &Address) -> bool {
        self.excluded.contains(token)
    }

    pub fn excluded(&self) -> &BTreeSet<Address> {
        &self.excluded
    }
}
