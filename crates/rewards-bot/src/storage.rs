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

//! Retrieval of rewards documents from a local directory or an S3 bucket.

use std::{
    error::Error as StdError,
    path::{Path, PathBuf},
};

use async_trait::async_trait;
use aws_config::{defaults, BehaviorVersion};
use aws_sdk_s3::{config::Region, Client as S3Client};

use crate::{
    errors::CodedError,
    impl_coded_debug,
    model::{RewardsTree, RootUpdateEvent},
};

/// Document read by the local source when no per-hash file exists.
pub const LOCAL_FALLBACK_FILE: &str = "rewards.json";

#[derive(thiserror::Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("document {0} not found")]
    NotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("S3 error: {0}")]
    S3(#[source] Box<dyn StdError + Send + Sync + 'static>),

    #[error("document {name} is not a valid rewards tree: {source}")]
    Malformed { name: String, source: serde_json::Error },
}

impl_coded_debug!(StorageError);

impl CodedError for StorageError {
    fn code(&self) -> &str {
        match self {
            StorageError::NotFound(_) => "[R-STO-5001]",
            StorageError::Io(_) => "[R-STO-5002]",
            StorageError::S3(_) => "[R-STO-5003]",
            StorageError::Malformed { .. } => "[R-STO-5004]",
        }
    }
}

impl StorageError {
    pub fn s3(err: impl Into<Box<dyn StdError + Send + Sync + 'static>>) -> Self {
        Self::S3(err.into())
    }
}

/// Raw document retrieval by file name.
#[async_trait]
pub trait TreeSource: Send + Sync {
    async fn fetch(&self, name: &str) -> Result<Vec<u8>, StorageError>;

    /// Fetches and parses the rewards document published for `event`.
    async fn fetch_tree(
        &self,
        event: &RootUpdateEvent,
        chain_id: u64,
    ) -> Result<RewardsTree, StorageError> {
        let name = event.file_name(chain_id);
        let data = self.fetch(&name).await?;
        tracing::debug!("Fetched {name} ({} bytes) for cycle {}", data.len(), event.cycle);
        RewardsTree::from_slice(&data).map_err(|source| StorageError::Malformed { name, source })
    }
}

/// Reads documents from a directory.
///
/// Test deployments keep a single `rewards.json`, which is served for any name that has no file of
/// its own.
#[derive(Clone, Debug)]
pub struct FileTreeSource {
    dir: PathBuf,
}

impl FileTreeSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    async fn read(path: &Path) -> Result<Option<Vec<u8>>, StorageError> {
        match tokio::fs::read(path).await {
            Ok(data) => Ok(Some(data)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }
}

#[async_trait]
impl TreeSource for FileTreeSource {
    async fn fetch(&self, name: &str) -> Result<Vec<u8>, StorageError> {
        let path = self.dir.join(name);
        if let Some(data) = Self::read(&path).await? {
            return Ok(data);
        }

        let fallback = self.dir.join(LOCAL_FALLBACK_FILE);
        tracing::debug!("{} not found, reading {}", path.display(), fallback.display());
        Self::read(&fallback).await?.ok_or_else(|| StorageError::NotFound(name.to_string()))
    }
}

/// Reads `<prefix><name>` from an S3 bucket using the default AWS credential chain.
#[derive(Clone, Debug)]
pub struct S3TreeSource {
    client: S3Client,
    bucket: String,
    prefix: String,
}

impl S3TreeSource {
    pub async fn new(bucket: String, prefix: String, region: Option<String>) -> Self {
        let mut config_loader = defaults(BehaviorVersion::latest());
        if let Some(region) = region {
            config_loader = config_loader.region(Region::new(region));
        }
        let sdk_config = config_loader.load().await;

        let mut s3_config_builder = aws_sdk_s3::config::Builder::from(&sdk_config);
        if let Ok(url) = std::env::var("S3_URL") {
            s3_config_builder = s3_config_builder.endpoint_url(url).force_path_style(true);
        }

        Self { client: S3Client::from_conf(s3_config_builder.build()), bucket, prefix }
    }

    pub fn key(&self, name: &str) -> String {
        format!("{}{name}", self.prefix)
    }
}

#[async_trait]
impl TreeSource for S3TreeSource {
    async fn fetch(&self, name: &str) -> Result<Vec<u8>, StorageError> {
        let key = self.key(name);
        tracing::debug!(bucket = %self.bucket, %key, "downloading rewards document");

        let resp =
            self.client.get_object().bucket(&self.bucket).key(&key).send().await.map_err(
                |sdk_err| {
                    if sdk_err.as_service_error().is_some_and(|err| err.is_no_such_key()) {
                        return StorageError::NotFound(key.clone());
                    }
                    tracing::debug!(error = %sdk_err, "S3 GetObject failed");
                    StorageError::s3(sdk_err)
                },
            )?;

        let body = resp.body.collect().await.map_err(StorageError::s3)?;
        Ok(body.into_bytes().to_vec())
    }
}
