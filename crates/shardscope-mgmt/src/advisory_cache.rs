//! Local copy of the published advisory table.
//!
//! Lookup order: the configured table file, then the download cache next to
//! it, then a fresh download which is written to the cache. Any failure
//! leaves the advisories unavailable; inspection still runs without them.

use std::path::{Path, PathBuf};

use shardscope_core::{AdvisorySource, AdvisoryTable, ScopeError};
use thiserror::Error;

use crate::config::MgmtConfig;

#[derive(Debug, Error)]
pub enum AdvisoryCacheError {
    #[error("advisory table {0} not found and no download URL configured")]
    NotFound(PathBuf),
    #[error("advisory download failed: {0}")]
    Download(#[from] reqwest::Error),
    #[error("advisory download returned HTTP {0}")]
    Status(u16),
    #[error("advisory cache I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid advisory table: {0}")]
    Parse(#[from] ScopeError),
}

/// Finds, downloads and caches the advisory table.
#[derive(Debug, Clone)]
pub struct AdvisoryCache {
    path: PathBuf,
    url: Option<String>,
    client: reqwest::Client,
}

impl AdvisoryCache {
    pub fn new(path: impl Into<PathBuf>, url: Option<String>) -> Self {
        Self {
            path: path.into(),
            url,
            client: reqwest::Client::new(),
        }
    }

    pub fn from_config(config: &MgmtConfig) -> Self {
        Self::new(config.advisory_path.clone(), config.advisory_url.clone())
    }

    /// Where downloads are written.
    pub fn cache_path(&self) -> PathBuf {
        self.path.with_extension("temp")
    }

    pub async fn load(&self) -> Result<AdvisoryTable, AdvisoryCacheError> {
        if let Some(table) = read_table(&self.path).await? {
            tracing::debug!("advisory table loaded from {}", self.path.display());
            return Ok(table);
        }
        let cache = self.cache_path();
        if let Some(table) = read_table(&cache).await? {
            tracing::debug!("advisory table loaded from cache {}", cache.display());
            return Ok(table);
        }

        let url = self
            .url
            .as_deref()
            .ok_or_else(|| AdvisoryCacheError::NotFound(self.path.clone()))?;
        tracing::info!("downloading advisory table from {}", url);
        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            return Err(AdvisoryCacheError::Status(response.status().as_u16()));
        }
        let body = response.text().await?;
        let table = AdvisoryTable::from_json(&body)?;

        tracing::info!("write advisory table to {}", cache.display());
        if let Err(e) = tokio::fs::write(&cache, &body).await {
            tracing::warn!("cannot cache advisory table at {}: {}", cache.display(), e);
        }
        Ok(table)
    }

    /// Loads the table, downgrading failures to an unavailable source.
    pub async fn source(&self) -> LoadedAdvisories {
        match self.load().await {
            Ok(table) => {
                tracing::info!("{} advisories loaded", table.len());
                LoadedAdvisories::Ready(table)
            }
            Err(e) => {
                tracing::warn!("advisory table unavailable: {}", e);
                LoadedAdvisories::Unavailable(e.to_string())
            }
        }
    }
}

async fn read_table(path: &Path) -> Result<Option<AdvisoryTable>, AdvisoryCacheError> {
    match tokio::fs::read_to_string(path).await {
        Ok(data) => Ok(Some(AdvisoryTable::from_json(&data)?)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Outcome of an [`AdvisoryCache::source`] lookup.
#[derive(Debug, Clone)]
pub enum LoadedAdvisories {
    Ready(AdvisoryTable),
    Unavailable(String),
}

impl AdvisorySource for LoadedAdvisories {
    fn advisory_table(&self) -> shardscope_core::Result<AdvisoryTable> {
        match self {
            LoadedAdvisories::Ready(table) => Ok(table.clone()),
            LoadedAdvisories::Unavailable(reason) => {
                Err(ScopeError::AdvisoryUnavailable(reason.clone()))
            }
        }
    }
}
