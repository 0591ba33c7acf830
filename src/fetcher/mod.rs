//! Fetcher module
//!
//! Gets the raw source of a feed onto the local machine so it can be parsed
//! in batches.
//!
//! # Overview
//!
//! - `FetcherResult` - Fetched content in memory or on disk, BOM sanitised
//! - `Fetcher` - Async trait implemented by every fetcher
//! - `FileFetcher` - Local files
//! - `HttpFetcher` - Remote files with retries, backoff and rate limiting

mod http;
mod rate_limit;
mod result;

pub use http::{HttpFetcher, HttpFetcherConfig};
pub use rate_limit::{RateLimit, Throttle};
pub use result::{FetcherResult, SourceRead};

use crate::error::{Error, Result};
use crate::state::ImportState;
use async_trait::async_trait;
use std::path::PathBuf;
use tracing::debug;

/// Turns a source location into fetched content
#[async_trait]
pub trait Fetcher: Send + Sync + std::fmt::Debug {
    /// Fetch the source, recording progress on the fetch stage state
    async fn fetch(&self, source: &str, state: &mut ImportState) -> Result<FetcherResult>;
}

/// Fetcher for paths on the local file system
#[derive(Debug, Clone, Default)]
pub struct FileFetcher {
    /// Directory relative paths are resolved against
    base_dir: Option<PathBuf>,
}

impl FileFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve relative paths against a directory
    #[must_use]
    pub fn with_base_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.base_dir = Some(dir.into());
        self
    }

    fn resolve(&self, source: &str) -> PathBuf {
        let source = source.strip_prefix("file://").unwrap_or(source);
        let path = PathBuf::from(source);
        match &self.base_dir {
            Some(dir) if path.is_relative() => dir.join(path),
            _ => path,
        }
    }
}

#[async_trait]
impl Fetcher for FileFetcher {
    async fn fetch(&self, source: &str, state: &mut ImportState) -> Result<FetcherResult> {
        let path = self.resolve(source);
        if !tokio::fs::try_exists(&path).await.unwrap_or(false) {
            return Err(Error::FileNotFound {
                path: path.display().to_string(),
            });
        }
        debug!(path = %path.display(), "Fetched local source");
        state.set_completed();
        Ok(FetcherResult::from_path(path))
    }
}

/// Pick a fetcher for a source location
///
/// `http(s)://` URLs are downloaded with the given settings, anything else
/// is read from the local file system.
pub fn fetcher_for(source: &str, http: &HttpFetcherConfig) -> Result<Box<dyn Fetcher>> {
    if source.starts_with("http://") || source.starts_with("https://") {
        Ok(Box::new(HttpFetcher::with_config(http.clone())?))
    } else {
        Ok(Box::new(FileFetcher::new()))
    }
}
