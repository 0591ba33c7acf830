//! Download sources over HTTP
//!
//! Handles:
//! - Automatic retries with configurable backoff
//! - Rate limiting between requests
//! - Error classification for retry decisions

use super::rate_limit::{RateLimit, Throttle};
use super::result::FetcherResult;
use super::Fetcher;
use crate::error::{Error, Result};
use crate::state::ImportState;
use crate::types::BackoffType;
use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

/// Settings for downloading a source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpFetcherConfig {
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Maximum number of retries
    pub max_retries: u32,
    /// Delay before the first retry, in milliseconds
    pub initial_backoff_ms: u64,
    /// Upper bound for the retry delay, in milliseconds
    pub max_backoff_ms: u64,
    pub backoff: BackoffType,
    pub rate_limit: Option<RateLimit>,
    /// Headers sent with every request
    pub headers: BTreeMap<String, String>,
    pub user_agent: String,
}

impl Default for HttpFetcherConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            max_retries: 3,
            initial_backoff_ms: 100,
            max_backoff_ms: 60_000,
            backoff: BackoffType::Exponential,
            rate_limit: Some(RateLimit::default()),
            headers: BTreeMap::new(),
            user_agent: format!("feed-tamper/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl HttpFetcherConfig {
    /// Set max retries
    #[must_use]
    pub fn max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    /// Set the request timeout
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout_secs = timeout.as_secs().max(1);
        self
    }

    /// Set backoff configuration
    #[must_use]
    pub fn backoff(mut self, backoff: BackoffType, initial: Duration, max: Duration) -> Self {
        self.backoff = backoff;
        self.initial_backoff_ms = duration_ms(initial);
        self.max_backoff_ms = duration_ms(max);
        self
    }

    /// Set the rate limit
    #[must_use]
    pub fn rate_limit(mut self, limit: RateLimit) -> Self {
        self.rate_limit = Some(limit);
        self
    }

    /// Disable rate limiting
    #[must_use]
    pub fn no_rate_limit(mut self) -> Self {
        self.rate_limit = None;
        self
    }

    /// Add a header sent with every request
    #[must_use]
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    fn timeout_duration(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[allow(clippy::cast_possible_truncation)]
fn duration_ms(duration: Duration) -> u64 {
    duration.as_millis() as u64
}

/// Fetcher for `http://` and `https://` sources
///
/// The body is kept in memory.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
    config: HttpFetcherConfig,
    throttle: Option<Throttle>,
}

impl HttpFetcher {
    /// Create a fetcher with default settings
    pub fn new() -> Result<Self> {
        Self::with_config(HttpFetcherConfig::default())
    }

    /// Create a fetcher with custom settings
    pub fn with_config(config: HttpFetcherConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout_duration())
            .user_agent(&config.user_agent)
            .build()?;
        let throttle = config.rate_limit.map(Throttle::new);

        Ok(Self {
            client,
            config,
            throttle,
        })
    }

    pub fn config(&self) -> &HttpFetcherConfig {
        &self.config
    }

    /// Download a URL, retrying on throttling, server errors and timeouts
    pub async fn download(&self, url: &Url) -> Result<Vec<u8>> {
        let response = self.get(url).await?;
        let bytes = response.bytes().await?;
        debug!(url = %url, bytes = bytes.len(), "Downloaded source");
        Ok(bytes.to_vec())
    }

    async fn get(&self, url: &Url) -> Result<Response> {
        let max_retries = self.config.max_retries;
        let mut last_error = None;
        let mut attempt = 0;

        while attempt <= max_retries {
            if let Some(throttle) = &self.throttle {
                throttle.wait().await;
            }

            let mut req = self.client.get(url.clone());
            for (key, value) in &self.config.headers {
                req = req.header(key.as_str(), value.as_str());
            }

            match req.send().await {
                Ok(response) => {
                    let status = response.status();

                    if status == StatusCode::TOO_MANY_REQUESTS {
                        let retry_after = retry_after_secs(&response);
                        if attempt < max_retries {
                            warn!(
                                "Rate limited (429), attempt {}/{}, waiting {}s",
                                attempt + 1,
                                max_retries + 1,
                                retry_after
                            );
                            tokio::time::sleep(Duration::from_secs(retry_after)).await;
                            attempt += 1;
                            continue;
                        }
                        return Err(Error::RateLimited {
                            retry_after_seconds: retry_after,
                        });
                    }

                    if status.is_server_error() && attempt < max_retries {
                        let delay = self.backoff_delay(attempt);
                        warn!(
                            "Download failed with {}, attempt {}/{}, retrying in {:?}",
                            status.as_u16(),
                            attempt + 1,
                            max_retries + 1,
                            delay
                        );
                        tokio::time::sleep(delay).await;
                        attempt += 1;
                        last_error = Some(Error::http_status(status.as_u16(), ""));
                        continue;
                    }

                    if status.is_client_error() || status.is_server_error() {
                        let body = response.text().await.unwrap_or_default();
                        return Err(Error::http_status(status.as_u16(), body));
                    }

                    return Ok(response);
                }
                Err(e) if (e.is_timeout() || e.is_connect()) && attempt < max_retries => {
                    let delay = self.backoff_delay(attempt);
                    warn!(
                        "Download error ({e}), attempt {}/{}, retrying in {:?}",
                        attempt + 1,
                        max_retries + 1,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                    last_error = Some(Error::Http(e));
                }
                Err(e) if e.is_timeout() => {
                    return Err(Error::Timeout {
                        timeout_ms: self.config.timeout_secs.saturating_mul(1000),
                    });
                }
                Err(e) => return Err(Error::Http(e)),
            }
        }

        Err(last_error.unwrap_or(Error::MaxRetriesExceeded { max_retries }))
    }

    /// Delay before the given retry attempt
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        let initial = Duration::from_millis(self.config.initial_backoff_ms);
        let delay = match self.config.backoff {
            BackoffType::Constant => initial,
            BackoffType::Linear => initial * (attempt + 1),
            BackoffType::Exponential => initial * 2u32.saturating_pow(attempt),
        };
        delay.min(Duration::from_millis(self.config.max_backoff_ms))
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, source: &str, state: &mut ImportState) -> Result<FetcherResult> {
        let url = Url::parse(source)?;
        let bytes = self.download(&url).await?;
        let size = bytes.len() as u64;
        state.progress(size, size);
        Ok(FetcherResult::from_bytes(bytes))
    }
}

/// Seconds to wait according to the retry-after header
fn retry_after_secs(response: &Response) -> u64 {
    response
        .headers()
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(60)
}
