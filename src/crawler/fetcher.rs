//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building the HTTP client with the configured user agent and timeouts
//! - Fetching pages through the disk cache
//! - Resolving the scheme of a seed address
//! - Error classification

use crate::cache::{call_key, Cache, KeyFn};
use crate::config::CrawlerConfig;
use crate::url::strip_scheme;
use crate::{CrawlError, NetworkErrorKind};
use chrono::{DateTime, Utc};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

/// Name under which page fetches are keyed in the cache
const FETCH_KEY_NAME: &str = "fetch_page";

const BYTES_PER_MB: u64 = 1024 * 1024;

/// A fetched page as stored in the cache
///
/// Non-200 responses are pages too; only network failures produce no page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    /// Final URL after redirects
    pub url: String,
    pub status: u16,
    pub content_type: Option<String>,
    pub body: String,
    pub fetched_at: DateTime<Utc>,
}

impl Page {
    pub fn is_ok(&self) -> bool {
        self.status == StatusCode::OK.as_u16()
    }
}

/// Options controlling a [`Fetcher`]
#[derive(Debug, Clone)]
pub struct FetchOptions {
    pub timeout: Duration,

    /// Bypass the cache entirely, neither reading nor writing
    pub skip_cache: bool,

    /// Stop writing new entries once the cache holds this many megabytes.
    /// `Some(0)` never writes and skips measuring the directory.
    pub max_cache_dir_size_mb: Option<u64>,

    /// Return network failures as errors instead of `Ok(None)`
    pub raise_errors: bool,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(5),
            skip_cache: false,
            max_cache_dir_size_mb: None,
            raise_errors: false,
        }
    }
}

/// Fetches pages, reading and writing them through a [`Cache`]
pub struct Fetcher<C: Cache> {
    client: Client,
    cache: C,
    key_fn: KeyFn,
    options: FetchOptions,
}

impl<C: Cache> Fetcher<C> {
    pub fn new(client: Client, cache: C, options: FetchOptions) -> Self {
        Self {
            client,
            cache,
            key_fn: call_key,
            options,
        }
    }

    /// Replaces the function that derives cache keys from a URL
    pub fn with_key_fn(mut self, key_fn: KeyFn) -> Self {
        self.key_fn = key_fn;
        self
    }

    pub fn options(&self) -> &FetchOptions {
        &self.options
    }

    pub fn cache(&self) -> &C {
        &self.cache
    }

    /// Fetches a page, serving it from the cache when possible
    ///
    /// # Returns
    ///
    /// * `Ok(Some(Page))` - A response was received (or cached), whatever its status
    /// * `Ok(None)` - The request failed at the network level
    /// * `Err(CrawlError::Scheme)` - The URL is not an absolute http(s) URL
    /// * `Err(CrawlError::Network)` - The request failed and `raise_errors` is set
    pub async fn fetch(&self, url: &str) -> Result<Option<Page>, CrawlError> {
        let parsed = Url::parse(url).map_err(|e| CrawlError::Scheme {
            url: url.to_string(),
            message: e.to_string(),
        })?;
        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            return Err(CrawlError::Scheme {
                url: url.to_string(),
                message: format!("unsupported scheme '{}'", parsed.scheme()),
            });
        }

        if self.options.skip_cache {
            tracing::debug!("Get page: {}", url);
            return self.fetch_live(parsed).await;
        }

        tracing::debug!("Get (cached) page: {}", url);
        let key = (self.key_fn)(FETCH_KEY_NAME, &[url]);
        match self.read_cached(&key) {
            Ok(Some(page)) => {
                tracing::trace!("Cache hit for {}", url);
                return Ok(Some(page));
            }
            Ok(None) => {}
            Err(e) => tracing::debug!("Treating unreadable cache entry {} as a miss: {}", key, e),
        }

        let page = self.fetch_live(parsed).await?;
        if let Some(page) = &page {
            if self.may_write_cache() {
                if let Err(e) = self.write_cached(&key, page) {
                    tracing::warn!("Failed to cache {}: {}", url, e);
                }
            }
        }
        Ok(page)
    }

    async fn fetch_live(&self, url: Url) -> Result<Option<Page>, CrawlError> {
        let url_string = url.to_string();
        let result = async {
            let response = self
                .client
                .get(url)
                .timeout(self.options.timeout)
                .send()
                .await?;
            let status = response.status().as_u16();
            let final_url = response.url().to_string();
            let content_type = response
                .headers()
                .get(reqwest::header::CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string);
            let body = response.text().await?;

            Ok::<_, reqwest::Error>(Page {
                url: final_url,
                status,
                content_type,
                body,
                fetched_at: Utc::now(),
            })
        }
        .await;

        match result {
            Ok(page) => Ok(Some(page)),
            Err(e) => {
                let kind = NetworkErrorKind::from_reqwest(&e);
                tracing::warn!("Failed to fetch {} ({}): {}", url_string, kind, e);
                if self.options.raise_errors {
                    Err(CrawlError::Network {
                        url: url_string,
                        kind,
                        message: e.to_string(),
                    })
                } else {
                    Ok(None)
                }
            }
        }
    }

    fn read_cached(&self, key: &str) -> Result<Option<Page>, CrawlError> {
        match self.cache.get(key)? {
            Some(bytes) => {
                let page = serde_json::from_slice(&bytes).map_err(crate::CacheError::Decode)?;
                Ok(Some(page))
            }
            None => Ok(None),
        }
    }

    fn write_cached(&self, key: &str, page: &Page) -> Result<(), CrawlError> {
        let bytes = serde_json::to_vec(page)?;
        self.cache.put(key, &bytes)?;
        Ok(())
    }

    /// Applies the cache size policy
    fn may_write_cache(&self) -> bool {
        match self.options.max_cache_dir_size_mb {
            None => true,
            Some(0) => false,
            Some(max_mb) => match self.cache.size_bytes() {
                Ok(bytes) if bytes / BYTES_PER_MB >= max_mb => {
                    tracing::debug!("Cache holds {} bytes, not writing new entries", bytes);
                    false
                }
                Ok(_) => true,
                Err(e) => {
                    tracing::warn!("Cannot measure cache size: {}", e);
                    false
                }
            },
        }
    }
}

/// Builds the HTTP client used for every request of a crawl
pub fn build_http_client(config: &CrawlerConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .use_rustls_tls()
        .user_agent(config.user_agent.as_str())
        .timeout(config.timeout())
        .connect_timeout(config.timeout())
        .danger_accept_invalid_certs(config.accept_invalid_certs)
        .gzip(true)
        .brotli(true)
        .build()
}

/// Outcome of resolving the scheme of a seed address
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeedResolution {
    /// The seed with the first scheme that answered 200, and a trailing `/`
    pub url: Option<Url>,

    /// Whether the resolved URL uses https; `None` if nothing resolved
    pub ssl: Option<bool>,

    /// The last attempt failed to connect or timed out
    pub connection_error: bool,

    /// Status of the last response received
    pub status_code: Option<u16>,
}

/// Finds the scheme under which a seed address answers
///
/// The seed is stripped of any scheme, then `https://` and `http://` are
/// tried in that order with a GET request. The first 200 wins.
pub async fn resolve_scheme(client: &Client, seed: &str) -> SeedResolution {
    let clean = strip_scheme(seed);
    let clean = clean.trim_end_matches('/');
    let mut resolution = SeedResolution::default();

    for scheme in ["https", "http"] {
        let candidate = format!("{}://{}/", scheme, clean);
        resolution.connection_error = false;

        let url = match Url::parse(&candidate) {
            Ok(url) => url,
            Err(e) => {
                tracing::debug!("Cannot parse {}: {}", candidate, e);
                continue;
            }
        };

        match client.get(url.clone()).send().await {
            Ok(response) => {
                let status = response.status();
                resolution.status_code = Some(status.as_u16());
                tracing::debug!("Success {} with {}", candidate, status);
                if status == StatusCode::OK {
                    resolution.ssl = Some(scheme == "https");
                    resolution.url = Some(url);
                    break;
                }
            }
            Err(e) => match NetworkErrorKind::from_reqwest(&e) {
                NetworkErrorKind::Tls => {
                    tracing::debug!("Failed request {} due to SSL", candidate);
                }
                NetworkErrorKind::Connect | NetworkErrorKind::Timeout => {
                    tracing::debug!("Failed request {} due to connection error: {}", candidate, e);
                    resolution.connection_error = true;
                }
                kind => tracing::debug!("Failed request {} ({}): {}", candidate, kind, e),
            },
        }
    }

    resolution
}
