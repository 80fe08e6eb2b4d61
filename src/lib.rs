//! Pattern-Crawl: targeted pattern extraction from small websites
//!
//! This crate crawls a site from a seed address, collects matches of
//! caller-defined regular expressions across the pages it visits, and bounds
//! the crawl by link depth, number of followed links, and frame nesting.
//! Fetched pages can be kept in a disk cache so that repeated crawls of the
//! same sites are cheap.

pub mod cache;
pub mod config;
pub mod crawler;
pub mod output;
pub mod search;
pub mod state;
pub mod url;

use std::fmt;
use thiserror::Error;

/// Main error type for Pattern-Crawl operations
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Network error for {url} ({kind}): {message}")]
    Network {
        url: String,
        kind: NetworkErrorKind,
        message: String,
    },

    #[error("Scheme error for {url}: {message}")]
    Scheme { url: String, message: String },

    #[error("Maximum number of {max} {limit} iterations reached ({count})")]
    LimitExceeded { limit: Limit, count: u32, max: u32 },

    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Classification of a failed request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NetworkErrorKind {
    /// The request did not complete within the timeout
    Timeout,
    /// The connection was refused or could not be established
    Connect,
    /// The redirect chain was too long or looped
    Redirect,
    /// The TLS handshake or certificate check failed
    Tls,
    /// Anything else (body decoding, protocol errors)
    Other,
}

impl NetworkErrorKind {
    /// Classifies a reqwest error
    ///
    /// TLS failures surface from reqwest as connect errors, so the source
    /// chain is inspected for them before the coarser checks.
    pub fn from_reqwest(err: &reqwest::Error) -> Self {
        if is_tls_failure(err) {
            Self::Tls
        } else if err.is_timeout() {
            Self::Timeout
        } else if err.is_redirect() {
            Self::Redirect
        } else if err.is_connect() {
            Self::Connect
        } else {
            Self::Other
        }
    }
}

impl fmt::Display for NetworkErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Timeout => "timeout",
            Self::Connect => "connection refused",
            Self::Redirect => "too many redirects",
            Self::Tls => "tls failure",
            Self::Other => "request failed",
        };
        f.write_str(name)
    }
}

/// Finds a rustls error in the source chain of `err`
///
/// reqwest 0.11 reports handshake and certificate failures as plain connect
/// errors. The rustls error sits inside the `io::Error` the TLS stream
/// returned, and `io::Error::source` skips over it, so each `io::Error` in the
/// chain is opened with `get_ref`.
fn is_tls_failure(err: &reqwest::Error) -> bool {
    let mut source: Option<&(dyn std::error::Error + 'static)> = std::error::Error::source(err);
    while let Some(inner) = source {
        if inner.downcast_ref::<rustls::Error>().is_some() {
            return true;
        }
        if let Some(io) = inner.downcast_ref::<std::io::Error>() {
            if io
                .get_ref()
                .is_some_and(|wrapped| wrapped.downcast_ref::<rustls::Error>().is_some())
            {
                return true;
            }
        }
        source = inner.source();
    }
    false
}

/// The crawl limits that can cut a branch short
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Limit {
    Frames,
    Hrefs,
    Branch,
}

impl fmt::Display for Limit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Frames => "frame",
            Self::Hrefs => "href",
            Self::Branch => "branch",
        };
        f.write_str(name)
    }
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid search pattern: {0}")]
    InvalidPattern(String),
}

/// Page cache errors
///
/// Read errors are treated as a cache miss and write errors are only logged.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Cache IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to decode cache entry: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Result type alias for Pattern-Crawl operations
pub type Result<T> = std::result::Result<T, CrawlError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::Coordinator;
pub use output::CrawlReport;
pub use search::{MatchSet, SearchSpec};
pub use state::CrawlState;
