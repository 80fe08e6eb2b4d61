use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

/// Browser user agent sent with every request
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_11_6) \
AppleWebKit/537.36 (KHTML, like Gecko) Chrome/61.0.3163.100 Safari/537.36";

/// Main configuration structure for Pattern-Crawl
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub search: SearchConfig,
}

/// Crawl limits and HTTP behaviour
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CrawlerConfig {
    /// Maximum number of pages whose frames are followed
    #[serde(rename = "max-frames", default = "default_max_frames")]
    pub max_frames: u32,

    /// Maximum number of hrefs followed from the seed page
    #[serde(rename = "max-hrefs", default = "default_max_hrefs")]
    pub max_hrefs: u32,

    /// Maximum branch depth of a followed same-domain href
    #[serde(rename = "max-depth", default = "default_max_depth")]
    pub max_depth: u32,

    /// Maximum number of hrefs followed per top-level branch (unlimited when absent)
    #[serde(rename = "max-branch-count", default)]
    pub max_branch_count: Option<u32>,

    /// Request timeout in seconds
    #[serde(rename = "timeout-secs", default = "default_timeout_secs")]
    pub timeout_secs: f64,

    #[serde(rename = "user-agent", default = "default_user_agent")]
    pub user_agent: String,

    /// File extensions of pages worth following, with leading dot
    #[serde(rename = "valid-extensions", default = "default_valid_extensions")]
    pub valid_extensions: Vec<String>,

    /// Skip certificate verification on live fetches
    #[serde(rename = "accept-invalid-certs", default)]
    pub accept_invalid_certs: bool,
}

impl CrawlerConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs_f64(self.timeout_secs)
    }
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            max_frames: default_max_frames(),
            max_hrefs: default_max_hrefs(),
            max_depth: default_max_depth(),
            max_branch_count: None,
            timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
            valid_extensions: default_valid_extensions(),
            accept_invalid_certs: false,
        }
    }
}

/// Page cache configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CacheConfig {
    /// Read and store fetched pages in the cache directory
    #[serde(default)]
    pub enabled: bool,

    #[serde(default = "default_cache_directory")]
    pub directory: String,

    /// Stop writing new entries once the directory reaches this size.
    /// Zero makes the cache read-only.
    #[serde(rename = "max-size-mb", default)]
    pub max_size_mb: Option<u64>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            directory: default_cache_directory(),
            max_size_mb: None,
        }
    }
}

/// Search patterns and crawl ordering
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SearchConfig {
    /// Named regular expressions applied to every page
    #[serde(default)]
    pub patterns: BTreeMap<String, String>,

    /// Built-in patterns to enable by name (`zip`, `kvk`, `btw`)
    #[serde(default)]
    pub presets: Vec<String>,

    /// Pattern names whose first match ends the crawl
    #[serde(rename = "stop-on-found", default)]
    pub stop_on_found: Vec<String>,

    /// Regular expressions that move matching hrefs to the front of the crawl
    #[serde(default)]
    pub ranking: Vec<String>,
}

fn default_max_frames() -> u32 {
    10
}

fn default_max_hrefs() -> u32 {
    1000
}

fn default_max_depth() -> u32 {
    2
}

fn default_timeout_secs() -> f64 {
    5.0
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

fn default_valid_extensions() -> Vec<String> {
    crate::url::DEFAULT_VALID_EXTENSIONS
        .iter()
        .map(|ext| ext.to_string())
        .collect()
}

fn default_cache_directory() -> String {
    "cache".to_string()
}
