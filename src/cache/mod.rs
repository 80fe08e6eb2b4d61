//! Page cache module
//!
//! This module keeps fetched pages on disk so that repeated crawls of the
//! same sites skip the network. It provides:
//! - The `Cache` trait implemented by cache backends
//! - Deterministic cache keys derived from a call signature
//! - A directory-backed implementation storing one JSON file per entry

mod disk;
mod key;

pub use disk::DiskCache;
pub use key::call_key;

use crate::CacheError;

/// Result type for cache operations
pub type CacheResult<T> = Result<T, CacheError>;

/// Builds a cache key from a function name and its arguments
pub type KeyFn = fn(&str, &[&str]) -> String;

/// Trait for cache backend implementations
///
/// Entries are opaque byte strings addressed by a key. Implementations take
/// `&self` because the crawl holds a single shared cache for its whole run.
pub trait Cache {
    /// Gets the entry stored under `key`, or `None` on a miss
    fn get(&self, key: &str) -> CacheResult<Option<Vec<u8>>>;

    /// Stores `value` under `key`, replacing any previous entry
    fn put(&self, key: &str, value: &[u8]) -> CacheResult<()>;

    /// Total size of all entries in bytes
    fn size_bytes(&self) -> CacheResult<u64>;
}
