//! Directory-backed cache
//!
//! Each entry lives in `<dir>/<key>.json`. Writes go through a temporary file
//! and a rename so a crash never leaves a half-written entry behind.

use super::{Cache, CacheResult};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Cache storing one file per entry in a directory
#[derive(Debug, Clone)]
pub struct DiskCache {
    dir: PathBuf,
}

impl DiskCache {
    /// Creates a cache rooted at `dir`
    ///
    /// The directory is created lazily on the first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Returns the cache directory
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn entry_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

impl Cache for DiskCache {
    fn get(&self, key: &str) -> CacheResult<Option<Vec<u8>>> {
        match fs::read(self.entry_path(key)) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn put(&self, key: &str, value: &[u8]) -> CacheResult<()> {
        fs::create_dir_all(&self.dir)?;

        let path = self.entry_path(key);
        let tmp = self.dir.join(format!(".{}.tmp", key));
        fs::write(&tmp, value)?;
        fs::rename(&tmp, &path)?;

        tracing::trace!("Cached {} bytes at {}", value.len(), path.display());
        Ok(())
    }

    fn size_bytes(&self) -> CacheResult<u64> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(e.into()),
        };

        let mut total = 0;
        for entry in entries {
            let metadata = entry?.metadata()?;
            if metadata.is_file() {
                total += metadata.len();
            }
        }
        Ok(total)
    }
}
