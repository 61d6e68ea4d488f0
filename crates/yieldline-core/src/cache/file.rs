use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde_json::Value;
use tracing::{debug, warn};

use super::{now_millis, CacheBackend, CacheEntry, CacheError, CacheFuture};

const EXTENSION: &str = "json";

/// Directory-backed cache, one pretty-printed JSON document per key.
#[derive(Debug, Clone)]
pub struct FileCache {
    dir: PathBuf,
}

impl FileCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Keys are percent-encoded so `eodhd/div/MC.PA` maps to a single flat file.
    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir
            .join(format!("{}.{EXTENSION}", urlencoding::encode(key)))
    }

    async fn read_entry(path: &Path) -> Result<Option<CacheEntry>, CacheError> {
        let raw = match tokio::fs::read_to_string(path).await {
            Ok(raw) => raw,
            Err(error) if error.kind() == ErrorKind::NotFound => return Ok(None),
            Err(error) => return Err(error.into()),
        };

        match serde_json::from_str::<CacheEntry>(&raw) {
            Ok(entry) => Ok(Some(entry)),
            Err(error) => {
                warn!(path = %path.display(), %error, "ignoring unreadable cache file");
                Ok(None)
            }
        }
    }

    async fn remove(path: &Path) -> Result<(), CacheError> {
        match tokio::fs::remove_file(path).await {
            Ok(()) => Ok(()),
            Err(error) if error.kind() == ErrorKind::NotFound => Ok(()),
            Err(error) => Err(error.into()),
        }
    }

    async fn cache_files(&self) -> Result<Vec<PathBuf>, CacheError> {
        let mut dir = match tokio::fs::read_dir(&self.dir).await {
            Ok(dir) => dir,
            Err(error) if error.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(error) => return Err(error.into()),
        };

        let mut paths = Vec::new();
        while let Some(item) = dir.next_entry().await? {
            let path = item.path();
            if path.extension().is_some_and(|ext| ext == EXTENSION) {
                paths.push(path);
            }
        }
        Ok(paths)
    }

    /// Deletes every expired document and returns how many were removed.
    pub async fn purge_expired(&self) -> Result<usize, CacheError> {
        let now = now_millis();
        let mut removed = 0;
        for path in self.cache_files().await? {
            if let Some(entry) = Self::read_entry(&path).await? {
                if entry.is_expired_at(now) {
                    Self::remove(&path).await?;
                    removed += 1;
                }
            }
        }
        Ok(removed)
    }

    /// Deletes every cache document and returns how many were removed.
    pub async fn clear(&self) -> Result<usize, CacheError> {
        let paths = self.cache_files().await?;
        for path in &paths {
            Self::remove(path).await?;
        }
        Ok(paths.len())
    }
}

impl CacheBackend for FileCache {
    fn name(&self) -> &'static str {
        "file"
    }

    fn entry<'a>(&'a self, key: &'a str) -> CacheFuture<'a, Option<CacheEntry>> {
        Box::pin(async move {
            let path = self.path_for(key);
            let Some(entry) = Self::read_entry(&path).await? else {
                return Ok(None);
            };

            if entry.is_expired() {
                debug!(key, "file cache entry expired");
                Self::remove(&path).await?;
                return Ok(None);
            }

            Ok(Some(entry))
        })
    }

    fn put<'a>(
        &'a self,
        key: &'a str,
        value: Value,
        ttl: Option<Duration>,
    ) -> CacheFuture<'a, ()> {
        Box::pin(async move {
            tokio::fs::create_dir_all(&self.dir).await?;

            let entry = CacheEntry::new(key, value, ttl);
            let payload = serde_json::to_string_pretty(&entry)?;

            // Write then rename so readers never observe a partial document.
            let path = self.path_for(key);
            let staging = path.with_extension(format!("{}.tmp", entry.created_at));
            tokio::fs::write(&staging, payload).await?;
            tokio::fs::rename(&staging, &path).await?;
            Ok(())
        })
    }

    fn delete<'a>(&'a self, key: &'a str) -> CacheFuture<'a, ()> {
        Box::pin(async move { Self::remove(&self.path_for(key)).await })
    }
}
