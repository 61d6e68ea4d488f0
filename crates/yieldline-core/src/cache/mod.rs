//! TTL key-value caching for provider payloads.
//!
//! Three interchangeable backends implement [`CacheBackend`]; the one in use is
//! picked explicitly through [`CacheConfig`]:
//!
//! | Backend | Storage |
//! |---------|---------|
//! | [`MemoryCache`] | process-local map |
//! | [`FileCache`] | one JSON document per key in a directory |
//! | [`DocumentCache`] | hosted JSON document store over REST |
//!
//! Expiry is lazy: an entry read after its `expiresAt` is deleted and reported
//! as absent. Entries without `expiresAt` never expire.

mod document;
mod file;
mod memory;

use std::fmt::{Display, Formatter};
use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use time::OffsetDateTime;

use crate::credentials::PropertySource;
use crate::http_client::HttpClient;
use crate::ValidationError;

pub use document::DocumentCache;
pub use file::FileCache;
pub use memory::MemoryCache;

/// Default lifetime of a provider payload: six hours.
pub const DEFAULT_TTL: Duration = Duration::from_secs(21_600);

pub const CACHE_BACKEND_PROPERTY: &str = "YIELDLINE_CACHE_BACKEND";
pub const CACHE_DIR_PROPERTY: &str = "YIELDLINE_CACHE_DIR";
pub const DOCUMENT_URL_PROPERTY: &str = "FIREBASE_URL";
pub const DOCUMENT_AUTH_PROPERTY: &str = "FIREBASE_AUTH";

/// How a fetch interacts with the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CacheMode {
    /// Read a live entry if present; otherwise fetch and write the response. (Default)
    #[default]
    Use,
    /// Skip the read but write the fresh response.
    Refresh,
    /// Neither read from nor write to the cache.
    Bypass,
}

impl CacheMode {
    pub const fn reads(self) -> bool {
        matches!(self, Self::Use)
    }

    pub const fn writes(self) -> bool {
        !matches!(self, Self::Bypass)
    }
}

/// Stored document. Timestamps are epoch milliseconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheEntry {
    pub key: String,
    pub data: Value,
    pub created_at: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<i64>,
}

impl CacheEntry {
    pub fn new(key: impl Into<String>, data: Value, ttl: Option<Duration>) -> Self {
        let created_at = now_millis();
        let expires_at = ttl.map(|ttl| {
            let ttl_ms = i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX);
            created_at.saturating_add(ttl_ms)
        });
        Self {
            key: key.into(),
            data,
            created_at,
            expires_at,
        }
    }

    pub fn is_expired_at(&self, now_ms: i64) -> bool {
        self.expires_at.is_some_and(|expires_at| now_ms > expires_at)
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(now_millis())
    }
}

pub fn now_millis() -> i64 {
    let nanos = OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000;
    i64::try_from(nanos).unwrap_or(i64::MAX)
}

/// Cache backend failure. The fetch pipeline logs these and treats them as a miss.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("cache serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("cache transport error: {0}")]
    Transport(String),

    #[error("cache store returned status {status}")]
    Status { status: u16 },
}

pub type CacheFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, CacheError>> + Send + 'a>>;

/// Key-value store with per-entry TTL.
pub trait CacheBackend: Send + Sync {
    fn name(&self) -> &'static str;

    /// Returns the live entry for `key`; an expired entry is deleted and `None` returned.
    fn entry<'a>(&'a self, key: &'a str) -> CacheFuture<'a, Option<CacheEntry>>;

    /// Replaces the entry for `key`. `None` TTL stores a permanent entry.
    fn put<'a>(&'a self, key: &'a str, value: Value, ttl: Option<Duration>)
        -> CacheFuture<'a, ()>;

    fn delete<'a>(&'a self, key: &'a str) -> CacheFuture<'a, ()>;

    fn get<'a>(&'a self, key: &'a str) -> CacheFuture<'a, Option<Value>> {
        Box::pin(async move { Ok(self.entry(key).await?.map(|entry| entry.data)) })
    }
}

/// Which backend to construct.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CacheBackendKind {
    #[default]
    Memory,
    File,
    Document,
}

impl CacheBackendKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Memory => "memory",
            Self::File => "file",
            Self::Document => "document",
        }
    }
}

impl Display for CacheBackendKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CacheBackendKind {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(Self::Memory),
            "file" => Ok(Self::File),
            "document" => Ok(Self::Document),
            other => Err(ValidationError::InvalidCacheBackend {
                value: other.to_owned(),
            }),
        }
    }
}

/// Explicit backend selection made once at startup.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CacheConfig {
    #[default]
    Memory,
    File { dir: PathBuf },
    Document { base_url: String, auth: String },
}

impl CacheConfig {
    pub fn default_dir() -> PathBuf {
        PathBuf::from(".yieldline").join("cache")
    }

    /// Resolves the backend for `kind`, pulling locations and secrets from `properties`.
    pub fn from_properties(
        kind: CacheBackendKind,
        dir_override: Option<PathBuf>,
        properties: &dyn PropertySource,
    ) -> Result<Self, ValidationError> {
        match kind {
            CacheBackendKind::Memory => Ok(Self::Memory),
            CacheBackendKind::File => {
                let dir = dir_override
                    .or_else(|| properties.get_property(CACHE_DIR_PROPERTY).map(PathBuf::from))
                    .unwrap_or_else(Self::default_dir);
                Ok(Self::File { dir })
            }
            CacheBackendKind::Document => {
                let required = |name: &str| {
                    properties
                        .get_property(name)
                        .filter(|value| !value.trim().is_empty())
                        .ok_or_else(|| ValidationError::MissingProperty {
                            name: name.to_owned(),
                        })
                };
                Ok(Self::Document {
                    base_url: required(DOCUMENT_URL_PROPERTY)?,
                    auth: required(DOCUMENT_AUTH_PROPERTY)?,
                })
            }
        }
    }

    pub const fn kind(&self) -> CacheBackendKind {
        match self {
            Self::Memory => CacheBackendKind::Memory,
            Self::File { .. } => CacheBackendKind::File,
            Self::Document { .. } => CacheBackendKind::Document,
        }
    }

    pub fn build(&self, http_client: Arc<dyn HttpClient>) -> Arc<dyn CacheBackend> {
        match self {
            Self::Memory => Arc::new(MemoryCache::new()),
            Self::File { dir } => Arc::new(FileCache::new(dir.clone())),
            Self::Document { base_url, auth } => {
                Arc::new(DocumentCache::new(base_url.clone(), auth.clone(), http_client))
            }
        }
    }
}
