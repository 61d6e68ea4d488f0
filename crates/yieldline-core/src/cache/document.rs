use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tracing::{debug, warn};

use super::{CacheBackend, CacheEntry, CacheError, CacheFuture};
use crate::http_client::{HttpClient, HttpRequest, HttpResponse};

/// Hosted JSON document store addressed over REST
/// (`{base}/cache/{key}.json?auth={secret}`), Firebase Realtime Database style.
#[derive(Clone)]
pub struct DocumentCache {
    base_url: String,
    auth: String,
    http_client: Arc<dyn HttpClient>,
}

impl DocumentCache {
    pub fn new(
        base_url: impl Into<String>,
        auth: impl Into<String>,
        http_client: Arc<dyn HttpClient>,
    ) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_owned();
        Self {
            base_url,
            auth: auth.into(),
            http_client,
        }
    }

    /// Document keys may not contain `.`, `$`, `#`, `[` or `]`; `/` nests documents.
    pub fn document_path(key: &str) -> String {
        key.chars()
            .map(|ch| match ch {
                '.' | '$' | '#' | '[' | ']' => '_',
                other => other,
            })
            .collect()
    }

    pub fn url_for(&self, key: &str) -> String {
        format!(
            "{}/cache/{}.json?auth={}",
            self.base_url,
            Self::document_path(key),
            urlencoding::encode(&self.auth)
        )
    }

    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, CacheError> {
        let response = self
            .http_client
            .execute(request)
            .await
            .map_err(|error| CacheError::Transport(error.message().to_owned()))?;

        if !response.is_success() {
            return Err(CacheError::Status {
                status: response.status,
            });
        }
        Ok(response)
    }
}

impl std::fmt::Debug for DocumentCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentCache")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl CacheBackend for DocumentCache {
    fn name(&self) -> &'static str {
        "document"
    }

    fn entry<'a>(&'a self, key: &'a str) -> CacheFuture<'a, Option<CacheEntry>> {
        Box::pin(async move {
            let response = self.send(HttpRequest::get(self.url_for(key))).await?;

            let document: Value = serde_json::from_str(&response.body)?;
            if document.is_null() {
                return Ok(None);
            }

            let entry: CacheEntry = serde_json::from_value(document)?;
            if entry.is_expired() {
                debug!(key, "document cache entry expired");
                if let Err(error) = self.delete(key).await {
                    warn!(key, %error, "failed to delete expired document");
                }
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
            let entry = CacheEntry::new(key, value, ttl);
            let body = serde_json::to_string(&entry)?;
            self.send(HttpRequest::put(self.url_for(key), body)).await?;
            Ok(())
        })
    }

    fn delete<'a>(&'a self, key: &'a str) -> CacheFuture<'a, ()> {
        Box::pin(async move {
            self.send(HttpRequest::delete(self.url_for(key))).await?;
            Ok(())
        })
    }
}
