use std::sync::Arc;

use tracing::debug;
use yieldline_core::cache::CACHE_BACKEND_PROPERTY;
use yieldline_core::{
    CacheBackend, CacheBackendKind, CacheConfig, DataFetcher, EnvProperties, FetchConfig,
    FxRates, HttpClient, PropertySource, ReqwestHttpClient, ValidationError, YieldService,
};

use crate::cli::{CacheSelector, Cli};
use crate::error::CliError;

/// Everything a command needs, wired once per invocation.
pub struct AppContext {
    pub properties: Arc<dyn PropertySource>,
    pub cache_config: CacheConfig,
    pub cache: Arc<dyn CacheBackend>,
    pub service: YieldService,
}

impl AppContext {
    pub fn from_cli(cli: &Cli) -> Result<Self, CliError> {
        Self::build(cli, Arc::new(EnvProperties), Arc::new(ReqwestHttpClient::new()))
    }

    pub fn build(
        cli: &Cli,
        properties: Arc<dyn PropertySource>,
        http_client: Arc<dyn HttpClient>,
    ) -> Result<Self, CliError> {
        let kind = resolve_backend(cli.cache, properties.as_ref())?;
        let cache_config =
            CacheConfig::from_properties(kind, cli.cache_dir.clone(), properties.as_ref())?;
        let cache = cache_config.build(Arc::clone(&http_client));
        debug!(backend = %kind, "cache backend selected");

        let fetch_config = FetchConfig {
            timeout_ms: cli.timeout_ms,
            ..FetchConfig::default()
        };
        let fetcher = DataFetcher::new(
            Arc::clone(&cache),
            Arc::clone(&http_client),
            Arc::clone(&properties),
        )
        .with_config(fetch_config);
        let fx = FxRates::new(Arc::clone(&cache), http_client).with_timeout_ms(cli.timeout_ms);
        let service = YieldService::new(fetcher, fx).with_cache_mode(cli.cache_mode());

        Ok(Self {
            properties,
            cache_config,
            cache,
            service,
        })
    }
}

/// `--cache`, then `YIELDLINE_CACHE_BACKEND`, then the file backend.
fn resolve_backend(
    selector: Option<CacheSelector>,
    properties: &dyn PropertySource,
) -> Result<CacheBackendKind, ValidationError> {
    if let Some(selector) = selector {
        return Ok(selector.into());
    }

    match properties.get_property(CACHE_BACKEND_PROPERTY) {
        Some(raw) if !raw.trim().is_empty() => raw.parse::<CacheBackendKind>(),
        _ => Ok(CacheBackendKind::File),
    }
}
