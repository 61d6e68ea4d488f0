//! # Yieldline Core
//!
//! Fiscal-year dividend reconciliation over a cached, key-rotating provider fetch.
//!
//! ## Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`cache`] | TTL key-value cache trait with memory, file and document-store backends |
//! | [`credentials`] | Property sources and ordered API key sets |
//! | [`domain`] | Ticker, fiscal-year-end, dividend events and annual report figures |
//! | [`error`] | Validation and public-boundary error types |
//! | [`fetch`] | Cache-first fetch with credential fallback |
//! | [`fx`] | Historical FX rates with static fallback |
//! | [`http_client`] | HTTP client abstraction |
//! | [`provider`] | Provider identifiers and URL templates |
//! | [`provider_policy`] | Per-provider request budgets |
//! | [`reconcile`] | Annual / Final+Interim / Quarterly dividend rules |
//! | [`service`] | `dividend` and `metric` entry points |
//! | [`throttling`] | Rate limiting support |
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use yieldline_core::{
//!     DataFetcher, EnvProperties, FiscalYearEnd, FxRates, MemoryCache, ReqwestHttpClient,
//!     Ticker, YieldService,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let cache = Arc::new(MemoryCache::new());
//!     let http = Arc::new(ReqwestHttpClient::default());
//!     let fetcher = DataFetcher::new(cache.clone(), http.clone(), Arc::new(EnvProperties));
//!     let service = YieldService::new(fetcher, FxRates::new(cache, http));
//!
//!     let ticker = Ticker::parse("MC.PA")?;
//!     match service.dividend(&ticker, 2019, FiscalYearEnd::default()).await {
//!         Ok(total) => println!("dividend: {total}"),
//!         Err(error) => println!("{error}"),
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────┐
//! │  YieldService   │──────────────────────────┐
//! └────────┬────────┘                          │
//!          │                                   ▼
//!          ▼                           ┌──────────────────┐
//! ┌─────────────────┐                  │ DividendReconciler│
//! │  DataFetcher    │──▶ CacheBackend  └──────────────────┘
//! │  (key rotation) │──▶ ThrottlingQueue
//! └────────┬────────┘
//!          │
//!          ▼
//! ┌─────────────────┐     ┌──────────────────┐
//! │ HttpClient      │◀────│ FxRates          │
//! └─────────────────┘     └──────────────────┘
//! ```

pub mod cache;
pub mod credentials;
pub mod domain;
pub mod error;
pub mod fetch;
pub mod fx;
pub mod http_client;
pub mod provider;
pub mod provider_policy;
pub mod reconcile;
pub mod service;
pub mod throttling;

pub use cache::{
    CacheBackend, CacheBackendKind, CacheConfig, CacheEntry, CacheError, CacheMode,
    DocumentCache, FileCache, MemoryCache, DEFAULT_TTL,
};
pub use credentials::{
    mask_property, mask_secret, parse_secrets, Credential, CredentialSet, EnvProperties,
    LayeredProperties, MapProperties, PropertySource,
};
pub use domain::{
    events_from_payload, format_date, parse_date, validate_currency_code, validate_year,
    AnnualFigures, DividendEvent, FiscalYearEnd, Period, Ticker, MAX_YEAR, MIN_YEAR,
};
pub use error::{MetricError, ValidationError};
pub use fetch::{is_present, DataFetcher, FetchConfig, FetchError, FetchOutcome};
pub use fx::{fx_cache_key, FxError, FxQuote, FxRates, RateSource, DEFAULT_FX_FALLBACK};
pub use http_client::{
    HttpClient, HttpError, HttpMethod, HttpRequest, HttpResponse, ReqwestHttpClient,
};
pub use provider::Provider;
pub use provider_policy::{BackoffPolicy, ProviderPolicy};
pub use reconcile::{DividendReconciler, Reconciliation, Rule, ZeroSumPolicy};
pub use service::{
    DividendReport, MetricReport, YieldService, DEFAULT_TARGET_CURRENCY, DIVIDEND_ENDPOINT,
    EARNINGS_ENDPOINT, INCOME_STATEMENT_ENDPOINT, REPORTING_CURRENCY,
};
pub use throttling::ThrottlingQueue;
