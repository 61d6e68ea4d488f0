//! Behavior-driven tests for the per-share dividend metric.
//!
//! The metric combines three provider payloads and one FX rate:
//! `dividend × fx / (net income / EPS)`.

mod support;

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use serde_json::{json, Value};
use time::macros::date;
use tokio::sync::Barrier;
use yieldline_core::{
    fx_cache_key, CacheBackend, FiscalYearEnd, FxRates, HttpClient, HttpError, HttpMethod,
    HttpRequest, HttpResponse, MemoryCache, MetricError, RateSource, DEFAULT_FX_FALLBACK,
};

use support::{
    service, service_over, ticker, ScriptedHttpClient, EARNINGS, EODHD_DIV, FX, INCOME_STATEMENT,
};

fn income(net_income: &str) -> Value {
    json!({
        "symbol": "MC",
        "annualReports": [
            { "fiscalDateEnding": "2020-12-31", "netIncome": "1200000" },
            { "fiscalDateEnding": "2019-12-31", "netIncome": net_income }
        ]
    })
}

fn earnings(eps: &str) -> Value {
    json!({
        "symbol": "MC",
        "annualEarnings": [
            { "fiscalDateEnding": "2019-12-31", "reportedEPS": eps }
        ]
    })
}

fn annual_dividend() -> Value {
    json!([{ "value": 5, "date": "2020-07-01", "period": "Annual" }])
}

/// All four endpoints answering with a well-formed 2019 scenario.
fn happy_client() -> ScriptedHttpClient {
    ScriptedHttpClient::new()
        .respond_json(INCOME_STATEMENT, &income("1000000"))
        .respond_json(EARNINGS, &earnings("2"))
        .respond_json(EODHD_DIV, &annual_dividend())
        .respond_json(FX, &json!({ "base": "USD", "rates": { "EUR": 0.9 } }))
}

fn approx(left: f64, right: f64) -> bool {
    (left - right).abs() <= 1e-12 * right.abs().max(1.0)
}

/// Holds each report request until the other report request has arrived.
struct RendezvousHttpClient {
    inner: ScriptedHttpClient,
    reports: Barrier,
}

impl HttpClient for RendezvousHttpClient {
    fn execute<'a>(
        &'a self,
        request: HttpRequest,
    ) -> Pin<Box<dyn Future<Output = Result<HttpResponse, HttpError>> + Send + 'a>> {
        Box::pin(async move {
            if request.url.contains(INCOME_STATEMENT) || request.url.contains(EARNINGS) {
                self.reports.wait().await;
            }
            self.inner.execute(request).await
        })
    }
}

// =============================================================================
// Composition
// =============================================================================

#[tokio::test]
async fn when_all_sources_answer_system_composes_the_metric() {
    // Given: Net income 1,000,000, EPS 2, dividend 5 and USD→EUR 0.9
    let http = Arc::new(happy_client());
    let (service, _) = service(http.clone());

    // When: The 2019 metric is computed in EUR
    let report = service
        .metric_report(&ticker("MC.PA"), 2019, "EUR", FiscalYearEnd::default())
        .await
        .expect("metric");

    // Then: 5 × 0.9 / (1,000,000 / 2)
    assert_eq!(report.weighted_shares, 500_000.0);
    assert_eq!(report.dividend, 5.0);
    assert_eq!(report.fx.rate, 0.9);
    assert_eq!(report.fx.source, RateSource::Remote);
    assert!(approx(report.value, 0.000009), "{}", report.value);

    // And: Both AlphaVantage reports and the FX rate were requested once
    assert_eq!(http.count(INCOME_STATEMENT), 1);
    assert_eq!(http.count(EARNINGS), 1);
    assert_eq!(http.count(EODHD_DIV), 1);
    assert_eq!(http.count("/2019-12-31?base=USD&symbols=EUR"), 1);
}

#[tokio::test]
async fn when_metric_is_computed_system_requests_both_reports_concurrently() {
    // Given: A client that releases neither report until both are in flight
    let http = Arc::new(RendezvousHttpClient {
        inner: happy_client(),
        reports: Barrier::new(2),
    });
    let (service, _) = service_over(http);

    // When: The metric is computed under a deadline
    let report = tokio::time::timeout(
        Duration::from_secs(5),
        service.metric_report(&ticker("MC.PA"), 2019, "EUR", FiscalYearEnd::default()),
    )
    .await
    .expect("report requests overlap")
    .expect("metric");

    // Then: The metric is unchanged by the overlap
    assert!(approx(report.value, 0.000009), "{}", report.value);
}

#[tokio::test]
async fn when_target_is_reporting_currency_system_skips_fx_lookup() {
    // Given: A well-formed scenario
    let http = Arc::new(happy_client());
    let (service, _) = service(http.clone());

    // When: The metric is computed in USD
    let value = service
        .metric(&ticker("MC.PA"), 2019, "USD")
        .await
        .expect("metric");

    // Then: No conversion happens
    assert!(approx(value, 0.00001), "{value}");
    assert_eq!(http.count(FX), 0);
}

#[tokio::test]
async fn when_fx_lookup_fails_system_uses_fallback_rate() {
    // Given: The FX service is unreachable
    let http = Arc::new(
        ScriptedHttpClient::new()
            .respond_json(INCOME_STATEMENT, &income("1000000"))
            .respond_json(EARNINGS, &earnings("2"))
            .respond_json(EODHD_DIV, &annual_dividend())
            .fail(FX, HttpError::new("connection reset")),
    );
    let (service, cache) = service(http);

    // When: The metric is computed in EUR
    let report = service
        .metric_report(&ticker("MC.PA"), 2019, "EUR", FiscalYearEnd::default())
        .await
        .expect("metric");

    // Then: The static fallback is used and nothing is cached for the rate
    assert_eq!(report.fx.rate, DEFAULT_FX_FALLBACK);
    assert_eq!(report.fx.source, RateSource::Fallback);
    assert!(approx(report.value, 5.0 * 0.95 / 500_000.0), "{}", report.value);
    let key = fx_cache_key(date!(2019 - 12 - 31), "USD", "EUR");
    assert_eq!(cache.get(&key).await.expect("readable"), None);
}

#[tokio::test]
async fn when_fx_rate_is_resolved_system_caches_it_permanently() {
    // Given: A well-formed scenario
    let http = Arc::new(happy_client());
    let (service, cache) = service(http.clone());

    // When: The metric is computed twice
    service
        .metric(&ticker("MC.PA"), 2019, "EUR")
        .await
        .expect("first");
    let second = service
        .metric_report(&ticker("MC.PA"), 2019, "EUR", FiscalYearEnd::default())
        .await
        .expect("second");

    // Then: The rate is stored without expiry and every source is served from cache
    let entry = cache
        .entry(&fx_cache_key(date!(2019 - 12 - 31), "USD", "EUR"))
        .await
        .expect("readable")
        .expect("rate cached");
    assert_eq!(entry.data, json!(0.9));
    assert_eq!(entry.expires_at, None);

    assert_eq!(second.fx.source, RateSource::Cache);
    assert!(second.cache_hit);
    assert_eq!(http.count(FX), 1);
    assert_eq!(http.count_method(HttpMethod::Get), 4);
}

// =============================================================================
// Failures
// =============================================================================

#[tokio::test]
async fn when_fiscal_year_reports_are_absent_system_reports_missing_reports() {
    // Given: Reports that stop at 2020
    let http = Arc::new(happy_client());
    let (service, _) = service(http.clone());

    // When: The 2018 metric is requested
    let error = service
        .metric(&ticker("MC.PA"), 2018, "EUR")
        .await
        .expect_err("no 2018 reports");

    // Then: Missing reports is returned before the dividend is fetched
    assert_eq!(error.to_string(), "Error: Missing reports");
    assert_eq!(http.count(EODHD_DIV), 0);
}

#[tokio::test]
async fn when_reported_figure_is_none_literal_system_reports_missing_reports() {
    // Given: AlphaVantage marks the EPS gap with "None"
    let http = Arc::new(
        ScriptedHttpClient::new()
            .respond_json(INCOME_STATEMENT, &income("1000000"))
            .respond_json(EARNINGS, &earnings("None"))
            .respond_json(EODHD_DIV, &annual_dividend()),
    );
    let (service, _) = service(http);

    // When: The metric is computed
    let error = service
        .metric(&ticker("MC.PA"), 2019, "EUR")
        .await
        .expect_err("gap");

    // Then: The gap counts as a missing report
    assert_eq!(error, MetricError::MissingReports);
}

#[tokio::test]
async fn when_eps_is_zero_system_reports_division_by_zero() {
    // Given: A reported EPS of zero
    let http = Arc::new(
        ScriptedHttpClient::new()
            .respond_json(INCOME_STATEMENT, &income("1000000"))
            .respond_json(EARNINGS, &earnings("0"))
            .respond_json(EODHD_DIV, &annual_dividend()),
    );
    let (service, _) = service(http);

    // When: The metric is computed
    let error = service
        .metric(&ticker("MC.PA"), 2019, "EUR")
        .await
        .expect_err("zero eps");

    // Then: The division is refused
    assert_eq!(error, MetricError::DivisionByZero);
    assert_eq!(error.to_string(), "Error: Division by zero");
}

#[tokio::test]
async fn when_net_income_is_zero_system_reports_division_by_zero() {
    // Given: Zero net income, so zero weighted shares
    let http = Arc::new(
        ScriptedHttpClient::new()
            .respond_json(INCOME_STATEMENT, &income("0"))
            .respond_json(EARNINGS, &earnings("2"))
            .respond_json(EODHD_DIV, &annual_dividend())
            .respond_json(FX, &json!({ "rates": { "EUR": 0.9 } })),
    );
    let (service, _) = service(http);

    // When: The metric is computed
    let error = service
        .metric(&ticker("MC.PA"), 2019, "EUR")
        .await
        .expect_err("zero shares");

    // Then: The final division is refused
    assert_eq!(error, MetricError::DivisionByZero);
}

#[tokio::test]
async fn when_dividend_cannot_be_determined_system_propagates_its_error() {
    // Given: Reports are present but the dividend history is empty
    let http = Arc::new(
        ScriptedHttpClient::new()
            .respond_json(INCOME_STATEMENT, &income("1000000"))
            .respond_json(EARNINGS, &earnings("2"))
            .respond_json(EODHD_DIV, &json!([])),
    );
    let (service, _) = service(http.clone());

    // When: The metric is computed
    let error = service
        .metric(&ticker("MC.PA"), 2019, "EUR")
        .await
        .expect_err("no dividend");

    // Then: The dividend error is returned and no FX lookup is made
    assert_eq!(error, MetricError::NoData);
    assert_eq!(http.count(FX), 0);
}

#[tokio::test]
async fn when_target_currency_is_malformed_system_rejects_before_fetching() {
    // Given: A well-formed scenario
    let http = Arc::new(happy_client());
    let (service, _) = service(http.clone());

    // When: The metric is requested in a non-ISO currency
    let error = service
        .metric(&ticker("MC.PA"), 2019, "EURO")
        .await
        .expect_err("invalid currency");

    // Then: Validation fails and nothing is fetched
    assert!(matches!(error, MetricError::Validation(_)), "{error:?}");
    assert!(http.urls().is_empty());
}

// =============================================================================
// FX lookups in isolation
// =============================================================================

#[tokio::test]
async fn when_fx_response_lacks_target_rate_system_returns_fallback() {
    // Given: A response without the requested symbol
    let http = Arc::new(
        ScriptedHttpClient::new().respond_json(FX, &json!({ "rates": { "GBP": 0.8 } })),
    );
    let fx = FxRates::new(Arc::new(MemoryCache::new()), http);

    // When: A rate is requested with a custom fallback
    let quote = fx.quote(date!(2019 - 12 - 31), "USD", "EUR", 0.5).await;

    // Then: The caller's fallback is returned
    assert_eq!(quote.rate, 0.5);
    assert_eq!(quote.source, RateSource::Fallback);
}

#[tokio::test]
async fn when_fx_service_returns_error_status_system_returns_fallback() {
    // Given: The FX service answers 503
    let http = Arc::new(ScriptedHttpClient::new().respond_status(FX, 503));
    let fx = FxRates::new(Arc::new(MemoryCache::new()), http);

    // When: A rate is requested
    let rate = fx
        .rate(date!(2019 - 12 - 31), "USD", "EUR", DEFAULT_FX_FALLBACK)
        .await;

    // Then: The default fallback is returned
    assert_eq!(rate, 0.95);
}

#[tokio::test]
async fn when_fx_base_url_is_overridden_system_queries_it() {
    // Given: A self-hosted FX mirror
    let http = Arc::new(
        ScriptedHttpClient::new().respond_json("fx.internal", &json!({ "rates": { "CHF": 0.97 } })),
    );
    let fx = FxRates::new(Arc::new(MemoryCache::new()), http.clone())
        .with_base_url("https://fx.internal/");

    // When: A rate is looked up directly
    let rate = fx.lookup(date!(2020 - 01 - 02), "USD", "CHF").await;

    // Then: The mirror URL is used
    assert_eq!(rate, Ok(0.97));
    assert_eq!(
        http.urls(),
        vec![String::from("https://fx.internal/2020-01-02?base=USD&symbols=CHF")]
    );
}
