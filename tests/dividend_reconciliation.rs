//! Behavior-driven tests for the fiscal-year dividend total.
//!
//! Each scenario scripts the EODHD dividend endpoint and checks which
//! reconciliation rule decides the total.

mod support;

use std::sync::Arc;

use serde_json::json;
use yieldline_core::{
    DividendReconciler, FiscalYearEnd, HttpError, MetricError, Rule, ZeroSumPolicy,
};

use support::{service, ticker, ScriptedHttpClient, EODHD_DIV};

// =============================================================================
// Rule selection
// =============================================================================

#[tokio::test]
async fn when_annual_dividend_is_declared_next_year_system_returns_it() {
    // Given: A single annual payment in the following calendar year
    let http = Arc::new(ScriptedHttpClient::new().respond_json(
        EODHD_DIV,
        &json!([{ "value": 5, "date": "2020-07-01", "period": "Annual" }]),
    ));
    let (service, _) = service(http);

    // When: The 2019 dividend is requested
    let report = service
        .dividend_report(&ticker("MC.PA"), 2019, FiscalYearEnd::default())
        .await
        .expect("annual dividend");

    // Then: The annual figure is the total
    assert_eq!(report.reconciliation.total, 5.0);
    assert_eq!(report.reconciliation.rule, Rule::Annual);
    assert_eq!(report.reconciliation.events, 1);
}

#[tokio::test]
async fn when_final_has_no_earlier_anchor_system_returns_final_only() {
    // Given: Two interims and a final, with nothing before them
    let http = Arc::new(ScriptedHttpClient::new().respond_json(
        EODHD_DIV,
        &json!([
            { "value": 1, "date": "2019-08-01", "period": "Interim" },
            { "value": 1.5, "date": "2019-11-01", "period": "Interim" },
            { "value": 3, "date": "2020-06-01", "period": "Final" }
        ]),
    ));
    let (service, _) = service(http);

    // When: The 2019 dividend is requested
    let report = service
        .dividend_report(&ticker("MC.PA"), 2019, FiscalYearEnd::default())
        .await
        .expect("final dividend");

    // Then: The interims are not anchored and only the final counts
    assert_eq!(report.reconciliation.total, 3.0);
    assert_eq!(report.reconciliation.rule, Rule::FinalInterim);
}

#[tokio::test]
async fn when_previous_final_anchors_interims_system_adds_them() {
    // Given: The prior year's final, two interims, then this year's final
    let http = Arc::new(ScriptedHttpClient::new().respond_json(
        EODHD_DIV,
        &json!([
            { "value": 3, "date": "2020-06-01", "period": "Final" },
            { "value": 1.5, "date": "2019-11-01", "period": "Interim" },
            { "value": 2.8, "date": "2018-06-01", "period": "Final" },
            { "value": 1, "date": "2019-08-01", "period": "Interim" }
        ]),
    ));
    let (service, _) = service(http);

    // When: The 2019 dividend is requested
    let total = service
        .dividend(&ticker("MC.PA"), 2019, FiscalYearEnd::default())
        .await
        .expect("final plus interims");

    // Then: Both interims since the 2018 final are added to the final
    assert_eq!(total, 5.5);
}

#[tokio::test]
async fn when_only_unlabeled_payments_exist_system_sums_the_fiscal_window() {
    // Given: Four quarterly payments inside (2019-05-31, 2020-05-31] plus one outside
    let http = Arc::new(ScriptedHttpClient::new().respond_json(
        EODHD_DIV,
        &json!([
            { "value": 0.5, "date": "2019-05-31" },
            { "value": 0.5, "date": "2019-08-15" },
            { "value": 0.5, "date": "2019-11-15" },
            { "value": 0.5, "date": "2020-02-15" },
            { "value": 0.5, "date": "2020-05-31" }
        ]),
    ));
    let (service, _) = service(http);

    // When: The 2019 dividend is requested
    let report = service
        .dividend_report(&ticker("KO"), 2019, FiscalYearEnd::default())
        .await
        .expect("quarterly dividend");

    // Then: The window start is exclusive and the end inclusive
    assert_eq!(report.reconciliation.total, 2.0);
    assert_eq!(report.reconciliation.rule, Rule::Quarterly);
    assert_eq!(report.reconciliation.events, 4);
}

#[tokio::test]
async fn when_values_arrive_as_strings_system_parses_them() {
    // Given: String-encoded values with a custom fiscal year end
    let http = Arc::new(ScriptedHttpClient::new().respond_json(
        EODHD_DIV,
        &json!([
            { "value": "0.25", "date": "2020-03-10", "period": "Quarterly" },
            { "value": "0.25", "date": "2020-09-10", "period": "Quarterly" },
            { "value": "0.30", "date": "2021-03-10", "period": "Quarterly" }
        ]),
    ));
    let (service, _) = service(http);
    let december = FiscalYearEnd::parse("12-31").expect("valid fiscal year end");

    // When: The 2020 dividend is requested
    let total = service
        .dividend(&ticker("KO"), 2020, december)
        .await
        .expect("quarterly dividend");

    // Then: Only the payments after 2020-12-31 and up to 2021-12-31 count
    assert!((total - 0.30).abs() < 1e-12, "{total}");
}

// =============================================================================
// Failures
// =============================================================================

#[tokio::test]
async fn when_provider_returns_no_events_system_reports_no_data() {
    // Given: An empty dividend history
    let http = Arc::new(ScriptedHttpClient::new().respond_json(EODHD_DIV, &json!([])));
    let (service, _) = service(http);

    // When: A dividend is requested
    let error = service
        .dividend(&ticker("NEW.US"), 2019, FiscalYearEnd::default())
        .await
        .expect_err("no data");

    // Then: The canonical message is produced
    assert_eq!(error, MetricError::NoData);
    assert_eq!(error.to_string(), "Error: No data");
}

#[tokio::test]
async fn when_provider_returns_an_object_system_reports_no_data() {
    // Given: A payload that is not an array
    let http = Arc::new(
        ScriptedHttpClient::new().respond_json(EODHD_DIV, &json!({ "error": "unknown ticker" })),
    );
    let (service, _) = service(http);

    // When: A dividend is requested
    let error = service
        .dividend(&ticker("NEW.US"), 2019, FiscalYearEnd::default())
        .await
        .expect_err("no data");

    // Then: It is treated like an empty history
    assert_eq!(error, MetricError::NoData);
}

#[tokio::test]
async fn when_fiscal_window_has_no_payments_system_rejects_zero_total() {
    // Given: Payments that all fall outside the 2019 window
    let payload = json!([{ "value": 0.5, "date": "2017-08-15" }]);
    let http = Arc::new(ScriptedHttpClient::new().respond_json(EODHD_DIV, &payload));
    let (service, _) = service(http);

    // When: The 2019 dividend is requested under each zero-sum policy
    let rejected = service
        .dividend(&ticker("KO"), 2019, FiscalYearEnd::default())
        .await;
    let accepted = service
        .clone()
        .with_reconciler(DividendReconciler::new(ZeroSumPolicy::Accept))
        .dividend(&ticker("KO"), 2019, FiscalYearEnd::default())
        .await;

    // Then: The default policy reports an invalid dividend; Accept returns zero
    let error = rejected.expect_err("zero sum rejected");
    assert_eq!(error.to_string(), "Error: invalid div");
    assert_eq!(accepted, Ok(0.0));
}

#[tokio::test]
async fn when_fiscal_year_end_is_feb_29_in_common_year_system_reports_it() {
    // Given: Unlabeled payments and a leap-day fiscal year end
    let http = Arc::new(ScriptedHttpClient::new().respond_json(
        EODHD_DIV,
        &json!([{ "value": 0.5, "date": "2020-01-15" }]),
    ));
    let (service, _) = service(http);
    let leap_day = FiscalYearEnd::parse("02-29").expect("accepted without a year");

    // When: The 2019 dividend is requested
    let error = service
        .dividend(&ticker("KO"), 2019, leap_day)
        .await
        .expect_err("no window");

    // Then: The fiscal year end is named in the error
    assert!(
        matches!(error, MetricError::InvalidFiscalYearEnd { year: 2019, .. }),
        "{error:?}"
    );
}

#[tokio::test]
async fn when_fetch_fails_system_propagates_the_fetch_message() {
    // Given: The only dividend key cannot connect
    let http = Arc::new(
        ScriptedHttpClient::new().fail(EODHD_DIV, HttpError::new("connection refused")),
    );
    let (service, _) = service(http);

    // When: A dividend is requested
    let error = service
        .dividend(&ticker("KO"), 2019, FiscalYearEnd::default())
        .await
        .expect_err("fetch failure");

    // Then: The message reaches the caller unchanged
    assert_eq!(error.to_string(), "connection refused");
    assert_eq!(error.code(), "fetch.transport");
}

// =============================================================================
// Caching
// =============================================================================

#[tokio::test]
async fn when_dividend_is_requested_twice_system_answers_from_cache() {
    // Given: An annual dividend history
    let http = Arc::new(ScriptedHttpClient::new().respond_json(
        EODHD_DIV,
        &json!([{ "value": 5, "date": "2020-07-01", "period": "Annual" }]),
    ));
    let (service, _) = service(http.clone());

    // When: The same dividend is requested twice
    let first = service
        .dividend_report(&ticker("MC.PA"), 2019, FiscalYearEnd::default())
        .await
        .expect("first");
    let second = service
        .dividend_report(&ticker("MC.PA"), 2019, FiscalYearEnd::default())
        .await
        .expect("second");

    // Then: The totals match and only the first call reached the provider
    assert_eq!(first.reconciliation, second.reconciliation);
    assert!(!first.cache_hit);
    assert!(second.cache_hit);
    assert_eq!(http.count(EODHD_DIV), 1);
}
