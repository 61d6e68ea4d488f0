//! Public entry points: fiscal-year dividend and per-share metric.

use serde::Serialize;
use time::{Date, Month};
use tracing::debug;

use crate::cache::CacheMode;
use crate::domain::{events_from_payload, validate_currency_code, AnnualFigures, FiscalYearEnd};
use crate::fetch::{DataFetcher, FetchOutcome};
use crate::fx::{FxQuote, FxRates, DEFAULT_FX_FALLBACK};
use crate::reconcile::{DividendReconciler, Reconciliation};
use crate::{MetricError, Provider, Ticker, ValidationError};

pub const DIVIDEND_ENDPOINT: &str = "div";
pub const INCOME_STATEMENT_ENDPOINT: &str = "INCOME_STATEMENT";
pub const EARNINGS_ENDPOINT: &str = "EARNINGS";

/// Currency the AlphaVantage figures are reported in.
pub const REPORTING_CURRENCY: &str = "USD";
pub const DEFAULT_TARGET_CURRENCY: &str = "EUR";

/// Dividend total plus provenance.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DividendReport {
    pub ticker: Ticker,
    pub year: i32,
    pub fiscal_year_end: FiscalYearEnd,
    #[serde(flatten)]
    pub reconciliation: Reconciliation,
    pub cache_hit: bool,
    pub attempts: usize,
}

/// Metric value plus the figures it was derived from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricReport {
    pub ticker: Ticker,
    pub year: i32,
    pub currency: String,
    pub net_income: f64,
    pub eps: f64,
    pub weighted_shares: f64,
    pub dividend: f64,
    pub fx: FxQuote,
    pub value: f64,
    pub cache_hit: bool,
}

#[derive(Clone)]
pub struct YieldService {
    fetcher: DataFetcher,
    fx: FxRates,
    reconciler: DividendReconciler,
    fx_fallback: f64,
    cache_mode: CacheMode,
}

impl YieldService {
    pub fn new(fetcher: DataFetcher, fx: FxRates) -> Self {
        Self {
            fetcher,
            fx,
            reconciler: DividendReconciler::default(),
            fx_fallback: DEFAULT_FX_FALLBACK,
            cache_mode: CacheMode::Use,
        }
    }

    pub fn with_reconciler(mut self, reconciler: DividendReconciler) -> Self {
        self.reconciler = reconciler;
        self
    }

    pub fn with_fx_fallback(mut self, fx_fallback: f64) -> Self {
        self.fx_fallback = fx_fallback;
        self
    }

    pub fn with_cache_mode(mut self, cache_mode: CacheMode) -> Self {
        self.cache_mode = cache_mode;
        self
    }

    pub fn fetcher(&self) -> &DataFetcher {
        &self.fetcher
    }

    pub fn fx(&self) -> &FxRates {
        &self.fx
    }

    /// Dividend total for `ticker` in fiscal year `year`.
    pub async fn dividend(
        &self,
        ticker: &Ticker,
        year: i32,
        fiscal_year_end: FiscalYearEnd,
    ) -> Result<f64, MetricError> {
        self.dividend_report(ticker, year, fiscal_year_end)
            .await
            .map(|report| report.reconciliation.total)
    }

    pub async fn dividend_report(
        &self,
        ticker: &Ticker,
        year: i32,
        fiscal_year_end: FiscalYearEnd,
    ) -> Result<DividendReport, MetricError> {
        let outcome = self
            .fetcher
            .fetch_with_meta(ticker, Provider::Eodhd, DIVIDEND_ENDPOINT, self.cache_mode)
            .await?;

        let events = events_from_payload(&outcome.value).ok_or(MetricError::NoData)?;
        debug!(%ticker, year, events = events.len(), "dividend events parsed");

        let reconciliation = self.reconciler.reconcile(&events, year, fiscal_year_end)?;

        Ok(DividendReport {
            ticker: ticker.clone(),
            year,
            fiscal_year_end,
            reconciliation,
            cache_hit: outcome.cache_hit,
            attempts: outcome.attempts,
        })
    }

    /// `dividend × fx / (net income / EPS)` for fiscal year `year`.
    pub async fn metric(
        &self,
        ticker: &Ticker,
        year: i32,
        target_currency: &str,
    ) -> Result<f64, MetricError> {
        self.metric_report(ticker, year, target_currency, FiscalYearEnd::default())
            .await
            .map(|report| report.value)
    }

    pub async fn metric_report(
        &self,
        ticker: &Ticker,
        year: i32,
        target_currency: &str,
        fiscal_year_end: FiscalYearEnd,
    ) -> Result<MetricReport, MetricError> {
        let currency = validate_currency_code(target_currency)?;

        let (income, earnings) = tokio::join!(
            self.fetch_reports(ticker, INCOME_STATEMENT_ENDPOINT),
            self.fetch_reports(ticker, EARNINGS_ENDPOINT),
        );
        let (income, earnings) = (income?, earnings?);

        let figures = AnnualFigures::locate(&income.value, &earnings.value, year)
            .ok_or(MetricError::MissingReports)?;

        let dividend = self.dividend_report(ticker, year, fiscal_year_end).await?;

        let weighted_shares = checked_div(figures.net_income, figures.eps)?;
        let fx = self
            .fx
            .quote(
                year_end(year)?,
                REPORTING_CURRENCY,
                &currency,
                self.fx_fallback,
            )
            .await;
        let value = checked_div(dividend.reconciliation.total * fx.rate, weighted_shares)?;

        Ok(MetricReport {
            ticker: ticker.clone(),
            year,
            currency,
            net_income: figures.net_income,
            eps: figures.eps,
            weighted_shares,
            dividend: dividend.reconciliation.total,
            fx,
            value,
            cache_hit: income.cache_hit && earnings.cache_hit && dividend.cache_hit,
        })
    }

    async fn fetch_reports(
        &self,
        ticker: &Ticker,
        endpoint: &str,
    ) -> Result<FetchOutcome, MetricError> {
        self.fetcher
            .fetch_with_meta(ticker, Provider::Alphavantage, endpoint, self.cache_mode)
            .await
            .map_err(MetricError::from)
    }
}

fn checked_div(numerator: f64, denominator: f64) -> Result<f64, MetricError> {
    if denominator == 0.0 {
        return Err(MetricError::DivisionByZero);
    }

    let quotient = numerator / denominator;
    if !quotient.is_finite() {
        return Err(MetricError::DivisionByZero);
    }
    Ok(quotient)
}

fn year_end(year: i32) -> Result<Date, MetricError> {
    Date::from_calendar_date(year, Month::December, 31).map_err(|_| {
        MetricError::Validation(ValidationError::InvalidDate {
            value: format!("{year}-12-31"),
        })
    })
}
