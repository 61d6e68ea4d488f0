use thiserror::Error;

use crate::domain::FiscalYearEnd;
use crate::fetch::FetchError;

/// Validation and contract errors exposed by `yieldline-core`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("ticker cannot be empty")]
    EmptyTicker,
    #[error("ticker length {len} exceeds max {max}")]
    TickerTooLong { len: usize, max: usize },
    #[error("ticker contains invalid character '{ch}' at index {index}")]
    TickerInvalidChar { ch: char, index: usize },

    #[error("invalid provider '{value}', expected one of eodhd, alphavantage")]
    InvalidProvider { value: String },

    #[error("fiscal year end must be MM-DD: '{value}'")]
    InvalidFiscalYearEnd { value: String },

    #[error("year {value} is outside the supported range {min}..={max}")]
    YearOutOfRange { value: i32, min: i32, max: i32 },

    #[error("date must be YYYY-MM-DD: '{value}'")]
    InvalidDate { value: String },

    #[error("currency must be a 3-letter uppercase ISO code: '{value}'")]
    InvalidCurrency { value: String },

    #[error("invalid cache backend '{value}', expected one of memory, file, document")]
    InvalidCacheBackend { value: String },

    #[error("property '{name}' is required but not set")]
    MissingProperty { name: String },
}

/// Failure of a public entry point.
///
/// `Display` is the user-facing text; business gaps render as `Error: ...`,
/// fetch faults render their own message.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MetricError {
    #[error("Error: No data")]
    NoData,

    #[error("Error: invalid div")]
    InvalidDividend,

    #[error("Error: Missing reports")]
    MissingReports,

    #[error("Error: Division by zero")]
    DivisionByZero,

    #[error("Error: fiscal year end {fiscal_year_end} does not exist in {year}")]
    InvalidFiscalYearEnd {
        fiscal_year_end: FiscalYearEnd,
        year: i32,
    },

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Fetch(#[from] FetchError),
}

impl MetricError {
    pub const fn code(&self) -> &'static str {
        match self {
            Self::NoData => "metric.no_data",
            Self::InvalidDividend => "metric.invalid_div",
            Self::MissingReports => "metric.missing_reports",
            Self::DivisionByZero => "metric.division_by_zero",
            Self::InvalidFiscalYearEnd { .. } => "metric.invalid_fiscal_year_end",
            Self::Validation(_) => "validation",
            Self::Fetch(error) => error.code(),
        }
    }

    /// Expected gaps in the data, as opposed to faults reaching the provider.
    pub const fn is_soft(&self) -> bool {
        matches!(
            self,
            Self::NoData | Self::InvalidDividend | Self::MissingReports | Self::DivisionByZero
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Provider;

    #[test]
    fn business_errors_render_as_error_strings() {
        assert_eq!(MetricError::NoData.to_string(), "Error: No data");
        assert_eq!(MetricError::InvalidDividend.to_string(), "Error: invalid div");
        assert_eq!(MetricError::MissingReports.to_string(), "Error: Missing reports");
        assert_eq!(MetricError::DivisionByZero.to_string(), "Error: Division by zero");
    }

    #[test]
    fn fetch_faults_keep_their_message() {
        let error = MetricError::from(FetchError::Status {
            provider: Provider::Alphavantage,
            status: 500,
        });

        assert_eq!(error.to_string(), "API error: 500");
        assert_eq!(error.code(), "fetch.status");
        assert!(!error.is_soft());
    }
}
