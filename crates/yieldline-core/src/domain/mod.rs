//! # Domain Models
//!
//! Typed inputs and provider records used by the reconciliation engine.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Ticker`] | Validated exchange ticker |
//! | [`FiscalYearEnd`] | `MM-DD` fiscal-year cutoff |
//! | [`DividendEvent`] | One dividend payment with optional [`Period`] label |
//! | [`AnnualFigures`] | Net income and EPS for one fiscal year |

mod calendar;
mod dividend;
mod reports;
mod ticker;

pub use calendar::{
    format_date, parse_date, validate_currency_code, validate_year, FiscalYearEnd, MAX_YEAR,
    MIN_YEAR,
};
pub use dividend::{events_from_payload, DividendEvent, Period};
pub use reports::AnnualFigures;
pub use ticker::Ticker;
