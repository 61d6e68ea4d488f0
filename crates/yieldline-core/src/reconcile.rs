//! Fiscal-year dividend reconciliation.
//!
//! Providers report dividends in three styles: one `Annual` figure, a `Final`
//! payment preceded by `Interim` ones, or unlabeled quarterly payments. The
//! rules below are tried in that order and the first match decides the total.

use serde::Serialize;
use tracing::debug;

use crate::domain::{DividendEvent, FiscalYearEnd, Period};
use crate::MetricError;

/// What to do when the quarterly rule sums to zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ZeroSumPolicy {
    /// Zero means no usable data: `Error: invalid div`.
    #[default]
    Reject,
    /// Zero is a legitimate total.
    Accept,
}

/// The rule that produced a total.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Rule {
    Annual,
    FinalInterim,
    Quarterly,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reconciliation {
    pub total: f64,
    pub rule: Rule,
    /// Number of events summed into `total`.
    pub events: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DividendReconciler {
    zero_sum: ZeroSumPolicy,
}

impl DividendReconciler {
    pub fn new(zero_sum: ZeroSumPolicy) -> Self {
        Self { zero_sum }
    }

    pub const fn zero_sum_policy(&self) -> ZeroSumPolicy {
        self.zero_sum
    }

    /// Reduces `events` to the dividend total for fiscal year `year`.
    ///
    /// Events are ordered by date before any rule runs; the input is not modified.
    pub fn reconcile(
        &self,
        events: &[DividendEvent],
        year: i32,
        fiscal_year_end: FiscalYearEnd,
    ) -> Result<Reconciliation, MetricError> {
        let mut ordered: Vec<&DividendEvent> = events.iter().collect();
        ordered.sort_by_key(|event| event.date);

        let following = year.saturating_add(1);

        if let Some(annual) = ordered
            .iter()
            .find(|event| event.is(&Period::Annual) && event.date.year() == following)
        {
            debug!(year, date = %annual.date, "annual dividend declared");
            return Ok(Reconciliation {
                total: annual.value,
                rule: Rule::Annual,
                events: 1,
            });
        }

        if let Some(final_event) = ordered
            .iter()
            .find(|event| event.is(&Period::Final) && event.date.year() == following)
        {
            return Ok(final_with_interims(&ordered, final_event));
        }

        self.quarterly(&ordered, year, fiscal_year_end)
    }

    fn quarterly(
        &self,
        ordered: &[&DividendEvent],
        year: i32,
        fiscal_year_end: FiscalYearEnd,
    ) -> Result<Reconciliation, MetricError> {
        let (start, end) =
            fiscal_year_end
                .window(year)
                .ok_or(MetricError::InvalidFiscalYearEnd {
                    fiscal_year_end,
                    year,
                })?;

        let in_window: Vec<f64> = ordered
            .iter()
            .filter(|event| event.date > start && event.date <= end)
            .filter(|event| event.is(&Period::Quarterly) || event.is_unlabeled())
            .map(|event| event.value)
            .collect();
        let total = sum(&in_window);

        if (total == 0.0 || total.is_nan()) && self.zero_sum == ZeroSumPolicy::Reject {
            debug!(year, %start, %end, "no usable quarterly dividends in window");
            return Err(MetricError::InvalidDividend);
        }

        Ok(Reconciliation {
            total,
            rule: Rule::Quarterly,
            events: in_window.len(),
        })
    }
}

/// Final payment plus the interims paid since the previous non-interim event.
fn final_with_interims(ordered: &[&DividendEvent], final_event: &DividendEvent) -> Reconciliation {
    let prev = ordered
        .iter()
        .rev()
        .find(|event| event.date < final_event.date && !event.is(&Period::Interim));

    let interims: Vec<f64> = match prev {
        Some(prev) => ordered
            .iter()
            .filter(|event| event.is(&Period::Interim) || event.is_unlabeled())
            .filter(|event| event.date > prev.date && event.date < final_event.date)
            .map(|event| event.value)
            .collect(),
        None => Vec::new(),
    };

    debug!(
        date = %final_event.date,
        anchor = ?prev.map(|event| event.date),
        interims = interims.len(),
        "final dividend with interims"
    );

    Reconciliation {
        total: sum(&interims) + final_event.value,
        rule: Rule::FinalInterim,
        events: interims.len() + 1,
    }
}

fn sum(values: &[f64]) -> f64 {
    values.iter().sum()
}
