use serde_json::Value;

use super::dividend::numeric_field;

/// Figures taken from the AlphaVantage `INCOME_STATEMENT` and `EARNINGS` payloads.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnnualFigures {
    pub net_income: f64,
    pub eps: f64,
}

impl AnnualFigures {
    /// Pairs the income and earnings reports whose fiscal date ending starts with `year`.
    ///
    /// AlphaVantage encodes figures as strings and uses `"None"` for gaps;
    /// a report with a non-numeric figure counts as missing.
    pub fn locate(income: &Value, earnings: &Value, year: i32) -> Option<Self> {
        let income_report = find_annual(income, "annualReports", year)?;
        let earnings_report = find_annual(earnings, "annualEarnings", year)?;

        Some(Self {
            net_income: numeric_field(income_report.get("netIncome")?)?,
            eps: numeric_field(earnings_report.get("reportedEPS")?)?,
        })
    }
}

fn find_annual<'a>(payload: &'a Value, collection: &str, year: i32) -> Option<&'a Value> {
    let prefix = year.to_string();
    payload
        .get(collection)?
        .as_array()?
        .iter()
        .find(|report| {
            report
                .get("fiscalDateEnding")
                .and_then(Value::as_str)
                .is_some_and(|ending| ending.starts_with(&prefix))
        })
}
