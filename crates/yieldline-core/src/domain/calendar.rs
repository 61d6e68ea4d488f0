use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use time::macros::format_description;
use time::{Date, Month};

use crate::ValidationError;

pub const MIN_YEAR: i32 = 1900;
pub const MAX_YEAR: i32 = 2200;

/// Fiscal-year cutoff as a month/day pair, e.g. `05-31`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FiscalYearEnd {
    month: Month,
    day: u8,
}

impl FiscalYearEnd {
    pub fn new(month: Month, day: u8) -> Result<Self, ValidationError> {
        // Feb 29 is accepted here; `cutoff` rejects it for non-leap years.
        let max_day = month.length(2000);
        if day == 0 || day > max_day {
            return Err(ValidationError::InvalidFiscalYearEnd {
                value: format!("{:02}-{:02}", u8::from(month), day),
            });
        }
        Ok(Self { month, day })
    }

    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let invalid = || ValidationError::InvalidFiscalYearEnd {
            value: input.to_owned(),
        };

        let (month, day) = input.trim().split_once('-').ok_or_else(invalid)?;
        if month.len() != 2 || day.len() != 2 {
            return Err(invalid());
        }

        let month: u8 = month.parse().map_err(|_| invalid())?;
        let day: u8 = day.parse().map_err(|_| invalid())?;
        let month = Month::try_from(month).map_err(|_| invalid())?;

        Self::new(month, day).map_err(|_| invalid())
    }

    pub const fn month(self) -> Month {
        self.month
    }

    pub const fn day(self) -> u8 {
        self.day
    }

    /// The cutoff date in `year`, or `None` when the day does not exist that year.
    pub fn cutoff(self, year: i32) -> Option<Date> {
        Date::from_calendar_date(year, self.month, self.day).ok()
    }

    /// The `(start, end]` window covering fiscal year `year`.
    pub fn window(self, year: i32) -> Option<(Date, Date)> {
        Some((self.cutoff(year)?, self.cutoff(year + 1)?))
    }
}

impl Default for FiscalYearEnd {
    fn default() -> Self {
        Self {
            month: Month::May,
            day: 31,
        }
    }
}

impl Display for FiscalYearEnd {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:02}-{:02}", u8::from(self.month), self.day)
    }
}

impl FromStr for FiscalYearEnd {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::parse(value)
    }
}

impl TryFrom<String> for FiscalYearEnd {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<FiscalYearEnd> for String {
    fn from(value: FiscalYearEnd) -> Self {
        value.to_string()
    }
}

pub fn validate_year(year: i32) -> Result<i32, ValidationError> {
    if !(MIN_YEAR..=MAX_YEAR).contains(&year) {
        return Err(ValidationError::YearOutOfRange {
            value: year,
            min: MIN_YEAR,
            max: MAX_YEAR,
        });
    }
    Ok(year)
}

/// Parses the leading `YYYY-MM-DD` of a provider date; any time suffix is ignored.
pub fn parse_date(input: &str) -> Result<Date, ValidationError> {
    let trimmed = input.trim();
    let head = trimmed.get(..10).unwrap_or(trimmed);
    Date::parse(head, format_description!("[year]-[month]-[day]")).map_err(|_| {
        ValidationError::InvalidDate {
            value: input.to_owned(),
        }
    })
}

pub fn format_date(date: Date) -> String {
    format!(
        "{:04}-{:02}-{:02}",
        date.year(),
        u8::from(date.month()),
        date.day()
    )
}

pub fn validate_currency_code(input: &str) -> Result<String, ValidationError> {
    let normalized = input.trim().to_ascii_uppercase();
    let is_valid = normalized.len() == 3 && normalized.chars().all(|ch| ch.is_ascii_alphabetic());

    if !is_valid {
        return Err(ValidationError::InvalidCurrency {
            value: input.to_owned(),
        });
    }

    Ok(normalized)
}
