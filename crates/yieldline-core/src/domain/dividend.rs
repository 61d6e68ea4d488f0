use std::fmt::{Display, Formatter};

use serde_json::Value;
use time::Date;

use super::calendar::parse_date;

/// Reporting label attached to a dividend record by the provider.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Period {
    Annual,
    Final,
    Interim,
    Quarterly,
    /// Any other provider label, kept verbatim.
    Unknown(String),
}

impl Period {
    /// Maps a raw label; absent and empty labels yield `None`.
    pub fn from_label(label: Option<&str>) -> Option<Self> {
        let label = label?;
        if label.is_empty() {
            return None;
        }

        Some(match label {
            "Annual" => Self::Annual,
            "Final" => Self::Final,
            "Interim" => Self::Interim,
            "Quarterly" => Self::Quarterly,
            other => Self::Unknown(other.to_owned()),
        })
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Annual => "Annual",
            Self::Final => "Final",
            Self::Interim => "Interim",
            Self::Quarterly => "Quarterly",
            Self::Unknown(label) => label,
        }
    }
}

impl Display for Period {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One dividend payment as reported by the provider.
#[derive(Debug, Clone, PartialEq)]
pub struct DividendEvent {
    pub value: f64,
    pub date: Date,
    pub period: Option<Period>,
}

impl DividendEvent {
    pub fn new(value: f64, date: Date, period: Option<Period>) -> Self {
        Self {
            value,
            date,
            period,
        }
    }

    /// Builds an event from one raw provider record.
    ///
    /// Records without a usable `value` (missing, zero, non-numeric) or `date`
    /// are rejected with `None`.
    pub fn from_record(record: &Value) -> Option<Self> {
        let value = numeric_field(record.get("value")?)?;
        if value == 0.0 {
            return None;
        }

        let date = parse_date(record.get("date")?.as_str()?).ok()?;
        let period = Period::from_label(record.get("period").and_then(Value::as_str));

        Some(Self::new(value, date, period))
    }

    pub fn is(&self, period: &Period) -> bool {
        self.period.as_ref() == Some(period)
    }

    pub fn is_unlabeled(&self) -> bool {
        self.period.is_none()
    }
}

/// Parses a provider array into events sorted by date ascending.
///
/// Returns `None` when the payload is not an array or the array is empty.
/// The sort is stable, so same-day records keep their provider order.
pub fn events_from_payload(payload: &Value) -> Option<Vec<DividendEvent>> {
    let records = payload.as_array().filter(|records| !records.is_empty())?;

    let mut events: Vec<DividendEvent> = records
        .iter()
        .filter_map(DividendEvent::from_record)
        .collect();
    events.sort_by_key(|event| event.date);

    Some(events)
}

/// Numbers may arrive as JSON numbers or numeric strings.
pub(crate) fn numeric_field(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(number) => number.as_f64()?,
        Value::String(raw) => raw.trim().parse::<f64>().ok()?,
        _ => return None,
    };

    number.is_finite().then_some(number)
}
