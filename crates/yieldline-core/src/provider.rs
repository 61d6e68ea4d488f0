use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{Ticker, ValidationError};

/// Remote financial-data providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Eodhd,
    Alphavantage,
}

impl Provider {
    pub const ALL: [Self; 2] = [Self::Eodhd, Self::Alphavantage];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Eodhd => "eodhd",
            Self::Alphavantage => "alphavantage",
        }
    }

    /// Property holding this provider's key or JSON array of keys.
    pub const fn credential_property(self) -> &'static str {
        match self {
            Self::Eodhd => "EODHD_API_TOKEN",
            Self::Alphavantage => "ALPHA_VANTAGE_API_KEY",
        }
    }

    /// Request URL with `credential` embedded.
    pub fn url(self, endpoint: &str, ticker: &Ticker, credential: &str) -> String {
        let endpoint = urlencoding::encode(endpoint);
        let credential = urlencoding::encode(credential);
        match self {
            Self::Eodhd => format!(
                "https://eodhd.com/api/{endpoint}/{ticker}?api_token={credential}&fmt=json"
            ),
            Self::Alphavantage => format!(
                "https://www.alphavantage.co/query?function={endpoint}&symbol={ticker}&apikey={credential}"
            ),
        }
    }

    /// Cache key `{provider}/{endpoint}/{ticker}`.
    pub fn cache_key(self, endpoint: &str, ticker: &Ticker) -> String {
        format!("{}/{endpoint}/{ticker}", self.as_str())
    }
}

impl Display for Provider {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Provider {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "eodhd" => Ok(Self::Eodhd),
            "alphavantage" | "alpha_vantage" => Ok(Self::Alphavantage),
            other => Err(ValidationError::InvalidProvider {
                value: other.to_owned(),
            }),
        }
    }
}
