//! Common types used across the platform

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// GPS coordinates
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GpsCoordinates {
    pub latitude: Decimal,
    pub longitude: Decimal,
}

impl GpsCoordinates {
    pub fn new(latitude: Decimal, longitude: Decimal) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

/// Supported crops
///
/// Closed enumeration: an unknown crop string is rejected at request
/// validation, before any aggregation work starts.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Crop {
    Maiz,
    Soja,
    Trigo,
    Girasol,
}

impl Crop {
    pub fn as_str(&self) -> &'static str {
        match self {
            Crop::Maiz => "maiz",
            Crop::Soja => "soja",
            Crop::Trigo => "trigo",
            Crop::Girasol => "girasol",
        }
    }

    /// Valid sowing period for this crop within a campaign target year.
    ///
    /// Southern-hemisphere calendar: summer crops are sown in the second
    /// half of the year, winter wheat mid-year.
    pub fn sowing_period(&self, target_year: i32) -> (NaiveDate, NaiveDate) {
        let d = |m: u32, day: u32| {
            NaiveDate::from_ymd_opt(target_year, m, day).unwrap_or(NaiveDate::MIN)
        };
        match self {
            Crop::Maiz => (d(9, 1), d(12, 15)),
            Crop::Soja => (d(10, 1), d(12, 31)),
            Crop::Trigo => (d(5, 15), d(8, 15)),
            Crop::Girasol => (d(9, 15), d(12, 31)),
        }
    }
}

impl fmt::Display for Crop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Crop {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "maiz" => Ok(Crop::Maiz),
            "soja" => Ok(Crop::Soja),
            "trigo" => Ok(Crop::Trigo),
            "girasol" => Ok(Crop::Girasol),
            other => Err(format!("unsupported crop: {}", other)),
        }
    }
}

/// Agricultural campaign in `AAAA/AAAA` format (e.g. "2025/2026")
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(try_from = "String", into = "String")]
pub struct Campaign {
    raw: String,
    first_year: i32,
    target_year: i32,
}

impl Campaign {
    /// Parse and validate a campaign string.
    ///
    /// Both halves must be four-digit years. Non-consecutive years are
    /// accepted (some clients label carry-over campaigns that way); the
    /// caller may warn on them via [`Campaign::is_consecutive`].
    pub fn parse(raw: &str) -> Result<Self, String> {
        let cleaned = raw.trim();
        if cleaned.is_empty() {
            return Err("campaign is required and cannot be empty".to_string());
        }

        let (first, second) = cleaned
            .split_once('/')
            .ok_or_else(|| format!("campaign must have format AAAA/AAAA, got '{}'", cleaned))?;

        let parse_year = |part: &str| -> Result<i32, String> {
            if part.len() != 4 || !part.chars().all(|c| c.is_ascii_digit()) {
                return Err(format!("invalid campaign year '{}'", part));
            }
            let year: i32 = part
                .parse()
                .map_err(|_| format!("invalid campaign year '{}'", part))?;
            if !(1900..=2099).contains(&year) {
                return Err(format!("campaign year out of range '{}'", part));
            }
            Ok(year)
        };

        let first_year = parse_year(first)?;
        let target_year = parse_year(second)?;

        Ok(Self {
            raw: cleaned.to_string(),
            first_year,
            target_year,
        })
    }

    /// The year recommendations target (second year of the campaign).
    pub fn target_year(&self) -> i32 {
        self.target_year
    }

    pub fn is_consecutive(&self) -> bool {
        self.target_year == self.first_year + 1
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

impl fmt::Display for Campaign {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl TryFrom<String> for Campaign {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Campaign::parse(&value)
    }
}

impl From<Campaign> for String {
    fn from(value: Campaign) -> Self {
        value.raw
    }
}

/// Pagination parameters for history queries
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Pagination {
    pub limit: u32,
    pub offset: u32,
}

impl Pagination {
    pub const MAX_LIMIT: u32 = 500;

    /// Clamp the requested page size to the allowed maximum.
    pub fn clamped(self) -> Self {
        Self {
            limit: self.limit.min(Self::MAX_LIMIT),
            offset: self.offset,
        }
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            limit: 100,
            offset: 0,
        }
    }
}

/// A page of results plus the total match count independent of page size
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    pub total: i64,
    pub items: Vec<T>,
}
