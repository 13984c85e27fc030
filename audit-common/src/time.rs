//! Timestamp and catalog-year utilities

use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Get current UTC timestamp
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Convert milliseconds to duration
pub fn millis_to_duration(millis: u64) -> std::time::Duration {
    std::time::Duration::from_millis(millis)
}

/// Two-academic-year key selecting which rule version applies (e.g. "20242025")
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct CatalogYear {
    start: i32,
}

impl CatalogYear {
    /// Catalog year beginning in `start` (runs `start`..`start + 1`)
    pub fn starting(start: i32) -> Self {
        Self { start }
    }

    /// Forward-looking catalog year for a given instant: `{Y}{Y+1}`
    pub fn forward_looking(at: DateTime<Utc>) -> Self {
        Self::starting(at.year())
    }

    /// The catalog year immediately before this one
    pub fn previous(self) -> Self {
        Self::starting(self.start - 1)
    }

    pub fn start_year(self) -> i32 {
        self.start
    }
}

impl fmt::Display for CatalogYear {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.start, self.start + 1)
    }
}

impl From<CatalogYear> for String {
    fn from(year: CatalogYear) -> Self {
        year.to_string()
    }
}

impl TryFrom<String> for CatalogYear {
    type Error = crate::Error;

    fn try_from(value: String) -> crate::Result<Self> {
        value.parse()
    }
}

impl std::str::FromStr for CatalogYear {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        let invalid = || crate::Error::InvalidInput(format!("Invalid catalog year: {s:?}"));
        if s.len() != 8 || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        let start: i32 = s[..4].parse().map_err(|_| invalid())?;
        let end: i32 = s[4..].parse().map_err(|_| invalid())?;
        if end != start + 1 {
            return Err(invalid());
        }
        Ok(Self::starting(start))
    }
}
