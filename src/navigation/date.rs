use std::{fmt, str::FromStr};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid date '{0}', expected YYYY-MM-DD")]
pub struct InvalidDate(pub String);

/// A calendar day, always rendered as zero-padded `YYYY-MM-DD`.
///
/// Ordering goes through the underlying date, and the rendered form is
/// fixed-width, so sorting either representation gives the same result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EntryDate(NaiveDate);

impl EntryDate {
    pub fn new(date: NaiveDate) -> Self {
        Self(date)
    }

    pub fn from_ymd(year: i32, month: u32, day: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, day).map(Self)
    }

    pub fn parse(raw: &str) -> Result<Self, InvalidDate> {
        let date = NaiveDate::parse_from_str(raw, DATE_FORMAT)
            .map_err(|_| InvalidDate(raw.to_string()))?;

        // chrono accepts "2024-3-5"; only the padded form keeps string order sane.
        if date.format(DATE_FORMAT).to_string() != raw {
            return Err(InvalidDate(raw.to_string()));
        }

        Ok(Self(date))
    }

    pub fn previous(self) -> Option<Self> {
        self.0.pred_opt().map(Self)
    }

    pub fn next(self) -> Option<Self> {
        self.0.succ_opt().map(Self)
    }

    pub fn as_naive(self) -> NaiveDate {
        self.0
    }
}

impl fmt::Display for EntryDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(DATE_FORMAT))
    }
}

impl FromStr for EntryDate {
    type Err = InvalidDate;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for EntryDate {
    type Error = InvalidDate;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<EntryDate> for String {
    fn from(date: EntryDate) -> Self {
        date.to_string()
    }
}
