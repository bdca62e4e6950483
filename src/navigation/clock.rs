use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};

use super::EntryDate;

/// Which calendar decides where one journal day ends and the next begins.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClockMode {
    #[default]
    Local,
    Utc,
}

impl ClockMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClockMode::Local => "local",
            ClockMode::Utc => "utc",
        }
    }
}

impl std::str::FromStr for ClockMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "local" => Ok(ClockMode::Local),
            "utc" => Ok(ClockMode::Utc),
            other => Err(anyhow::anyhow!("unknown clock mode '{other}'")),
        }
    }
}

/// Source of "now" and "today".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Clock {
    Local,
    Utc,
    /// Pins `today()`; timestamps still come from the system clock.
    Fixed(EntryDate),
}

impl Clock {
    pub fn today(&self) -> EntryDate {
        match self {
            Clock::Local => EntryDate::new(Local::now().date_naive()),
            Clock::Utc => EntryDate::new(Utc::now().date_naive()),
            Clock::Fixed(date) => *date,
        }
    }

    pub fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

impl From<ClockMode> for Clock {
    fn from(mode: ClockMode) -> Self {
        match mode {
            ClockMode::Local => Clock::Local,
            ClockMode::Utc => Clock::Utc,
        }
    }
}
