use std::convert::TryFrom;

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Serialize};

use crate::navigation::EntryDate;

pub fn to_u32(value: i64, field: &str) -> Result<u32> {
    u32::try_from(value).map_err(|_| anyhow!("{field} contains out-of-range value {value}"))
}

pub fn parse_datetime(value: &str, field: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .with_context(|| format!("failed to parse {field}"))
}

pub fn parse_date(value: &str, field: &str) -> Result<EntryDate> {
    EntryDate::parse(value).with_context(|| format!("failed to parse {field}"))
}

/// Sections are stored as JSON text; NULL means the section was never started.
pub fn section_to_json<T: Serialize>(value: Option<&T>, field: &str) -> Result<Option<String>> {
    value
        .map(|section| {
            serde_json::to_string(section).with_context(|| format!("failed to encode {field}"))
        })
        .transpose()
}

pub fn section_from_json<T: DeserializeOwned>(
    value: Option<String>,
    field: &str,
) -> Result<Option<T>> {
    match value {
        Some(raw) => serde_json::from_str(&raw)
            .map(Some)
            .with_context(|| format!("failed to decode {field}")),
        None => Ok(None),
    }
}
