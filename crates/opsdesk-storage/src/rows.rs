//! Column codecs shared by the repositories.

use std::str::FromStr;

use chrono::{DateTime, TimeZone, Utc};
use rusqlite::types::FromSql;
use rusqlite::Row;
use rust_decimal::Decimal;
use uuid::Uuid;

use opsdesk_core::error::OpsdeskError;

pub(crate) fn storage_err(e: rusqlite::Error) -> OpsdeskError {
    OpsdeskError::Storage(e.to_string())
}

pub(crate) fn get<T: FromSql>(row: &Row<'_>, idx: usize) -> Result<T, OpsdeskError> {
    row.get(idx).map_err(storage_err)
}

pub(crate) fn get_uuid(row: &Row<'_>, idx: usize) -> Result<Uuid, OpsdeskError> {
    let raw: String = get(row, idx)?;
    parse_uuid(&raw)
}

pub(crate) fn get_opt_uuid(row: &Row<'_>, idx: usize) -> Result<Option<Uuid>, OpsdeskError> {
    let raw: Option<String> = get(row, idx)?;
    raw.as_deref().map(parse_uuid).transpose()
}

pub(crate) fn get_decimal(row: &Row<'_>, idx: usize) -> Result<Decimal, OpsdeskError> {
    let raw: String = get(row, idx)?;
    Decimal::from_str(&raw)
        .map_err(|e| OpsdeskError::Storage(format!("Invalid decimal '{}': {}", raw, e)))
}

pub(crate) fn get_datetime(row: &Row<'_>, idx: usize) -> Result<DateTime<Utc>, OpsdeskError> {
    let secs: i64 = get(row, idx)?;
    Ok(from_epoch(secs))
}

pub(crate) fn get_opt_datetime(
    row: &Row<'_>,
    idx: usize,
) -> Result<Option<DateTime<Utc>>, OpsdeskError> {
    let secs: Option<i64> = get(row, idx)?;
    Ok(secs.map(from_epoch))
}

/// Parse an enum column through its `FromStr` impl.
pub(crate) fn get_enum<T>(row: &Row<'_>, idx: usize) -> Result<T, OpsdeskError>
where
    T: FromStr<Err = String>,
{
    let raw: String = get(row, idx)?;
    raw.parse().map_err(OpsdeskError::Storage)
}

pub(crate) fn parse_uuid(raw: &str) -> Result<Uuid, OpsdeskError> {
    Uuid::parse_str(raw).map_err(|e| OpsdeskError::Storage(format!("Invalid UUID: {}", e)))
}

pub(crate) fn from_epoch(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(secs, 0).single().unwrap_or_default()
}

/// Drain a `query_map` whose closure returns a fallible conversion.
pub(crate) fn collect<T, I>(rows: I) -> Result<Vec<T>, OpsdeskError>
where
    I: Iterator<Item = rusqlite::Result<Result<T, OpsdeskError>>>,
{
    let mut out = Vec::new();
    for row in rows {
        out.push(row.map_err(storage_err)??);
    }
    Ok(out)
}

/// Extension trait for rusqlite to support optional query results.
pub(crate) trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>, rusqlite::Error>;
}

impl<T> OptionalExt<T> for Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>, rusqlite::Error> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e),
        }
    }
}
