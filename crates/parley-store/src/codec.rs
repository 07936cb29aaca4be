//! Column codecs shared by the entity tables.
//!
//! Timestamps are RFC-3339 text, sync statuses are their integer code, and
//! the open-ended `extra_data` map plus list columns are JSON text.

use chrono::{DateTime, SecondsFormat, Utc};
use parley_shared::SyncStatus;
use rusqlite::types::Type;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::models::ExtraData;

fn conversion_error(
    idx: usize,
    err: impl std::error::Error + Send + Sync + 'static,
) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(err))
}

/// Fixed-width UTC text, so lexical order in SQL matches time order.
pub fn ts_to_sql(ts: &Option<DateTime<Utc>>) -> Option<String> {
    ts.map(|t| t.to_rfc3339_opts(SecondsFormat::Nanos, true))
}

pub fn ts_from_sql(idx: usize, raw: Option<String>) -> rusqlite::Result<Option<DateTime<Utc>>> {
    raw.map(|s| {
        DateTime::parse_from_rfc3339(&s)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| conversion_error(idx, e))
    })
    .transpose()
}

pub fn sync_status_from_sql(idx: usize, code: i32) -> rusqlite::Result<SyncStatus> {
    SyncStatus::from_code(code)
        .ok_or(rusqlite::Error::IntegralValueOutOfRange(idx, i64::from(code)))
}

/// Encode the extra-data map. An empty map is stored as `{}`.
pub fn extra_data_to_sql(data: &ExtraData) -> serde_json::Result<String> {
    if data.is_empty() {
        return Ok("{}".to_string());
    }
    serde_json::to_string(data)
}

/// Decode the extra-data map. `NULL`, empty text and `"null"` all decode to an
/// empty map.
pub fn extra_data_from_sql(idx: usize, raw: Option<String>) -> rusqlite::Result<ExtraData> {
    match raw.as_deref() {
        None | Some("") | Some("null") => Ok(ExtraData::new()),
        Some(text) => serde_json::from_str(text).map_err(|e| conversion_error(idx, e)),
    }
}

pub fn json_to_sql<T: Serialize + ?Sized>(value: &T) -> serde_json::Result<String> {
    serde_json::to_string(value)
}

/// Decode a JSON list column; `NULL` and empty text decode to an empty list.
pub fn json_list_from_sql<T: DeserializeOwned>(
    idx: usize,
    raw: Option<String>,
) -> rusqlite::Result<Vec<T>> {
    match raw.as_deref() {
        None | Some("") | Some("null") => Ok(Vec::new()),
        Some(text) => serde_json::from_str(text).map_err(|e| conversion_error(idx, e)),
    }
}
