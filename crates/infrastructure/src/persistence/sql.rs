//! Column encoding helpers shared by the SQLite stores

use std::fmt::Display;

use chrono::{DateTime, SecondsFormat, Utc};
use domain::value_objects::GeoPoint;
use rusqlite::{Row, types::Type};

/// Fixed-width RFC 3339 so that text order equals time order
pub(crate) fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

/// Wrap a decoding failure so it surfaces as a rusqlite conversion error
pub(crate) fn conversion_error(row: &Row<'_>, column: &str, err: impl Display) -> rusqlite::Error {
    let index = row.as_ref().column_index(column).unwrap_or_default();
    rusqlite::Error::FromSqlConversionFailure(
        index,
        Type::Text,
        format!("{column}: {err}").into(),
    )
}

/// Read a text column and parse it
pub(crate) fn parse_column<T, E, F>(row: &Row<'_>, column: &str, parse: F) -> rusqlite::Result<T>
where
    E: Display,
    F: FnOnce(&str) -> Result<T, E>,
{
    let raw: String = row.get(column)?;
    parse(&raw).map_err(|e| conversion_error(row, column, e))
}

pub(crate) fn timestamp_column(row: &Row<'_>, column: &str) -> rusqlite::Result<DateTime<Utc>> {
    parse_column(row, column, |s| {
        DateTime::parse_from_rfc3339(s).map(|dt| dt.with_timezone(&Utc))
    })
}

/// Read a latitude/longitude column pair as a validated point
pub(crate) fn point_columns(row: &Row<'_>, lat: &str, lng: &str) -> rusqlite::Result<GeoPoint> {
    let latitude: f64 = row.get(lat)?;
    let longitude: f64 = row.get(lng)?;
    GeoPoint::new(latitude, longitude).map_err(|e| conversion_error(row, lat, e))
}
