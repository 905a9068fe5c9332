//! Timestamps are stored as RFC 3339 text.

use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::Row;

pub fn to_sql(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339()
}

fn parse(idx: usize, raw: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

pub fn column(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    parse(idx, &raw)
}

pub fn optional_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<DateTime<Utc>>> {
    let raw: Option<String> = row.get(idx)?;
    raw.map(|raw| parse(idx, &raw)).transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rusqlite::Connection;

    #[test]
    fn test_column_round_trip_and_null() {
        let conn = Connection::open_in_memory().unwrap();
        let kickoff = Utc.with_ymd_and_hms(2025, 8, 21, 18, 30, 0).unwrap();

        let (at, missing) = conn
            .query_row(
                "SELECT ?1, NULL",
                [to_sql(&kickoff)],
                |row| Ok((column(row, 0)?, optional_column(row, 1)?)),
            )
            .unwrap();

        assert_eq!(at, kickoff);
        assert_eq!(missing, None);
    }

    #[test]
    fn test_malformed_timestamp_is_conversion_error() {
        let conn = Connection::open_in_memory().unwrap();
        let err = conn
            .query_row("SELECT 'next tuesday'", [], |row| column(row, 0))
            .unwrap_err();
        assert!(matches!(err, rusqlite::Error::FromSqlConversionFailure(0, Type::Text, _)));
    }
}
