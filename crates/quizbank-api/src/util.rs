use chrono::{DateTime, NaiveDateTime, Utc};
use tracing::warn;
use uuid::Uuid;

pub(crate) fn parse_uuid(s: &str) -> Uuid {
    s.parse().unwrap_or_else(|e| {
        warn!("Corrupt id '{}': {}", s, e);
        Uuid::default()
    })
}

/// SQLite stores timestamps as "YYYY-MM-DD HH:MM:SS" without timezone.
/// Parse as naive UTC and convert.
pub(crate) fn parse_sqlite_ts(s: &str) -> DateTime<Utc> {
    s.parse::<DateTime<Utc>>()
        .or_else(|_| {
            NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc())
        })
        .unwrap_or_else(|e| {
            warn!("Corrupt timestamp '{}': {}", s, e);
            DateTime::default()
        })
}
