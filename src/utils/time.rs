use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};

const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// ISO-8601 with microseconds and a `+00:00` offset.
pub fn to_iso8601(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, false)
}

/// ISO-8601 with microseconds and a trailing `Z`.
pub fn to_iso8601_z(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn from_rfc3339(s: &str) -> anyhow::Result<DateTime<Utc>> {
    Ok(DateTime::parse_from_rfc3339(s)?.with_timezone(&Utc))
}

/// Timestamps without an offset are read as UTC.
fn from_naive(s: &str) -> Option<DateTime<Utc>> {
    NAIVE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(s, format).ok())
        .map(|naive| naive.and_utc())
}

/// Converts an RFC 3339 or offset-less ISO timestamp to UTC; anything else is
/// returned as given.
pub fn normalize_timestamp(raw: &str) -> String {
    match from_rfc3339(raw).ok().or_else(|| from_naive(raw)) {
        Some(dt) => to_iso8601(dt),
        None => raw.to_string(),
    }
}

/// Unix epoch seconds as ISO-8601 UTC. `None` when out of range.
pub fn epoch_to_iso8601(secs: i64) -> Option<String> {
    DateTime::from_timestamp(secs, 0).map(to_iso8601)
}
