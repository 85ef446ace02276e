//! Timestamp codec used for `deadline` and `dateCreated`.
//!
//! Timestamps are written as RFC 3339 UTC strings with millisecond
//! precision so that stored values sort lexicographically in time order.
//! Reading is lenient: RFC 3339, bare `YYYY-MM-DD` dates, naive
//! date-times (taken as UTC) and epoch milliseconds are all accepted.

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, TimeZone, Utc};
use serde::{de, Deserialize, Deserializer, Serializer};

pub fn format_timestamp(value: &DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Parses a timestamp string in any of the accepted layouts.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    for layout in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, layout) {
            return Some(naive.and_utc());
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0).map(|naive| naive.and_utc());
    }
    raw.parse::<i64>().ok().and_then(from_millis)
}

pub(crate) fn from_millis(millis: i64) -> Option<DateTime<Utc>> {
    Utc.timestamp_millis_opt(millis).single()
}

pub(crate) fn serialize<S>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&format_timestamp(value))
}

pub(crate) fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Millis(i64),
        Text(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Millis(millis) => {
            from_millis(millis).ok_or_else(|| de::Error::custom("timestamp out of range"))
        }
        Raw::Text(text) => parse_timestamp(&text)
            .ok_or_else(|| de::Error::custom(format!("invalid timestamp '{text}'"))),
    }
}
