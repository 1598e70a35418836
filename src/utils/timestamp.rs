//! Lenient (de)serialization for the date-like fields of portal records.
//!
//! Backends disagree on how they hand timestamps back: the gateway echoes
//! whatever string the client sent (possibly `""`), the document store may
//! return epoch milliseconds or a `{seconds, nanoseconds}` object. Anything
//! that can't be read becomes `None`, which sorts last.

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serializer};
use serde_json::Value;

pub fn serialize<S>(value: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match value {
        Some(ts) => serializer.serialize_str(&format_iso(ts)),
        None => serializer.serialize_none(),
    }
}

pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(raw.as_ref().and_then(parse_value))
}

/// Same shape a browser's `Date.toISOString()` produces.
pub fn format_iso(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub fn parse_value(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) => parse_str(s),
        Value::Number(n) => n.as_i64().and_then(DateTime::from_timestamp_millis),
        Value::Object(map) => {
            let seconds = map.get("seconds").and_then(Value::as_i64)?;
            let nanos = map
                .get("nanoseconds")
                .and_then(Value::as_u64)
                .unwrap_or(0);
            DateTime::from_timestamp(seconds, u32::try_from(nanos).ok()?)
        }
        _ => None,
    }
}

pub fn parse_str(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(naive.and_utc());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn reads_the_shapes_backends_return() {
        let expected = Utc.with_ymd_and_hms(2025, 3, 1, 9, 30, 0).unwrap();

        assert_eq!(parse_value(&json!("2025-03-01T09:30:00.000Z")), Some(expected));
        assert_eq!(parse_value(&json!("2025-03-01T11:30:00+02:00")), Some(expected));
        assert_eq!(parse_value(&json!("2025-03-01T09:30:00")), Some(expected));
        assert_eq!(parse_value(&json!(expected.timestamp_millis())), Some(expected));
        assert_eq!(
            parse_value(&json!({"seconds": expected.timestamp(), "nanoseconds": 0})),
            Some(expected)
        );
    }

    #[test]
    fn date_only_reads_as_midnight() {
        let midnight = Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap();
        assert_eq!(parse_str("2025-03-01"), Some(midnight));
    }

    #[test]
    fn blank_and_garbage_read_as_unknown() {
        assert_eq!(parse_value(&json!("")), None);
        assert_eq!(parse_value(&json!("next tuesday")), None);
        assert_eq!(parse_value(&json!(true)), None);
        assert_eq!(
            parse_value(&json!({"seconds": 1, "nanoseconds": u64::from(u32::MAX) + 1})),
            None
        );
    }

    #[test]
    fn iso_output_matches_browser_format() {
        let ts = Utc.with_ymd_and_hms(2025, 3, 1, 9, 30, 0).unwrap();
        assert_eq!(format_iso(&ts), "2025-03-01T09:30:00.000Z");
    }
}
