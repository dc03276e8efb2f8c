use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::Value;

/// Values above this are epoch milliseconds, at or below it epoch seconds.
const MILLIS_THRESHOLD: i64 = 10_000_000_000;

/// Render a UTC instant in the canonical log form.
///
/// Format: RFC 3339, millisecond precision, literal `Z` suffix
/// Example: 2023-11-14T22:13:20.000Z
pub fn canonical(instant: DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Canonical rendering of the current instant (the `received_at` column).
pub fn now_canonical() -> String {
    canonical(Utc::now())
}

/// Normalize a raw platform timestamp into the canonical form.
///
/// Accepts JSON numbers (floats truncate toward zero) and strings made only of
/// ASCII digits. Anything else, including out-of-range instants, yields an
/// empty string.
pub fn normalize(raw: Option<&Value>) -> String {
    raw.and_then(epoch_value)
        .and_then(to_instant)
        .map(canonical)
        .unwrap_or_default()
}

fn epoch_value(raw: &Value) -> Option<i64> {
    match raw {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i64)),
        Value::String(s) if !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()) => {
            s.parse::<i64>().ok()
        }
        _ => None,
    }
}

fn to_instant(value: i64) -> Option<DateTime<Utc>> {
    if value > MILLIS_THRESHOLD {
        DateTime::from_timestamp_millis(value)
    } else {
        DateTime::from_timestamp(value, 0)
    }
}
