use chrono::NaiveDateTime;
use serde::Serializer;

/// Layout of timestamps in API responses
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Format a timestamp as text, dropping any fractional seconds
pub fn timestamp(timestamp: &NaiveDateTime) -> String {
    timestamp.format(TIMESTAMP_FORMAT).to_string()
}

/// Serialize an optional timestamp as formatted text or `null`
pub fn serialize_timestamp<S>(
    timestamp: &Option<NaiveDateTime>,
    serializer: S,
) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match timestamp {
        Some(timestamp) => serializer.serialize_str(&self::timestamp(timestamp)),
        None => serializer.serialize_none(),
    }
}
