use chrono::{DateTime, Local, TimeZone, Utc};

/// Current Unix timestamp in milliseconds (UTC).
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Render a millisecond timestamp as RFC 3339 (UTC).
///
/// Out-of-range values fall back to the Unix epoch.
pub fn timestamp_to_rfc3339(millis: i64) -> String {
    let datetime: DateTime<Utc> = Utc
        .timestamp_millis_opt(millis)
        .single()
        .unwrap_or(DateTime::<Utc>::UNIX_EPOCH);
    datetime.to_rfc3339()
}

/// Render a millisecond timestamp as a short local wall-clock time (`HH:MM`).
pub fn timestamp_to_local_clock(millis: i64) -> String {
    match Local.timestamp_millis_opt(millis).single() {
        Some(datetime) => datetime.format("%H:%M").to_string(),
        None => "--:--".to_string(),
    }
}
