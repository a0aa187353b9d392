use chrono::{DateTime, NaiveDate, Utc};

/// Parse an API timestamp: RFC 3339 with or without fractional seconds.
/// No other shape is accepted.
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Timestamp for ordering: unparsable values sort earliest-possible so a
/// malformed `created_at` never wins a latest-snapshot race, and is never
/// excluded either.
pub fn parse_timestamp_or_min(s: &str) -> DateTime<Utc> {
    parse_timestamp(s).unwrap_or(DateTime::<Utc>::MIN_UTC)
}

/// Parse a date field: plain `YYYY-MM-DD` first, then a full timestamp
/// (the server occasionally returns one where a date is expected).
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(d);
    }
    parse_timestamp(s).map(|dt| dt.date_naive())
}

/// Today's date in UTC, formatted as the API's `date` scalar.
pub fn today_utc_string() -> String {
    Utc::now().format("%Y-%m-%d").to_string()
}
