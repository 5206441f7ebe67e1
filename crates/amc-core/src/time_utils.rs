use chrono::{DateTime, NaiveDateTime, Utc};

/// Returns the current Unix timestamp in milliseconds.
pub fn current_unix_timestamp_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis()
        .try_into()
        .unwrap_or(u64::MAX)
}

/// Parses an ISO 8601 timestamp, tolerating the offset spellings observed in
/// imported rows: a trailing `Z`, a numeric UTC offset, or no offset at all
/// (treated as UTC).
pub fn parse_timestamp_lenient(raw: &str) -> Option<DateTime<Utc>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(parsed) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(parsed.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use chrono::Timelike;

    use super::*;

    #[test]
    fn unit_parse_timestamp_lenient_accepts_zulu_suffix() {
        let parsed = parse_timestamp_lenient("2026-08-01T12:30:00Z").expect("zulu timestamp");
        assert_eq!(parsed.hour(), 12);
        assert_eq!(parsed.minute(), 30);
    }

    #[test]
    fn unit_parse_timestamp_lenient_accepts_numeric_offset() {
        let parsed =
            parse_timestamp_lenient("2026-08-01T12:30:00+02:00").expect("offset timestamp");
        assert_eq!(parsed.hour(), 10);
    }

    #[test]
    fn unit_parse_timestamp_lenient_treats_bare_timestamp_as_utc() {
        let parsed = parse_timestamp_lenient("2026-08-01T12:30:00").expect("bare timestamp");
        assert_eq!(parsed.hour(), 12);
        let fractional =
            parse_timestamp_lenient("2026-08-01T12:30:00.250").expect("fractional timestamp");
        assert_eq!(fractional.hour(), 12);
    }

    #[test]
    fn regression_parse_timestamp_lenient_rejects_garbage_and_empty() {
        assert!(parse_timestamp_lenient("").is_none());
        assert!(parse_timestamp_lenient("   ").is_none());
        assert!(parse_timestamp_lenient("next tuesday").is_none());
        assert!(parse_timestamp_lenient("2026-13-45T99:99:99Z").is_none());
    }

    #[test]
    fn unit_current_unix_timestamp_ms_is_monotonic_enough() {
        let first = current_unix_timestamp_ms();
        let second = current_unix_timestamp_ms();
        assert!(second >= first);
    }
}
