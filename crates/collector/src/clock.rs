use chrono::{DateTime, Duration, Utc};

/// Wire format of every date the CDM API accepts, e.g. `2024-03-01T12:00:00.000Z`.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";

const LOOKBACK_HOURS: i64 = 24;

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Window covered by full rescans and by the first incremental query.
pub fn lookback() -> Duration {
    Duration::hours(LOOKBACK_HOURS)
}

pub fn format_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.format(TIMESTAMP_FORMAT).to_string()
}

pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|timestamp| timestamp.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn formats_with_millisecond_precision() {
        let timestamp = Utc.with_ymd_and_hms(2024, 3, 1, 12, 5, 9).single();
        assert!(timestamp.is_some());
        if let Some(timestamp) = timestamp {
            assert_eq!(format_timestamp(timestamp), "2024-03-01T12:05:09.000Z");
        }
    }

    #[test]
    fn parses_api_timestamps() {
        let parsed = parse_timestamp("2024-03-01T12:05:09.250Z");
        let expected = Utc.with_ymd_and_hms(2024, 3, 1, 12, 5, 9).single();
        assert_eq!(
            parsed,
            expected.map(|timestamp| timestamp + Duration::milliseconds(250))
        );
        assert_eq!(parse_timestamp("yesterday"), None);
    }
}
