//! Timestamp utilities

use chrono::{DateTime, NaiveDate, Utc};

/// Get current UTC timestamp
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Get current UTC calendar date (used to stamp export file names)
pub fn today() -> NaiveDate {
    now().date_naive()
}

/// Format a date as ISO 8601 `YYYY-MM-DD`
pub fn iso_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_now_returns_valid_timestamp() {
        let timestamp = now();
        // Should be a reasonable timestamp (after year 2000)
        assert!(timestamp.timestamp() > 946_684_800); // 2000-01-01 00:00:00 UTC
    }

    #[test]
    fn test_now_returns_recent_timestamp() {
        let timestamp = now();
        // Should be reasonably recent (before year 2100)
        assert!(timestamp.timestamp() < 4_102_444_800); // 2100-01-01 00:00:00 UTC
    }

    #[tokio::test]
    async fn test_now_successive_calls_advance() {
        let time1 = now();
        tokio::time::sleep(Duration::from_millis(10)).await;
        let time2 = now();
        assert!(time2 > time1);
    }

    #[test]
    fn test_today_matches_now() {
        let date = today();
        assert_eq!(date, now().date_naive());
    }

    #[test]
    fn test_iso_date_zero_pads() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 7).unwrap();
        assert_eq!(iso_date(date), "2024-03-07");
    }
}
