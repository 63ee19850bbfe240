//! 时间工具函数 (业务时区转换)
//!
//! Storage keeps `i64` Unix millis; calendar dates are always taken in the
//! business timezone.

use chrono::{DateTime, NaiveDate, TimeZone};
use chrono_tz::Tz;

/// Unix millis → local calendar date (业务时区)
pub fn local_date(millis: i64, tz: Tz) -> NaiveDate {
    match tz.timestamp_millis_opt(millis).single() {
        Some(dt) => dt.date_naive(),
        None => DateTime::from_timestamp_millis(millis)
            .map(|dt| dt.date_naive())
            .unwrap_or_default(),
    }
}

/// Today's date in the business timezone
pub fn today(tz: Tz) -> NaiveDate {
    chrono::Utc::now().with_timezone(&tz).date_naive()
}

/// Parse an IANA timezone name, falling back to UTC
pub fn parse_timezone(name: &str) -> Tz {
    name.parse().unwrap_or_else(|e| {
        tracing::warn!(timezone = %name, error = %e, "Unknown timezone, falling back to UTC");
        chrono_tz::UTC
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_date_crosses_midnight() {
        // 2024-03-02 01:30 UTC is still March 1st in São Paulo (UTC-3)
        let millis = 1_709_343_000_000;
        let sp = parse_timezone("America/Sao_Paulo");
        assert_eq!(local_date(millis, sp), NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
        assert_eq!(
            local_date(millis, chrono_tz::UTC),
            NaiveDate::from_ymd_opt(2024, 3, 2).unwrap()
        );
    }

    #[test]
    fn test_parse_timezone_fallback() {
        assert_eq!(parse_timezone("Not/AZone"), chrono_tz::UTC);
    }
}
