//! On-wire timestamps: seconds offsets from the year-2000 epoch.
//!
//! Loggers have no notion of wall-clock time zones; every timestamp on the
//! wire is an unsigned 32-bit count of seconds since 2000-01-01 00:00:00,
//! and zero means the device had no timestamp to report.

use chrono::{Duration, NaiveDate, NaiveDateTime};

/// The text rendered for a zero (absent) timestamp.
pub const NO_TIMESTAMP: &str = "No timestamp";

/// The strftime pattern used to render device timestamps.
pub const TIMESTAMP_FORMAT: &str = "%a, %B %d, %Y %I:%M:%S %p";

/// Returns the fixed reference instant all device timestamps offset from.
///
/// # Examples
///
/// ```
/// use uplink::timestamp;
/// assert_eq!("2000-01-01 00:00:00", timestamp::epoch().to_string());
/// ```
pub fn epoch() -> NaiveDateTime {
    NaiveDate::from_ymd(2000, 1, 1).and_hms(0, 0, 0)
}

/// Converts a seconds offset to a datetime, or `None` for the zero sentinel.
///
/// # Examples
///
/// ```
/// use uplink::timestamp;
/// assert_eq!(None, timestamp::datetime(0));
/// let datetime = timestamp::datetime(86_400).unwrap();
/// assert_eq!("2000-01-02 00:00:00", datetime.to_string());
/// ```
pub fn datetime(seconds: u32) -> Option<NaiveDateTime> {
    if seconds == 0 {
        None
    } else {
        Some(epoch() + Duration::seconds(i64::from(seconds)))
    }
}

/// Renders a seconds offset as calendar text.
///
/// Any unsigned 32-bit value is representable; there is no error path.
///
/// # Examples
///
/// ```
/// use uplink::timestamp;
/// assert_eq!("No timestamp", timestamp::render(0));
/// assert_eq!("Sat, January 01, 2000 12:00:01 AM", timestamp::render(1));
/// ```
pub fn render(seconds: u32) -> String {
    match datetime(seconds) {
        Some(datetime) => datetime.format(TIMESTAMP_FORMAT).to_string(),
        None => NO_TIMESTAMP.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_is_absent() {
        assert_eq!(NO_TIMESTAMP, render(0));
        assert_eq!(None, datetime(0));
    }

    #[test]
    fn one_second_after_epoch() {
        assert_eq!("Sat, January 01, 2000 12:00:01 AM", render(1));
    }

    #[test]
    fn next_day() {
        assert_eq!("Sun, January 02, 2000 12:00:00 AM", render(86_400));
    }

    #[test]
    fn afternoon() {
        // 2000-01-01 13:05:09
        assert_eq!("Sat, January 01, 2000 01:05:09 PM", render(13 * 3600 + 5 * 60 + 9));
    }

    #[test]
    fn max_is_representable() {
        // u32::MAX seconds lands in 2136; just don't panic.
        assert!(datetime(u32::max_value()).is_some());
    }
}
