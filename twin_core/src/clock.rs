//! Wall-clock times of day and 12-hour labels.

use crate::{Error, Result};
use chrono::{Duration, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const MINUTES_PER_DAY: i64 = 24 * 60;

/// A time of day with minute resolution, in [00:00, 24:00)
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ClockTime(NaiveTime);

impl ClockTime {
    pub const MIDNIGHT: ClockTime = ClockTime(NaiveTime::MIN);

    pub fn from_hm(hour: u32, minute: u32) -> Option<Self> {
        NaiveTime::from_hms_opt(hour, minute, 0).map(Self)
    }

    /// Parse "HH:MM" (a single-digit hour is accepted)
    pub fn parse(s: &str) -> Result<Self> {
        NaiveTime::parse_from_str(s.trim(), "%H:%M")
            .map(Self)
            .map_err(|_| Error::InvalidClockTime(s.to_string()))
    }

    /// Fractional hours since midnight
    pub fn hours(&self) -> f64 {
        f64::from(self.0.num_seconds_from_midnight()) / 3600.0
    }

    /// 12-hour label of this time plus `elapsed_hours`, wrapped past midnight
    pub fn label_after(&self, elapsed_hours: f64) -> String {
        format_clock_label(self.hours() + elapsed_hours)
    }
}

impl FromStr for ClockTime {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for ClockTime {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        Self::parse(&s)
    }
}

impl From<ClockTime> for String {
    fn from(t: ClockTime) -> Self {
        t.to_string()
    }
}

impl fmt::Display for ClockTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%H:%M"))
    }
}

/// Format fractional clock hours as "h:mm AM/PM", wrapping mod 24
pub fn format_clock_label(hours: f64) -> String {
    let minutes = ((hours * 60.0).round() as i64).rem_euclid(MINUTES_PER_DAY);
    let (time, _) = NaiveTime::MIN.overflowing_add_signed(Duration::minutes(minutes));
    time.format("%-I:%M %p").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_clock_times() {
        assert_eq!(ClockTime::parse("08:00").unwrap().hours(), 8.0);
        assert_eq!(ClockTime::parse("8:30").unwrap().hours(), 8.5);
        assert_eq!(ClockTime::parse("23:59").unwrap().to_string(), "23:59");
        assert!(ClockTime::parse("24:00").is_err());
        assert!(ClockTime::parse("12:60").is_err());
        assert!(ClockTime::parse("noon").is_err());
        assert!(ClockTime::parse("").is_err());
    }

    #[test]
    fn test_parse_rejects_signed_fields() {
        for input in ["+8:00", "8:+5", "-1:00", "08:-5"] {
            assert!(
                matches!(ClockTime::parse(input), Err(Error::InvalidClockTime(ref s)) if s == input),
                "{:?} should be rejected",
                input
            );
        }
    }

    #[test]
    fn test_format_labels() {
        assert_eq!(format_clock_label(0.0), "12:00 AM");
        assert_eq!(format_clock_label(8.0), "8:00 AM");
        assert_eq!(format_clock_label(12.0), "12:00 PM");
        assert_eq!(format_clock_label(13.5), "1:30 PM");
        assert_eq!(format_clock_label(23.0), "11:00 PM");
        assert_eq!(format_clock_label(24.0), "12:00 AM");
        assert_eq!(format_clock_label(32.0), "8:00 AM");
        assert_eq!(format_clock_label(-0.5), "11:30 PM");
        assert!(format_clock_label(f64::MAX).ends_with('M'));
    }

    #[test]
    fn test_label_after_wraps() {
        let start = ClockTime::parse("20:15").unwrap();
        assert_eq!(start.label_after(0.0), "8:15 PM");
        assert_eq!(start.label_after(5.0), "1:15 AM");
    }

    #[test]
    fn test_serde_as_string() {
        let t: ClockTime = serde_json::from_str("\"07:05\"").unwrap();
        assert_eq!(serde_json::to_string(&t).unwrap(), "\"07:05\"");
        assert!(serde_json::from_str::<ClockTime>("\"7\"").is_err());
    }
}
