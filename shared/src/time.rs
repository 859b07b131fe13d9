//! 时间工具函数 (业务时区)
//!
//! Timestamps travel as `i64` Unix millis everywhere; only the display layer
//! and the day-keyed sequencer convert them into calendar values.

use chrono::{DateTime, FixedOffset, Local, TimeZone, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Business time zone used to derive calendar days and wall-clock times
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BusinessZone {
    /// The process's local zone
    #[default]
    Local,
    /// An IANA zone, e.g. `Asia/Shanghai`
    Named(Tz),
    /// A fixed UTC offset (mostly useful in tests)
    Fixed(FixedOffset),
}

impl BusinessZone {
    /// Fixed offset `hours` east of UTC
    pub fn utc_plus(hours: i32) -> Option<Self> {
        FixedOffset::east_opt(hours * 3600).map(Self::Fixed)
    }

    /// Format a Unix-millis timestamp in this zone with a chrono format string
    ///
    /// Returns `None` for timestamps chrono cannot represent.
    pub fn format_millis(&self, millis: i64, fmt: &str) -> Option<String> {
        let utc: DateTime<Utc> = DateTime::from_timestamp_millis(millis)?;
        let formatted = match self {
            Self::Local => utc.with_timezone(&Local).format(fmt).to_string(),
            Self::Named(tz) => utc.with_timezone(tz).format(fmt).to_string(),
            Self::Fixed(offset) => offset.from_utc_datetime(&utc.naive_utc()).format(fmt).to_string(),
        };
        Some(formatted)
    }
}

impl fmt::Display for BusinessZone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local => write!(f, "local"),
            Self::Named(tz) => write!(f, "{}", tz.name()),
            Self::Fixed(offset) => write!(f, "{}", offset),
        }
    }
}

impl FromStr for BusinessZone {
    type Err = String;

    /// Empty string and `local` mean the process zone; anything else must be
    /// an IANA zone name.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("local") {
            return Ok(Self::Local);
        }
        trimmed
            .parse::<Tz>()
            .map(Self::Named)
            .map_err(|e| format!("Invalid time zone '{}': {}", trimmed, e))
    }
}

impl Serialize for BusinessZone {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for BusinessZone {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Calendar day key `YYYYMMDD` of a timestamp in the given zone
pub fn date_key(millis: i64, zone: &BusinessZone) -> Option<String> {
    zone.format_millis(millis, "%Y%m%d")
}

/// Wall-clock time `HH:MM:SS` of a timestamp in the given zone
pub fn display_time(millis: i64, zone: &BusinessZone) -> Option<String> {
    zone.format_millis(millis, "%H:%M:%S")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn millis_utc(y: i32, m: u32, d: u32, h: u32, min: u32) -> i64 {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap()
            .and_utc()
            .timestamp_millis()
    }

    #[test]
    fn test_date_key_respects_zone() {
        // 2025-11-29 23:30 UTC is already 2025-11-30 in UTC+8
        let ts = millis_utc(2025, 11, 29, 23, 30);
        let utc = BusinessZone::utc_plus(0).unwrap();
        let cst = BusinessZone::utc_plus(8).unwrap();
        assert_eq!(date_key(ts, &utc).as_deref(), Some("20251129"));
        assert_eq!(date_key(ts, &cst).as_deref(), Some("20251130"));
    }

    #[test]
    fn test_named_zone() {
        let zone: BusinessZone = "Asia/Shanghai".parse().unwrap();
        let ts = millis_utc(2025, 11, 29, 16, 5);
        assert_eq!(display_time(ts, &zone).as_deref(), Some("00:05:00"));
        assert_eq!(date_key(ts, &zone).as_deref(), Some("20251130"));
    }

    #[test]
    fn test_parse_zone() {
        assert_eq!("".parse::<BusinessZone>().unwrap(), BusinessZone::Local);
        assert_eq!("local".parse::<BusinessZone>().unwrap(), BusinessZone::Local);
        assert!("Mars/Olympus".parse::<BusinessZone>().is_err());
    }
}
