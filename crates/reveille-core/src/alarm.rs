//! Alarm and override records.
//!
//! An [`Alarm`] is a recurring definition (time of day plus a set of
//! weekdays). An [`Override`] is a one-time exception scoped to a single
//! `(alarm, date)` pair: a different time, a different sound, or a skip.
//! Overrides reference alarms by id and never outlive them.

use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDate, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// A time of day at minute granularity, the resolution alarms fire at.
///
/// Parses from and renders as zero-padded 24-hour `HH:MM`. Ordering is
/// chronological within a day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ClockTime {
    pub hour: u8,
    pub minute: u8,
}

impl ClockTime {
    pub fn new(hour: u8, minute: u8) -> Option<Self> {
        if hour > 23 || minute > 59 {
            return None;
        }
        Some(Self { hour, minute })
    }

    /// Truncate a full time-of-day to the minute.
    pub fn from_time(t: NaiveTime) -> Self {
        Self {
            hour: t.hour() as u8,
            minute: t.minute() as u8,
        }
    }

    /// Minutes since midnight.
    pub fn minutes_from_midnight(self) -> i64 {
        i64::from(self.hour) * 60 + i64::from(self.minute)
    }

    /// Boundary helper for optional time fields: `None` and the empty string
    /// both mean "absent" (an override with an empty time falls back to the
    /// alarm's base time).
    pub fn parse_optional(s: Option<&str>) -> Result<Option<Self>, ValidationError> {
        match s {
            None | Some("") => Ok(None),
            Some(v) => v.parse().map(Some),
        }
    }
}

impl FromStr for ClockTime {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = s.as_bytes();
        if bytes.len() != 5 || bytes[2] != b':' {
            return Err(ValidationError::InvalidTime(s.to_string()));
        }
        let hour: u8 = s[..2]
            .parse()
            .map_err(|_| ValidationError::InvalidTime(s.to_string()))?;
        let minute: u8 = s[3..]
            .parse()
            .map_err(|_| ValidationError::InvalidTime(s.to_string()))?;
        Self::new(hour, minute).ok_or_else(|| ValidationError::InvalidTime(s.to_string()))
    }
}

impl fmt::Display for ClockTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

impl TryFrom<String> for ClockTime {
    type Error = ValidationError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<ClockTime> for String {
    fn from(t: ClockTime) -> Self {
        t.to_string()
    }
}

/// Day of the week an alarm is configured for.
///
/// Stored as the full lowercase name; parsing also accepts three-letter
/// abbreviations, case-insensitively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DayOfWeek {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl DayOfWeek {
    pub fn name(self) -> &'static str {
        match self {
            Self::Monday => "monday",
            Self::Tuesday => "tuesday",
            Self::Wednesday => "wednesday",
            Self::Thursday => "thursday",
            Self::Friday => "friday",
            Self::Saturday => "saturday",
            Self::Sunday => "sunday",
        }
    }

    /// 0 for Monday through 6 for Sunday.
    pub fn days_from_monday(self) -> i64 {
        match self {
            Self::Monday => 0,
            Self::Tuesday => 1,
            Self::Wednesday => 2,
            Self::Thursday => 3,
            Self::Friday => 4,
            Self::Saturday => 5,
            Self::Sunday => 6,
        }
    }
}

impl fmt::Display for DayOfWeek {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DayOfWeek {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "monday" | "mon" => Ok(Self::Monday),
            "tuesday" | "tue" => Ok(Self::Tuesday),
            "wednesday" | "wed" => Ok(Self::Wednesday),
            "thursday" | "thu" => Ok(Self::Thursday),
            "friday" | "fri" => Ok(Self::Friday),
            "saturday" | "sat" => Ok(Self::Saturday),
            "sunday" | "sun" => Ok(Self::Sunday),
            _ => Err(ValidationError::UnknownDay(s.to_string())),
        }
    }
}

impl From<chrono::Weekday> for DayOfWeek {
    fn from(w: chrono::Weekday) -> Self {
        match w {
            chrono::Weekday::Mon => Self::Monday,
            chrono::Weekday::Tue => Self::Tuesday,
            chrono::Weekday::Wed => Self::Wednesday,
            chrono::Weekday::Thu => Self::Thursday,
            chrono::Weekday::Fri => Self::Friday,
            chrono::Weekday::Sat => Self::Saturday,
            chrono::Weekday::Sun => Self::Sunday,
        }
    }
}

/// Parse and normalize a list of day names.
pub fn parse_days<I, S>(days: I) -> Result<Vec<DayOfWeek>, ValidationError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    days.into_iter().map(|d| d.as_ref().parse()).collect()
}

/// Parse a `YYYY-MM-DD` date string.
pub fn parse_date(s: &str) -> Result<NaiveDate, ValidationError> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|_| ValidationError::InvalidDate(s.to_string()))
}

/// A recurring alarm definition.
///
/// The id is generated at creation and never changes. An empty `days` list
/// is legal and simply never fires.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alarm {
    pub id: String,
    pub time: ClockTime,
    pub days: Vec<DayOfWeek>,
    pub sound: String,
    pub enabled: bool,
    #[serde(default)]
    pub label: String,
}

/// A one-time exception to a specific alarm occurrence on a specific date.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Override {
    pub id: String,
    pub alarm_id: String,
    pub target_date: NaiveDate,
    #[serde(default)]
    pub override_time: Option<ClockTime>,
    #[serde(default)]
    pub override_sound: Option<String>,
    #[serde(default)]
    pub skip: bool,
}

/// Partial update for an alarm. `None` fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct AlarmPatch {
    pub time: Option<ClockTime>,
    pub days: Option<Vec<DayOfWeek>>,
    pub sound: Option<String>,
    pub enabled: Option<bool>,
    pub label: Option<String>,
}

/// Partial update for an override.
///
/// The optional fields are two-level: the outer `Option` is "touch this
/// field at all", the inner one is the new value (`None` clears it).
#[derive(Debug, Clone, Default)]
pub struct OverridePatch {
    pub override_time: Option<Option<ClockTime>>,
    pub override_sound: Option<Option<String>>,
    pub skip: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clock_time_parses_valid_strings() {
        let t: ClockTime = "07:00".parse().unwrap();
        assert_eq!((t.hour, t.minute), (7, 0));
        let t: ClockTime = "23:59".parse().unwrap();
        assert_eq!((t.hour, t.minute), (23, 59));
        assert_eq!(t.to_string(), "23:59");
    }

    #[test]
    fn clock_time_rejects_malformed_strings() {
        for s in ["7:00", "0700", "24:00", "12:60", "ab:cd", "", "07:0", "07:000"] {
            assert!(s.parse::<ClockTime>().is_err(), "accepted {s:?}");
        }
    }

    #[test]
    fn clock_time_orders_chronologically() {
        let early: ClockTime = "06:30".parse().unwrap();
        let late: ClockTime = "18:05".parse().unwrap();
        assert!(early < late);
        assert!("07:00".parse::<ClockTime>().unwrap() <= "07:00".parse::<ClockTime>().unwrap());
    }

    #[test]
    fn clock_time_serde_round_trip() {
        let t: ClockTime = "08:15".parse().unwrap();
        let json = serde_json::to_string(&t).unwrap();
        assert_eq!(json, "\"08:15\"");
        let back: ClockTime = serde_json::from_str(&json).unwrap();
        assert_eq!(back, t);
        assert!(serde_json::from_str::<ClockTime>("\"25:00\"").is_err());
    }

    #[test]
    fn parse_optional_treats_empty_as_absent() {
        assert_eq!(ClockTime::parse_optional(None).unwrap(), None);
        assert_eq!(ClockTime::parse_optional(Some("")).unwrap(), None);
        assert_eq!(
            ClockTime::parse_optional(Some("07:30")).unwrap(),
            Some("07:30".parse().unwrap())
        );
        assert!(ClockTime::parse_optional(Some("late")).is_err());
    }

    #[test]
    fn day_parses_full_and_short_names() {
        assert_eq!("monday".parse::<DayOfWeek>().unwrap(), DayOfWeek::Monday);
        assert_eq!("MON".parse::<DayOfWeek>().unwrap(), DayOfWeek::Monday);
        assert_eq!("Tue".parse::<DayOfWeek>().unwrap(), DayOfWeek::Tuesday);
        assert_eq!("SUNDAY".parse::<DayOfWeek>().unwrap(), DayOfWeek::Sunday);
        assert!("noday".parse::<DayOfWeek>().is_err());
    }

    #[test]
    fn day_serializes_lowercase() {
        let json = serde_json::to_string(&DayOfWeek::Wednesday).unwrap();
        assert_eq!(json, "\"wednesday\"");
        let back: DayOfWeek = serde_json::from_str(&json).unwrap();
        assert_eq!(back, DayOfWeek::Wednesday);
    }

    #[test]
    fn day_from_chrono_weekday() {
        assert_eq!(DayOfWeek::from(chrono::Weekday::Mon), DayOfWeek::Monday);
        assert_eq!(DayOfWeek::from(chrono::Weekday::Sun), DayOfWeek::Sunday);
    }

    #[test]
    fn parse_days_rejects_unknown_names() {
        let days = parse_days(["mon", "Friday"]).unwrap();
        assert_eq!(days, vec![DayOfWeek::Monday, DayOfWeek::Friday]);
        assert!(parse_days(["mon", "weekend"]).is_err());
    }

    #[test]
    fn parse_date_round_trip() {
        let d = parse_date("2026-08-03").unwrap();
        assert_eq!(d, NaiveDate::from_ymd_opt(2026, 8, 3).unwrap());
        assert!(parse_date("03/08/2026").is_err());
    }
}
