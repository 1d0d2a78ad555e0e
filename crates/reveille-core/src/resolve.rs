//! Occurrence resolution.
//!
//! Pure lookups over a store snapshot: the effective time/sound for an alarm
//! on a date, the globally next occurrence across all alarms, and the
//! minute-granularity "does this instant match" check the trigger engine
//! polls with. Nothing in here mutates state or touches devices.

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::alarm::{Alarm, ClockTime, DayOfWeek};
use crate::store::ScheduleStore;

/// What actually applies for one alarm on one date, after overrides.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EffectiveOccurrence {
    pub time: ClockTime,
    pub sound: String,
    pub skip: bool,
    pub override_id: Option<String>,
}

/// The next scheduled occurrence across every enabled alarm.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NextAlarm {
    pub id: String,
    pub time: ClockTime,
    pub original_time: ClockTime,
    pub day: DayOfWeek,
    pub label: String,
    pub sound: String,
    pub minutes_until: i64,
    pub target_date: NaiveDate,
    pub has_override: bool,
    pub override_id: Option<String>,
}

/// Result of the per-minute trigger check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriggerMatch {
    pub matched: bool,
    pub override_id: Option<String>,
}

impl TriggerMatch {
    fn none() -> Self {
        Self {
            matched: false,
            override_id: None,
        }
    }
}

/// Resolve the effective time/sound/skip for `alarm` on `date`.
///
/// An override's time or sound applies only when present; each absent field
/// falls back to the alarm's base value independently.
pub fn effective_occurrence(
    store: &ScheduleStore,
    alarm: &Alarm,
    date: NaiveDate,
) -> EffectiveOccurrence {
    let ov = store.override_for(&alarm.id, date);
    EffectiveOccurrence {
        time: ov.and_then(|o| o.override_time).unwrap_or(alarm.time),
        sound: ov
            .and_then(|o| o.override_sound.clone())
            .unwrap_or_else(|| alarm.sound.clone()),
        skip: ov.map(|o| o.skip).unwrap_or(false),
        override_id: ov.map(|o| o.id.clone()),
    }
}

/// Find the next occurrence across all enabled alarms, or `None` when no
/// enabled alarm has a valid one.
///
/// For each configured weekday the candidate date is the next calendar day
/// falling on that weekday. A today-candidate whose effective time has
/// already passed this minute advances a full week, and the override is
/// re-resolved for the new date -- a different exception may apply there.
/// Skip candidates drop out. Alarms are visited in ascending id order and a
/// strict comparison keeps the first minimum, so ties fall to the lowest id;
/// callers should not rely on tie order.
pub fn next_occurrence(store: &ScheduleStore, now: NaiveDateTime) -> Option<NextAlarm> {
    let current_minute = ClockTime::from_time(now.time());
    let today_from_monday = i64::from(now.date().weekday().num_days_from_monday());

    let mut next: Option<NextAlarm> = None;

    for id in store.alarm_ids_sorted() {
        let Some(alarm) = store.alarm(&id) else { continue };
        if !alarm.enabled {
            continue;
        }
        for &day in &alarm.days {
            let mut days_until = (day.days_from_monday() - today_from_monday).rem_euclid(7);
            let mut target_date = now.date() + Duration::days(days_until);
            let mut eff = effective_occurrence(store, alarm, target_date);

            // Today's instance already happened: look at the same weekday
            // next week instead.
            if days_until == 0 && eff.time <= current_minute {
                days_until = 7;
                target_date = now.date() + Duration::days(days_until);
                eff = effective_occurrence(store, alarm, target_date);
            }

            if eff.skip {
                continue;
            }

            let minutes_until = days_until * 24 * 60 + eff.time.minutes_from_midnight()
                - current_minute.minutes_from_midnight();

            if next
                .as_ref()
                .map(|n| minutes_until < n.minutes_until)
                .unwrap_or(true)
            {
                next = Some(NextAlarm {
                    id: alarm.id.clone(),
                    time: eff.time,
                    original_time: alarm.time,
                    day,
                    label: alarm.label.clone(),
                    sound: eff.sound,
                    minutes_until,
                    target_date,
                    has_override: eff.override_id.is_some(),
                    override_id: eff.override_id,
                });
            }
        }
    }

    next
}

/// Does `alarm` fire at this very minute?
///
/// True iff the alarm is enabled, today's weekday is configured, today's
/// override (if any) is not a skip, and the effective time equals `now`
/// truncated to the minute. The engine's ringing flag is what prevents a
/// second trigger inside the same minute.
pub fn matches_now(store: &ScheduleStore, alarm: &Alarm, now: NaiveDateTime) -> TriggerMatch {
    if !alarm.enabled {
        return TriggerMatch::none();
    }
    let today = DayOfWeek::from(now.date().weekday());
    if !alarm.days.contains(&today) {
        return TriggerMatch::none();
    }
    let eff = effective_occurrence(store, alarm, now.date());
    if eff.skip {
        return TriggerMatch::none();
    }
    TriggerMatch {
        matched: eff.time == ClockTime::from_time(now.time()),
        override_id: eff.override_id,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MemoryBackend, ScheduleStore};
    use chrono::NaiveDate;

    // 2026-08-03 is a Monday.
    fn monday(h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 8, 3)
            .unwrap()
            .and_hms_opt(h, m, s)
            .unwrap()
    }

    fn store_with_alarm(time: &str, days: Vec<DayOfWeek>, enabled: bool) -> (ScheduleStore, String) {
        let mut store = ScheduleStore::open(Box::new(MemoryBackend));
        let alarm = store.create_alarm(
            time.parse().unwrap(),
            days,
            "default.mp3".into(),
            enabled,
            String::new(),
        );
        let id = alarm.id;
        (store, id)
    }

    #[test]
    fn effective_occurrence_prefers_override_fields() {
        let (mut store, id) = store_with_alarm("07:00", vec![DayOfWeek::Monday], true);
        let date = NaiveDate::from_ymd_opt(2026, 8, 3).unwrap();
        store
            .create_override(&id, date, Some("07:30".parse().unwrap()), None, false)
            .unwrap();

        let alarm = store.alarm(&id).unwrap().clone();
        let eff = effective_occurrence(&store, &alarm, date);
        assert_eq!(eff.time.to_string(), "07:30");
        // Absent override sound falls back to the base sound.
        assert_eq!(eff.sound, "default.mp3");
        assert!(eff.override_id.is_some());

        // A date with no override resolves to base values.
        let other = date + Duration::days(7);
        let eff = effective_occurrence(&store, &alarm, other);
        assert_eq!(eff.time.to_string(), "07:00");
        assert_eq!(eff.override_id, None);
    }

    #[test]
    fn next_occurrence_same_day_upcoming() {
        let (store, id) = store_with_alarm("07:00", vec![DayOfWeek::Monday], true);
        let next = next_occurrence(&store, monday(6, 0, 0)).unwrap();
        assert_eq!(next.id, id);
        assert_eq!(next.minutes_until, 60);
        assert_eq!(next.target_date, NaiveDate::from_ymd_opt(2026, 8, 3).unwrap());
        assert!(!next.has_override);
    }

    #[test]
    fn next_occurrence_passed_today_advances_to_next_week_override() {
        let (mut store, id) = store_with_alarm("07:00", vec![DayOfWeek::Monday], true);
        let next_monday = NaiveDate::from_ymd_opt(2026, 8, 10).unwrap();
        store
            .create_override(&id, next_monday, Some("07:30".parse().unwrap()), None, false)
            .unwrap();

        // 08:00 Monday: today's 07:00 is gone; next week's instance rings at
        // the overridden 07:30.
        let next = next_occurrence(&store, monday(8, 0, 0)).unwrap();
        assert_eq!(next.time.to_string(), "07:30");
        assert_eq!(next.original_time.to_string(), "07:00");
        assert_eq!(next.target_date, next_monday);
        assert!(next.has_override);
        assert_eq!(next.minutes_until, 7 * 24 * 60 + (7 * 60 + 30) - 8 * 60);
    }

    #[test]
    fn next_occurrence_exact_minute_counts_as_passed() {
        let (store, _id) = store_with_alarm("07:00", vec![DayOfWeek::Monday], true);
        let next = next_occurrence(&store, monday(7, 0, 0)).unwrap();
        // Advanced a week rather than "in 0 minutes".
        assert_eq!(next.minutes_until, 7 * 24 * 60);
    }

    #[test]
    fn next_occurrence_skips_skip_overrides() {
        let (mut store, id) = store_with_alarm("07:00", vec![DayOfWeek::Monday], true);
        store
            .create_override(
                &id,
                NaiveDate::from_ymd_opt(2026, 8, 3).unwrap(),
                None,
                None,
                true,
            )
            .unwrap();
        // The only candidate date is skipped and the alarm has no other day.
        assert!(next_occurrence(&store, monday(6, 0, 0)).is_none());
    }

    #[test]
    fn next_occurrence_ignores_disabled_alarms() {
        let (store, _id) = store_with_alarm("07:00", vec![DayOfWeek::Monday], false);
        assert!(next_occurrence(&store, monday(6, 0, 0)).is_none());
    }

    #[test]
    fn next_occurrence_empty_days_never_fires() {
        let (store, _id) = store_with_alarm("07:00", vec![], true);
        assert!(next_occurrence(&store, monday(6, 0, 0)).is_none());
    }

    #[test]
    fn next_occurrence_picks_earliest_across_alarms() {
        let mut store = ScheduleStore::open(Box::new(MemoryBackend));
        store.create_alarm(
            "09:00".parse().unwrap(),
            vec![DayOfWeek::Monday],
            "a.mp3".into(),
            true,
            String::new(),
        );
        let early = store.create_alarm(
            "07:15".parse().unwrap(),
            vec![DayOfWeek::Monday],
            "b.mp3".into(),
            true,
            String::new(),
        );
        let next = next_occurrence(&store, monday(6, 0, 0)).unwrap();
        assert_eq!(next.id, early.id);
        assert_eq!(next.minutes_until, 75);
    }

    #[test]
    fn next_occurrence_tie_falls_to_lowest_id() {
        let mut store = ScheduleStore::open(Box::new(MemoryBackend));
        let a = store.create_alarm(
            "07:00".parse().unwrap(),
            vec![DayOfWeek::Monday],
            "a.mp3".into(),
            true,
            String::new(),
        );
        let b = store.create_alarm(
            "07:00".parse().unwrap(),
            vec![DayOfWeek::Monday],
            "b.mp3".into(),
            true,
            String::new(),
        );
        let lowest = std::cmp::min(a.id.clone(), b.id.clone());
        let next = next_occurrence(&store, monday(6, 0, 0)).unwrap();
        assert_eq!(next.id, lowest);
    }

    #[test]
    fn matches_now_minute_window() {
        let (store, id) = store_with_alarm("07:00", vec![DayOfWeek::Monday], true);
        let alarm = store.alarm(&id).unwrap().clone();
        assert!(matches_now(&store, &alarm, monday(7, 0, 0)).matched);
        assert!(matches_now(&store, &alarm, monday(7, 0, 59)).matched);
        assert!(!matches_now(&store, &alarm, monday(7, 1, 0)).matched);
        assert!(!matches_now(&store, &alarm, monday(6, 59, 59)).matched);
    }

    #[test]
    fn matches_now_respects_enabled_day_and_skip() {
        let (mut store, id) = store_with_alarm("07:00", vec![DayOfWeek::Tuesday], true);
        let alarm = store.alarm(&id).unwrap().clone();
        // Monday is not a configured day.
        assert!(!matches_now(&store, &alarm, monday(7, 0, 0)).matched);

        store
            .update_alarm(
                &id,
                crate::alarm::AlarmPatch {
                    days: Some(vec![DayOfWeek::Monday]),
                    enabled: Some(false),
                    ..Default::default()
                },
            )
            .unwrap();
        let alarm = store.alarm(&id).unwrap().clone();
        assert!(!matches_now(&store, &alarm, monday(7, 0, 0)).matched);

        store
            .update_alarm(
                &id,
                crate::alarm::AlarmPatch {
                    enabled: Some(true),
                    ..Default::default()
                },
            )
            .unwrap();
        store
            .create_override(
                &id,
                NaiveDate::from_ymd_opt(2026, 8, 3).unwrap(),
                None,
                None,
                true,
            )
            .unwrap();
        let alarm = store.alarm(&id).unwrap().clone();
        assert!(!matches_now(&store, &alarm, monday(7, 0, 0)).matched);
    }

    #[test]
    fn matches_now_uses_override_time_and_reports_id() {
        let (mut store, id) = store_with_alarm("07:00", vec![DayOfWeek::Monday], true);
        let ov = store
            .create_override(
                &id,
                NaiveDate::from_ymd_opt(2026, 8, 3).unwrap(),
                Some("07:30".parse().unwrap()),
                None,
                false,
            )
            .unwrap();
        let alarm = store.alarm(&id).unwrap().clone();
        assert!(!matches_now(&store, &alarm, monday(7, 0, 0)).matched);
        let hit = matches_now(&store, &alarm, monday(7, 30, 10));
        assert!(hit.matched);
        assert_eq!(hit.override_id, Some(ov.id));
    }
}
