//! Trigger engine: the poll cycle and the ringing state machine.
//!
//! One mutex guards the schedule store and the ringing state together, and
//! every logical operation -- a poll decision, a snooze or dismiss, a CRUD
//! call from a frontend -- holds it for its whole duration. A poll tick can
//! therefore never observe a half-written alarm, and an external dismiss
//! never races a trigger decision. Nothing awaits I/O under the lock; store
//! writes are synchronous local-file saves.
//!
//! ## State machine
//!
//! ```text
//! Idle -> Ringing          (matches_now on a poll tick)
//! Ringing -> Idle          (dismiss, or ringing past timeout_minutes)
//! Ringing -> Snoozed       (snooze)
//! Snoozed -> Ringing       (snooze timer elapses; same alarm and override)
//! ```
//!
//! The ringing state is process-local and starts out Idle on every boot.

use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{Duration, NaiveDate, NaiveDateTime};
use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::alarm::{Alarm, AlarmPatch, ClockTime, DayOfWeek, Override, OverridePatch};
use crate::audio::{AudioOutput, Indicator};
use crate::clock::Clock;
use crate::config::Config;
use crate::error::Result;
use crate::resolve::{self, NextAlarm};
use crate::store::ScheduleStore;

/// Ringing state. Never persisted.
#[derive(Debug, Default)]
pub struct RingingState {
    pub ringing: bool,
    pub alarm_id: Option<String>,
    pub override_id: Option<String>,
    pub since: Option<NaiveDateTime>,
    pub snooze_until: Option<NaiveDateTime>,
}

/// Snapshot served to status queries.
#[derive(Debug, Clone, Serialize)]
pub struct StatusReport {
    pub time: String,
    pub date: NaiveDate,
    pub day: DayOfWeek,
    pub alarm_ringing: bool,
    pub next_alarm: Option<NextAlarm>,
}

struct EngineInner {
    store: ScheduleStore,
    ringing: RingingState,
}

struct PollTask {
    stop: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

struct EngineShared {
    inner: Mutex<EngineInner>,
    clock: Arc<dyn Clock>,
    audio: Arc<dyn AudioOutput>,
    indicator: Arc<dyn Indicator>,
    snooze_minutes: i64,
    check_interval_secs: u64,
    timeout_minutes: i64,
    poll: Mutex<Option<PollTask>>,
}

/// The alarm engine. Cheap to clone; clones share all state.
#[derive(Clone)]
pub struct AlarmEngine {
    shared: Arc<EngineShared>,
}

impl AlarmEngine {
    /// Build an engine around a loaded store. Stale overrides are cleaned up
    /// here, once, before the first poll.
    pub fn new(
        mut store: ScheduleStore,
        clock: Arc<dyn Clock>,
        audio: Arc<dyn AudioOutput>,
        indicator: Arc<dyn Indicator>,
        config: &Config,
    ) -> Self {
        store.cleanup_expired(clock.now().date());
        Self {
            shared: Arc::new(EngineShared {
                inner: Mutex::new(EngineInner {
                    store,
                    ringing: RingingState::default(),
                }),
                clock,
                audio,
                indicator,
                snooze_minutes: i64::from(config.snooze_minutes),
                check_interval_secs: config.check_interval_secs.max(1),
                timeout_minutes: i64::from(config.timeout_minutes),
                poll: Mutex::new(None),
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, EngineInner> {
        self.shared.inner.lock().unwrap_or_else(|p| p.into_inner())
    }

    // ── Poll cycle ───────────────────────────────────────────────────

    /// One poll decision. The background task calls this on its interval;
    /// tests drive it directly. Never panics and never propagates an error:
    /// store failures are logged where they happen and the next tick gets a
    /// fresh look.
    pub fn tick(&self) {
        let now = self.shared.clock.now();
        let mut inner = self.lock();

        // Snoozing: either the timer elapsed and the captured pair rings
        // again, or nothing else happens until it does.
        if let Some(until) = inner.ringing.snooze_until {
            if now >= until {
                inner.ringing.snooze_until = None;
                if let Some(alarm_id) = inner.ringing.alarm_id.clone() {
                    let override_id = inner.ringing.override_id.clone();
                    self.trigger(&mut inner, now, &alarm_id, override_id);
                }
            }
            return;
        }

        if inner.ringing.ringing {
            if let Some(since) = inner.ringing.since {
                if now - since >= Duration::minutes(self.shared.timeout_minutes) {
                    info!(
                        "alarm timed out after {} minutes, auto-dismissing",
                        self.shared.timeout_minutes
                    );
                    self.clear_ringing(&mut inner);
                    return;
                }
            }
            // Still ringing: nothing to evaluate this minute.
            return;
        }

        // Scan in ascending id order; the first match wins the tick.
        let mut hit: Option<(String, Option<String>)> = None;
        for id in inner.store.alarm_ids_sorted() {
            let Some(alarm) = inner.store.alarm(&id) else { continue };
            let m = resolve::matches_now(&inner.store, alarm, now);
            if m.matched {
                hit = Some((id, m.override_id));
                break;
            }
        }
        if let Some((alarm_id, override_id)) = hit {
            self.trigger(&mut inner, now, &alarm_id, override_id);
        }
    }

    /// Enter (or re-enter) Ringing for `(alarm_id, override_id)`. The pair
    /// was captured at match time; looking the records up again here means a
    /// deleted alarm simply no longer rings.
    fn trigger(
        &self,
        inner: &mut EngineInner,
        now: NaiveDateTime,
        alarm_id: &str,
        override_id: Option<String>,
    ) {
        let (sound, label) = {
            let Some(alarm) = inner.store.alarm(alarm_id) else {
                return;
            };
            let sound = override_id
                .as_deref()
                .and_then(|oid| inner.store.override_record(oid))
                .and_then(|o| o.override_sound.clone())
                .unwrap_or_else(|| alarm.sound.clone());
            (sound, alarm.label.clone())
        };

        let shown = if label.is_empty() { alarm_id } else { label.as_str() };
        info!("triggering alarm {alarm_id}: {shown}");
        inner.ringing.ringing = true;
        inner.ringing.alarm_id = Some(alarm_id.to_string());
        inner.ringing.override_id = override_id;
        inner.ringing.since = Some(now);
        self.shared.indicator.set_indicator(true);
        self.shared.audio.play(&sound, true);
    }

    /// Shared tail of dismiss and auto-timeout: consume the override that
    /// was attached to this instance, drop every ringing field, release the
    /// devices.
    fn clear_ringing(&self, inner: &mut EngineInner) {
        if let Some(override_id) = inner.ringing.override_id.take() {
            inner.store.delete_override(&override_id);
        }
        inner.ringing.ringing = false;
        inner.ringing.alarm_id = None;
        inner.ringing.since = None;
        inner.ringing.snooze_until = None;
        self.shared.audio.stop();
        self.shared.indicator.set_indicator(false);
    }

    // ── Control ──────────────────────────────────────────────────────

    /// Quiet the ringing alarm for `snooze_minutes`. The alarm and override
    /// ids stay captured so the elapse re-triggers the same instance. No-op
    /// when nothing is ringing.
    pub fn snooze(&self) {
        let mut inner = self.lock();
        if !inner.ringing.ringing {
            return;
        }
        let until = self.shared.clock.now() + Duration::minutes(self.shared.snooze_minutes);
        inner.ringing.snooze_until = Some(until);
        inner.ringing.ringing = false;
        self.shared.audio.stop();
        self.shared.indicator.set_indicator(false);
        info!("alarm snoozed until {}", until.format("%H:%M"));
    }

    /// Dismiss the ringing alarm, consuming its override. No-op when nothing
    /// is ringing (including during a snooze window).
    pub fn dismiss(&self) {
        let mut inner = self.lock();
        if !inner.ringing.ringing {
            return;
        }
        self.clear_ringing(&mut inner);
        info!("alarm dismissed");
    }

    pub fn is_ringing(&self) -> bool {
        self.lock().ringing.ringing
    }

    /// Id of the alarm currently ringing, if any.
    pub fn ringing_alarm_id(&self) -> Option<String> {
        let inner = self.lock();
        if inner.ringing.ringing {
            inner.ringing.alarm_id.clone()
        } else {
            None
        }
    }

    pub fn next_alarm_info(&self) -> Option<NextAlarm> {
        let now = self.shared.clock.now();
        let inner = self.lock();
        resolve::next_occurrence(&inner.store, now)
    }

    pub fn status(&self) -> StatusReport {
        let now = self.shared.clock.now();
        let inner = self.lock();
        StatusReport {
            time: now.format("%H:%M:%S").to_string(),
            date: now.date(),
            day: DayOfWeek::from(chrono::Datelike::weekday(&now.date())),
            alarm_ringing: inner.ringing.ringing,
            next_alarm: resolve::next_occurrence(&inner.store, now),
        }
    }

    // ── Schedule CRUD ────────────────────────────────────────────────
    // Thin passthroughs so frontends mutate the schedule under the same
    // lock the poll cycle takes.

    pub fn create_alarm(
        &self,
        time: ClockTime,
        days: Vec<DayOfWeek>,
        sound: String,
        enabled: bool,
        label: String,
    ) -> Alarm {
        self.lock().store.create_alarm(time, days, sound, enabled, label)
    }

    pub fn alarm(&self, id: &str) -> Option<Alarm> {
        self.lock().store.alarm(id).cloned()
    }

    pub fn alarms(&self) -> Vec<Alarm> {
        self.lock().store.alarms()
    }

    pub fn update_alarm(&self, id: &str, patch: AlarmPatch) -> Result<Alarm> {
        self.lock().store.update_alarm(id, patch)
    }

    pub fn delete_alarm(&self, id: &str) -> bool {
        self.lock().store.delete_alarm(id)
    }

    pub fn toggle_alarm(&self, id: &str) -> Result<Alarm> {
        self.lock().store.toggle_alarm(id)
    }

    pub fn create_override(
        &self,
        alarm_id: &str,
        target_date: NaiveDate,
        override_time: Option<ClockTime>,
        override_sound: Option<String>,
        skip: bool,
    ) -> Result<Override> {
        self.lock()
            .store
            .create_override(alarm_id, target_date, override_time, override_sound, skip)
    }

    pub fn override_record(&self, id: &str) -> Option<Override> {
        self.lock().store.override_record(id).cloned()
    }

    pub fn override_for(&self, alarm_id: &str, date: NaiveDate) -> Option<Override> {
        self.lock().store.override_for(alarm_id, date).cloned()
    }

    pub fn overrides(&self) -> Vec<Override> {
        self.lock().store.overrides()
    }

    pub fn update_override(&self, id: &str, patch: OverridePatch) -> Result<Override> {
        self.lock().store.update_override(id, patch)
    }

    pub fn delete_override(&self, id: &str) -> bool {
        self.lock().store.delete_override(id)
    }

    // ── Lifecycle ────────────────────────────────────────────────────

    /// Spawn the background poll task. No-op when already running. Must be
    /// called from within a tokio runtime.
    pub fn start(&self) {
        let mut poll = self.shared.poll.lock().unwrap_or_else(|p| p.into_inner());
        if poll.is_some() {
            return;
        }
        let (stop_tx, mut stop_rx) = watch::channel(false);
        let engine = self.clone();
        let period = std::time::Duration::from_secs(self.shared.check_interval_secs);
        let handle = tokio::spawn(async move {
            info!("alarm poll task started");
            let mut ticker = tokio::time::interval(period);
            loop {
                tokio::select! {
                    _ = stop_rx.changed() => break,
                    _ = ticker.tick() => engine.tick(),
                }
            }
            info!("alarm poll task stopped");
        });
        *poll = Some(PollTask {
            stop: stop_tx,
            handle,
        });
    }

    /// Stop the poll task and force-dismiss whatever is ringing, so the
    /// sound and indicator are released deterministically at shutdown.
    pub async fn stop(&self) {
        let task = self
            .shared
            .poll
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .take();
        if let Some(task) = task {
            let _ = task.stop.send(true);
            if let Err(e) = task.handle.await {
                error!("poll task did not shut down cleanly: {e}");
            }
        }
        self.dismiss();
    }
}
