//! Alarm and override storage.
//!
//! [`ScheduleStore`] owns the in-memory record maps and writes through a
//! [`StorageBackend`] after every mutation. A failed save is logged and the
//! in-memory state stands; a failed load starts the affected collection
//! empty. The store itself is not synchronized -- the engine holds it behind
//! its single lock.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{Duration, NaiveDate};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::alarm::{Alarm, AlarmPatch, ClockTime, DayOfWeek, Override, OverridePatch};
use crate::error::{CoreError, Result, StoreError};

/// Load-all/save-all persistence for alarm and override records.
pub trait StorageBackend: Send {
    fn load_alarms(&self) -> Result<HashMap<String, Alarm>, StoreError>;
    fn save_alarms(&self, alarms: &HashMap<String, Alarm>) -> Result<(), StoreError>;
    fn load_overrides(&self) -> Result<HashMap<String, Override>, StoreError>;
    fn save_overrides(&self, overrides: &HashMap<String, Override>) -> Result<(), StoreError>;
}

/// JSON-file backend: `alarms.json` and `overrides.json` under one directory.
pub struct JsonBackend {
    alarms_path: PathBuf,
    overrides_path: PathBuf,
}

impl JsonBackend {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            alarms_path: dir.join("alarms.json"),
            overrides_path: dir.join("overrides.json"),
        }
    }

    fn load_map<T: serde::de::DeserializeOwned>(
        path: &Path,
    ) -> Result<HashMap<String, T>, StoreError> {
        if !path.exists() {
            return Ok(HashMap::new());
        }
        let raw = fs::read_to_string(path).map_err(|source| StoreError::ReadFailed {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&raw).map_err(|source| StoreError::ParseFailed {
            path: path.to_path_buf(),
            source,
        })
    }

    fn save_map<T: serde::Serialize>(
        path: &Path,
        records: &HashMap<String, T>,
    ) -> Result<(), StoreError> {
        let raw = serde_json::to_string_pretty(records)?;
        fs::write(path, raw).map_err(|source| StoreError::WriteFailed {
            path: path.to_path_buf(),
            source,
        })
    }
}

impl StorageBackend for JsonBackend {
    fn load_alarms(&self) -> Result<HashMap<String, Alarm>, StoreError> {
        Self::load_map(&self.alarms_path)
    }

    fn save_alarms(&self, alarms: &HashMap<String, Alarm>) -> Result<(), StoreError> {
        Self::save_map(&self.alarms_path, alarms)
    }

    fn load_overrides(&self) -> Result<HashMap<String, Override>, StoreError> {
        Self::load_map(&self.overrides_path)
    }

    fn save_overrides(&self, overrides: &HashMap<String, Override>) -> Result<(), StoreError> {
        Self::save_map(&self.overrides_path, overrides)
    }
}

/// Ephemeral backend for tests and storage-less runs.
#[derive(Default)]
pub struct MemoryBackend;

impl StorageBackend for MemoryBackend {
    fn load_alarms(&self) -> Result<HashMap<String, Alarm>, StoreError> {
        Ok(HashMap::new())
    }

    fn save_alarms(&self, _alarms: &HashMap<String, Alarm>) -> Result<(), StoreError> {
        Ok(())
    }

    fn load_overrides(&self) -> Result<HashMap<String, Override>, StoreError> {
        Ok(HashMap::new())
    }

    fn save_overrides(&self, _overrides: &HashMap<String, Override>) -> Result<(), StoreError> {
        Ok(())
    }
}

fn new_id() -> String {
    let mut id = Uuid::new_v4().simple().to_string();
    id.truncate(8);
    id
}

/// The schedule store: alarm and override maps plus their backend.
pub struct ScheduleStore {
    alarms: HashMap<String, Alarm>,
    overrides: HashMap<String, Override>,
    backend: Box<dyn StorageBackend>,
}

impl ScheduleStore {
    /// Load both collections from the backend. Load failures degrade to an
    /// empty collection so one corrupt file cannot take the schedule down.
    pub fn open(backend: Box<dyn StorageBackend>) -> Self {
        let alarms = match backend.load_alarms() {
            Ok(alarms) => {
                info!("loaded {} alarms", alarms.len());
                alarms
            }
            Err(e) => {
                error!("failed to load alarms: {e}");
                HashMap::new()
            }
        };
        let overrides = match backend.load_overrides() {
            Ok(overrides) => {
                info!("loaded {} overrides", overrides.len());
                overrides
            }
            Err(e) => {
                error!("failed to load overrides: {e}");
                HashMap::new()
            }
        };
        Self {
            alarms,
            overrides,
            backend,
        }
    }

    // ── Alarms ───────────────────────────────────────────────────────

    pub fn create_alarm(
        &mut self,
        time: ClockTime,
        days: Vec<DayOfWeek>,
        sound: String,
        enabled: bool,
        label: String,
    ) -> Alarm {
        let alarm = Alarm {
            id: new_id(),
            time,
            days,
            sound,
            enabled,
            label,
        };
        info!("created alarm {}: {} on {:?}", alarm.id, alarm.time, alarm.days);
        self.alarms.insert(alarm.id.clone(), alarm.clone());
        self.persist_alarms();
        alarm
    }

    pub fn alarm(&self, id: &str) -> Option<&Alarm> {
        self.alarms.get(id)
    }

    /// All alarms, in ascending id order.
    pub fn alarms(&self) -> Vec<Alarm> {
        let mut alarms: Vec<Alarm> = self.alarms.values().cloned().collect();
        alarms.sort_by(|a, b| a.id.cmp(&b.id));
        alarms
    }

    /// Alarm ids in ascending order. The resolver and engine iterate in this
    /// order, which makes same-minute ties fall to the lowest id.
    pub fn alarm_ids_sorted(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.alarms.keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn update_alarm(&mut self, id: &str, patch: AlarmPatch) -> Result<Alarm> {
        let alarm = self
            .alarms
            .get_mut(id)
            .ok_or_else(|| CoreError::AlarmNotFound(id.to_string()))?;
        if let Some(time) = patch.time {
            alarm.time = time;
        }
        if let Some(days) = patch.days {
            alarm.days = days;
        }
        if let Some(sound) = patch.sound {
            alarm.sound = sound;
        }
        if let Some(enabled) = patch.enabled {
            alarm.enabled = enabled;
        }
        if let Some(label) = patch.label {
            alarm.label = label;
        }
        let updated = alarm.clone();
        info!("updated alarm {id}");
        self.persist_alarms();
        Ok(updated)
    }

    /// Delete an alarm and every override that references it.
    pub fn delete_alarm(&mut self, id: &str) -> bool {
        if self.alarms.remove(id).is_none() {
            return false;
        }
        self.persist_alarms();
        self.delete_overrides_for_alarm(id);
        info!("deleted alarm {id}");
        true
    }

    pub fn toggle_alarm(&mut self, id: &str) -> Result<Alarm> {
        let alarm = self
            .alarms
            .get_mut(id)
            .ok_or_else(|| CoreError::AlarmNotFound(id.to_string()))?;
        alarm.enabled = !alarm.enabled;
        let updated = alarm.clone();
        info!("toggled alarm {id} to {}", updated.enabled);
        self.persist_alarms();
        Ok(updated)
    }

    // ── Overrides ────────────────────────────────────────────────────

    /// Create an override for one alarm instance. Rejects an unknown alarm
    /// and a second override for the same `(alarm, date)` pair. Empty time
    /// and sound strings have already been normalized to `None` at the
    /// boundary; an empty sound arriving here is normalized again so the
    /// stored record is unambiguous.
    pub fn create_override(
        &mut self,
        alarm_id: &str,
        target_date: NaiveDate,
        override_time: Option<ClockTime>,
        override_sound: Option<String>,
        skip: bool,
    ) -> Result<Override> {
        if !self.alarms.contains_key(alarm_id) {
            return Err(CoreError::AlarmNotFound(alarm_id.to_string()));
        }
        if self.override_for(alarm_id, target_date).is_some() {
            return Err(CoreError::DuplicateOverride {
                alarm_id: alarm_id.to_string(),
                target_date,
            });
        }
        let ov = Override {
            id: new_id(),
            alarm_id: alarm_id.to_string(),
            target_date,
            override_time,
            override_sound: override_sound.filter(|s| !s.is_empty()),
            skip,
        };
        info!("created override {} for alarm {alarm_id} on {target_date}", ov.id);
        self.overrides.insert(ov.id.clone(), ov.clone());
        self.persist_overrides();
        Ok(ov)
    }

    pub fn override_record(&self, id: &str) -> Option<&Override> {
        self.overrides.get(id)
    }

    /// The override for a specific alarm and date, if one exists.
    pub fn override_for(&self, alarm_id: &str, date: NaiveDate) -> Option<&Override> {
        self.overrides
            .values()
            .find(|o| o.alarm_id == alarm_id && o.target_date == date)
    }

    /// All overrides, in ascending id order.
    pub fn overrides(&self) -> Vec<Override> {
        let mut overrides: Vec<Override> = self.overrides.values().cloned().collect();
        overrides.sort_by(|a, b| a.id.cmp(&b.id));
        overrides
    }

    pub fn update_override(&mut self, id: &str, patch: OverridePatch) -> Result<Override> {
        let ov = self
            .overrides
            .get_mut(id)
            .ok_or_else(|| CoreError::OverrideNotFound(id.to_string()))?;
        if let Some(time) = patch.override_time {
            ov.override_time = time;
        }
        if let Some(sound) = patch.override_sound {
            ov.override_sound = sound.filter(|s| !s.is_empty());
        }
        if let Some(skip) = patch.skip {
            ov.skip = skip;
        }
        let updated = ov.clone();
        info!("updated override {id}");
        self.persist_overrides();
        Ok(updated)
    }

    pub fn delete_override(&mut self, id: &str) -> bool {
        if self.overrides.remove(id).is_none() {
            return false;
        }
        info!("deleted override {id}");
        self.persist_overrides();
        true
    }

    fn delete_overrides_for_alarm(&mut self, alarm_id: &str) {
        let doomed: Vec<String> = self
            .overrides
            .values()
            .filter(|o| o.alarm_id == alarm_id)
            .map(|o| o.id.clone())
            .collect();
        for id in &doomed {
            self.overrides.remove(id);
        }
        if !doomed.is_empty() {
            info!("deleted {} overrides for alarm {alarm_id}", doomed.len());
            self.persist_overrides();
        }
    }

    /// Drop overrides whose date is yesterday or older. Today's are kept;
    /// they are consumed by the trigger/dismiss path instead.
    pub fn cleanup_expired(&mut self, today: NaiveDate) {
        let yesterday = today - Duration::days(1);
        let expired: Vec<String> = self
            .overrides
            .values()
            .filter(|o| o.target_date <= yesterday)
            .map(|o| o.id.clone())
            .collect();
        for id in &expired {
            self.overrides.remove(id);
            info!("cleaned up expired override {id}");
        }
        if !expired.is_empty() {
            self.persist_overrides();
        }
    }

    // ── Persistence ──────────────────────────────────────────────────

    fn persist_alarms(&self) {
        if let Err(e) = self.backend.save_alarms(&self.alarms) {
            warn!("failed to save alarms, continuing in memory: {e}");
        }
    }

    fn persist_overrides(&self) {
        if let Err(e) = self.backend.save_overrides(&self.overrides) {
            warn!("failed to save overrides, continuing in memory: {e}");
        }
    }
}
