//! # Reveille Core Library
//!
//! Core business logic for Reveille, a recurring-alarm clock with per-date
//! overrides. All operations are available through this library; the CLI
//! binary is a thin layer over it, and any other frontend (web, buttons)
//! would call the same surface.
//!
//! ## Architecture
//!
//! - **Schedule store**: alarm and override records behind a load-all/
//!   save-all [`StorageBackend`] (JSON files by default)
//! - **Occurrence resolver**: pure functions computing the effective
//!   time/sound for an alarm on a date and the globally next occurrence
//! - **Trigger engine**: a polled ringing/snooze/timeout state machine that
//!   drives the sound output and alarm indicator
//! - **Device seams**: [`Clock`], [`AudioOutput`], and [`Indicator`] traits
//!   with capability-negotiated constructors
//!
//! ## Key Components
//!
//! - [`AlarmEngine`]: trigger engine and the boundary API
//! - [`ScheduleStore`]: record ownership and persistence
//! - [`Config`]: application configuration management

pub mod alarm;
pub mod audio;
pub mod clock;
pub mod config;
pub mod engine;
pub mod error;
pub mod resolve;
pub mod store;

pub use alarm::{Alarm, AlarmPatch, ClockTime, DayOfWeek, Override, OverridePatch};
pub use audio::{
    default_audio, AudioOutput, CommandPlayer, Indicator, SilentAudio, SilentIndicator, SoundFile,
    SoundLibrary,
};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{data_dir, Config};
pub use engine::{AlarmEngine, RingingState, StatusReport};
pub use error::{ConfigError, CoreError, Result, StoreError, ValidationError};
pub use resolve::{EffectiveOccurrence, NextAlarm, TriggerMatch};
pub use store::{JsonBackend, MemoryBackend, ScheduleStore, StorageBackend};
