use std::sync::Arc;

use reveille_core::{AlarmEngine, Config, SilentAudio, SilentIndicator, SystemClock};

use super::{open_store, print_json};

fn build_engine() -> Result<AlarmEngine, Box<dyn std::error::Error>> {
    let store = open_store()?;
    Ok(AlarmEngine::new(
        store,
        Arc::new(SystemClock),
        Arc::new(SilentAudio),
        Arc::new(SilentIndicator),
        &Config::load(),
    ))
}

/// Current time, date, ringing state, and the next occurrence. Ringing is
/// always false here: the state lives in the process running `run`.
pub fn run_status() -> Result<(), Box<dyn std::error::Error>> {
    let engine = build_engine()?;
    print_json(&engine.status())
}

pub fn run_next() -> Result<(), Box<dyn std::error::Error>> {
    let engine = build_engine()?;
    match engine.next_alarm_info() {
        Some(next) => print_json(&next),
        None => {
            println!("no upcoming alarm");
            Ok(())
        }
    }
}
