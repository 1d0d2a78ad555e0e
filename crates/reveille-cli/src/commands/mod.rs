pub mod alarm;
pub mod config;
pub mod override_cmd;
pub mod run;
pub mod sounds;
pub mod status;

use std::error::Error;

use reveille_core::{data_dir, JsonBackend, ScheduleStore};

/// Open the schedule store over the JSON backend in the data directory.
pub(crate) fn open_store() -> Result<ScheduleStore, Box<dyn Error>> {
    let dir = data_dir()?;
    Ok(ScheduleStore::open(Box::new(JsonBackend::new(dir))))
}

/// Print a value as pretty JSON on stdout.
pub(crate) fn print_json<T: serde::Serialize>(value: &T) -> Result<(), Box<dyn Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
