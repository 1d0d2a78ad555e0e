use clap::Subcommand;
use reveille_core::{alarm::parse_date, ClockTime, OverridePatch};

use super::{open_store, print_json};

#[derive(Subcommand)]
pub enum OverrideAction {
    /// Create a one-time override for an alarm on a date
    Add {
        /// Alarm the override applies to
        alarm_id: String,
        /// Target date, YYYY-MM-DD
        date: String,
        /// Replacement time for that date, HH:MM
        #[arg(long)]
        time: Option<String>,
        /// Replacement sound for that date
        #[arg(long)]
        sound: Option<String>,
        /// Skip the occurrence entirely
        #[arg(long)]
        skip: bool,
    },
    /// List all overrides
    List,
    /// Show one override
    Show { id: String },
    /// Update fields on an override (empty string clears a field)
    Set {
        id: String,
        #[arg(long)]
        time: Option<String>,
        #[arg(long)]
        sound: Option<String>,
        #[arg(long)]
        skip: Option<bool>,
    },
    /// Delete an override, restoring the base schedule
    Rm { id: String },
}

pub fn run(action: OverrideAction) -> Result<(), Box<dyn std::error::Error>> {
    let mut store = open_store()?;
    match action {
        OverrideAction::Add {
            alarm_id,
            date,
            time,
            sound,
            skip,
        } => {
            let date = parse_date(&date)?;
            let time = ClockTime::parse_optional(time.as_deref())?;
            let ov = store.create_override(&alarm_id, date, time, sound, skip)?;
            print_json(&ov)?;
        }
        OverrideAction::List => {
            print_json(&store.overrides())?;
        }
        OverrideAction::Show { id } => match store.override_record(&id) {
            Some(ov) => print_json(ov)?,
            None => return Err(format!("Override not found: {id}").into()),
        },
        OverrideAction::Set {
            id,
            time,
            sound,
            skip,
        } => {
            let patch = OverridePatch {
                override_time: match time {
                    None => None,
                    Some(t) => Some(ClockTime::parse_optional(Some(&t))?),
                },
                override_sound: sound.map(Some),
                skip,
            };
            let ov = store.update_override(&id, patch)?;
            print_json(&ov)?;
        }
        OverrideAction::Rm { id } => {
            if !store.delete_override(&id) {
                return Err(format!("Override not found: {id}").into());
            }
            println!("deleted {id}");
        }
    }
    Ok(())
}
