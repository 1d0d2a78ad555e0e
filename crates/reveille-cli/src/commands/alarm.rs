use clap::Subcommand;
use reveille_core::{alarm::parse_days, AlarmPatch, ClockTime, Config};

use super::{open_store, print_json};

#[derive(Subcommand)]
pub enum AlarmAction {
    /// Create a new alarm
    Add {
        /// Alarm time, 24-hour HH:MM
        time: String,
        /// Days of week (full or three-letter names)
        #[arg(required = true)]
        days: Vec<String>,
        /// Sound to play; defaults to the configured default sound
        #[arg(long)]
        sound: Option<String>,
        /// Human-readable label
        #[arg(long)]
        label: Option<String>,
        /// Create the alarm disabled
        #[arg(long)]
        disabled: bool,
    },
    /// List all alarms
    List,
    /// Show one alarm
    Show { id: String },
    /// Update fields on an alarm
    Set {
        id: String,
        #[arg(long)]
        time: Option<String>,
        /// Comma-separated day names
        #[arg(long, value_delimiter = ',')]
        days: Option<Vec<String>>,
        #[arg(long)]
        sound: Option<String>,
        #[arg(long)]
        label: Option<String>,
        #[arg(long)]
        enabled: Option<bool>,
    },
    /// Delete an alarm and every override attached to it
    Rm { id: String },
    /// Toggle an alarm's enabled state
    Toggle { id: String },
}

pub fn run(action: AlarmAction) -> Result<(), Box<dyn std::error::Error>> {
    let mut store = open_store()?;
    match action {
        AlarmAction::Add {
            time,
            days,
            sound,
            label,
            disabled,
        } => {
            let time: ClockTime = time.parse()?;
            let days = parse_days(&days)?;
            let sound = sound.unwrap_or_else(|| Config::load().default_sound);
            let alarm =
                store.create_alarm(time, days, sound, !disabled, label.unwrap_or_default());
            print_json(&alarm)?;
        }
        AlarmAction::List => {
            print_json(&store.alarms())?;
        }
        AlarmAction::Show { id } => match store.alarm(&id) {
            Some(alarm) => print_json(alarm)?,
            None => return Err(format!("Alarm not found: {id}").into()),
        },
        AlarmAction::Set {
            id,
            time,
            days,
            sound,
            label,
            enabled,
        } => {
            let patch = AlarmPatch {
                time: time.map(|t| t.parse()).transpose()?,
                days: days.map(parse_days).transpose()?,
                sound,
                enabled,
                label,
            };
            let alarm = store.update_alarm(&id, patch)?;
            print_json(&alarm)?;
        }
        AlarmAction::Rm { id } => {
            if !store.delete_alarm(&id) {
                return Err(format!("Alarm not found: {id}").into());
            }
            println!("deleted {id}");
        }
        AlarmAction::Toggle { id } => {
            let alarm = store.toggle_alarm(&id)?;
            print_json(&alarm)?;
        }
    }
    Ok(())
}
