use clap::Subcommand;
use reveille_core::Config;

use super::print_json;

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Print the current configuration
    Show,
    /// Update configuration values
    Set {
        /// Snooze duration in minutes (1-30)
        #[arg(long)]
        snooze_minutes: Option<u32>,
        /// Seconds between trigger polls
        #[arg(long)]
        check_interval_secs: Option<u64>,
        /// Minutes before a ringing alarm auto-dismisses
        #[arg(long)]
        timeout_minutes: Option<u32>,
        /// Playback volume (0-100)
        #[arg(long)]
        volume: Option<u32>,
        /// Sound used when an alarm does not name one
        #[arg(long)]
        default_sound: Option<String>,
    },
}

pub fn run(action: ConfigAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        ConfigAction::Show => {
            print_json(&Config::load())?;
        }
        ConfigAction::Set {
            snooze_minutes,
            check_interval_secs,
            timeout_minutes,
            volume,
            default_sound,
        } => {
            let mut config = Config::load();
            if let Some(minutes) = snooze_minutes {
                config.set_snooze_minutes(minutes);
            }
            if let Some(secs) = check_interval_secs {
                config.check_interval_secs = secs.max(1);
            }
            if let Some(minutes) = timeout_minutes {
                config.timeout_minutes = minutes.max(1);
            }
            if let Some(volume) = volume {
                config.set_volume(volume);
            }
            if let Some(sound) = default_sound {
                config.default_sound = sound;
            }
            config.save()?;
            print_json(&config)?;
        }
    }
    Ok(())
}
