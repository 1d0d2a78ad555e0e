use clap::Subcommand;
use reveille_core::{data_dir, default_audio, Config, SoundLibrary};

use super::print_json;

#[derive(Subcommand)]
pub enum SoundsAction {
    /// List available alarm sounds
    List,
    /// Play a sound once
    Preview { name: String },
}

fn library() -> Result<SoundLibrary, Box<dyn std::error::Error>> {
    let config = Config::load();
    let dir = data_dir()?;
    Ok(SoundLibrary::new(config.sounds_path(&dir)))
}

pub fn run(action: SoundsAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        SoundsAction::List => {
            print_json(&library()?.available_sounds())?;
        }
        SoundsAction::Preview { name } => {
            let library = library()?;
            if library.find(&name).is_none() {
                return Err(format!("Sound not found: {name}").into());
            }
            default_audio(library).preview(&name);
        }
    }
    Ok(())
}
