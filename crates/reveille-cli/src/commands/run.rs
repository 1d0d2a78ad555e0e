use std::sync::Arc;

use reveille_core::{
    data_dir, default_audio, AlarmEngine, Config, SilentIndicator, SoundLibrary, SystemClock,
};
use tracing::info;

use super::open_store;

/// Run the alarm engine in the foreground until ctrl-c. Stopping forces a
/// dismiss, so nothing is left ringing on the way out.
pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load();
    let store = open_store()?;
    let library = SoundLibrary::new(config.sounds_path(&data_dir()?));
    let audio = default_audio(library);

    let engine = AlarmEngine::new(
        store,
        Arc::new(SystemClock),
        audio,
        Arc::new(SilentIndicator),
        &config,
    );

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(async {
        engine.start();
        match engine.next_alarm_info() {
            Some(next) => info!(
                "next alarm: {} on {} at {}",
                next.id, next.target_date, next.time
            ),
            None => info!("no upcoming alarm"),
        }
        tokio::signal::ctrl_c().await?;
        info!("shutting down");
        engine.stop().await;
        Ok::<(), std::io::Error>(())
    })?;
    Ok(())
}
