//! Sound output, the visual alarm indicator, and the on-disk sound library.
//!
//! The engine drives devices through the [`AudioOutput`] and [`Indicator`]
//! traits and never branches on what is behind them. Construction is where
//! capability negotiation happens: [`default_audio`] probes for a usable
//! player binary and falls back to the silent output when the host has none.

use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use serde::Serialize;
use tracing::{debug, error, info, warn};

/// Plays alarm sounds. `looped` playback continues until `stop`.
pub trait AudioOutput: Send + Sync {
    fn play(&self, sound: &str, looped: bool);
    fn stop(&self);

    /// Play a sound once, e.g. when the user is picking one.
    fn preview(&self, sound: &str) {
        self.play(sound, false);
    }
}

/// The "alarm active" lamp.
pub trait Indicator: Send + Sync {
    fn set_indicator(&self, on: bool);
}

/// No-op audio output for headless hosts and tests.
pub struct SilentAudio;

impl AudioOutput for SilentAudio {
    fn play(&self, sound: &str, looped: bool) {
        debug!("silent audio: play {sound} (loop={looped})");
    }

    fn stop(&self) {}
}

/// No-op indicator.
pub struct SilentIndicator;

impl Indicator for SilentIndicator {
    fn set_indicator(&self, on: bool) {
        debug!("alarm indicator: {}", if on { "on" } else { "off" });
    }
}

const SUPPORTED_EXTENSIONS: [&str; 4] = ["mp3", "wav", "ogg", "flac"];

/// An entry in the sound library.
#[derive(Debug, Clone, Serialize)]
pub struct SoundFile {
    pub name: String,
    pub path: PathBuf,
}

/// A directory of alarm sound files.
pub struct SoundLibrary {
    dir: PathBuf,
}

impl SoundLibrary {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        if let Err(e) = std::fs::create_dir_all(&dir) {
            warn!("could not create sounds directory {}: {e}", dir.display());
        }
        Self { dir }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Every supported audio file in the directory, sorted by name.
    pub fn available_sounds(&self) -> Vec<SoundFile> {
        let entries = match std::fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) => {
                warn!("could not read sounds directory {}: {e}", self.dir.display());
                return Vec::new();
            }
        };
        let mut sounds: Vec<SoundFile> = entries
            .flatten()
            .map(|e| e.path())
            .filter(|p| {
                p.extension()
                    .and_then(|ext| ext.to_str())
                    .map(|ext| {
                        SUPPORTED_EXTENSIONS
                            .iter()
                            .any(|s| ext.eq_ignore_ascii_case(s))
                    })
                    .unwrap_or(false)
            })
            .filter_map(|p| {
                let name = p.file_name()?.to_str()?.to_string();
                Some(SoundFile { name, path: p })
            })
            .collect();
        sounds.sort_by(|a, b| a.name.cmp(&b.name));
        sounds
    }

    /// Locate a sound by name: exact file name first, then name plus a
    /// supported extension, then the first available sound as a fallback.
    pub fn find(&self, name: &str) -> Option<PathBuf> {
        let exact = self.dir.join(name);
        if exact.is_file() {
            return Some(exact);
        }
        for ext in SUPPORTED_EXTENSIONS {
            let candidate = self.dir.join(format!("{name}.{ext}"));
            if candidate.is_file() {
                return Some(candidate);
            }
        }
        self.available_sounds().into_iter().next().map(|s| s.path)
    }
}

// Player binaries to probe, in order of preference.
const PLAYERS: &[&[&str]] = &[
    &["mpg123", "-q"],
    &["aplay"],
    &["paplay"],
    &["ffplay", "-nodisp", "-autoexit", "-loglevel", "quiet"],
    &["cvlc", "--play-and-exit", "--no-video"],
];

fn binary_exists(bin: &str) -> bool {
    Command::new("which")
        .arg(bin)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

struct PlayerState {
    playing: AtomicBool,
    child: Mutex<Option<Child>>,
}

/// Audio output that shells out to an external player.
///
/// Looped playback respawns the child until stopped, since not every player
/// can loop on its own.
pub struct CommandPlayer {
    library: SoundLibrary,
    player_cmd: Vec<String>,
    state: Arc<PlayerState>,
}

impl CommandPlayer {
    /// Probe for a usable player binary. `None` when the host has no player,
    /// so the caller can fall back to [`SilentAudio`].
    pub fn detect(library: SoundLibrary) -> Option<Self> {
        for cmd in PLAYERS {
            if binary_exists(cmd[0]) {
                info!("using audio player: {}", cmd[0]);
                return Some(Self {
                    library,
                    player_cmd: cmd.iter().map(|s| s.to_string()).collect(),
                    state: Arc::new(PlayerState {
                        playing: AtomicBool::new(false),
                        child: Mutex::new(None),
                    }),
                });
            }
        }
        warn!("no audio player found; install mpg123, aplay, or ffplay");
        None
    }

    /// Best-effort system volume via amixer; 0..=100.
    pub fn set_volume(&self, volume: u32) {
        let volume = volume.min(100);
        match Command::new("amixer")
            .args(["sset", "Master", &format!("{volume}%")])
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
        {
            Ok(_) => info!("volume set to {volume}%"),
            Err(e) => debug!("could not set system volume: {e}"),
        }
    }
}

fn lock_child(state: &PlayerState) -> std::sync::MutexGuard<'_, Option<Child>> {
    state.child.lock().unwrap_or_else(|p| p.into_inner())
}

/// Spawn one playback child and park it in the shared state.
fn spawn_child(state: &PlayerState, cmd: &[String]) -> bool {
    match Command::new(&cmd[0])
        .args(&cmd[1..])
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
    {
        Ok(child) => {
            *lock_child(state) = Some(child);
            true
        }
        Err(e) => {
            error!("failed to start audio playback: {e}");
            state.playing.store(false, Ordering::SeqCst);
            false
        }
    }
}

/// Run one playback to completion. Returns true when it finished naturally
/// and the loop should spawn the next round.
fn run_once(state: &PlayerState, cmd: &[String]) -> bool {
    if !spawn_child(state, cmd) {
        return false;
    }
    loop {
        if !state.playing.load(Ordering::SeqCst) {
            return false;
        }
        {
            let mut guard = lock_child(state);
            match guard.as_mut() {
                None => return false, // stop() got here first
                Some(child) => match child.try_wait() {
                    Ok(Some(_)) => {
                        *guard = None;
                        return true;
                    }
                    Ok(None) => {}
                    Err(e) => {
                        error!("error in playback loop: {e}");
                        *guard = None;
                        return false;
                    }
                },
            }
        }
        std::thread::sleep(std::time::Duration::from_millis(100));
    }
}

impl AudioOutput for CommandPlayer {
    fn play(&self, sound: &str, looped: bool) {
        self.stop();

        let Some(path) = self.library.find(sound) else {
            error!("sound not found: {sound}");
            return;
        };
        let mut cmd = self.player_cmd.clone();
        cmd.push(path.to_string_lossy().into_owned());

        self.state.playing.store(true, Ordering::SeqCst);
        if looped {
            let state = Arc::clone(&self.state);
            std::thread::spawn(move || {
                while state.playing.load(Ordering::SeqCst) {
                    if !run_once(&state, &cmd) {
                        break;
                    }
                }
                state.playing.store(false, Ordering::SeqCst);
            });
        } else {
            spawn_child(&self.state, &cmd);
        }
        info!(
            "playing{}: {}",
            if looped { " (loop)" } else { "" },
            path.display()
        );
    }

    fn stop(&self) {
        self.state.playing.store(false, Ordering::SeqCst);
        if let Some(mut child) = lock_child(&self.state).take() {
            let _ = child.kill();
            let _ = child.wait();
        }
        debug!("audio stopped");
    }
}

/// Capability negotiation for sound output: a real player when the host has
/// one, the silent output otherwise.
pub fn default_audio(library: SoundLibrary) -> Arc<dyn AudioOutput> {
    match CommandPlayer::detect(library) {
        Some(player) => Arc::new(player),
        None => Arc::new(SilentAudio),
    }
}
