//! Clip playback through rodio.
//!
//! Clips are read into memory once at startup and decoded per play, each on
//! its own detached sink so `play` returns immediately.

use std::collections::HashMap;
use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use rodio::{Decoder, OutputStream, OutputStreamBuilder, Sink};
use tracing::{debug, info, warn};

use crate::config::SoundsConfig;
use crate::errors::PlaybackError;
use crate::player::EffectPlayer;
use crate::sound::SoundEffect;

const CLIP_EXTENSIONS: [&str; 4] = ["ogg", "wav", "mp3", "flac"];

struct Clip {
    path: PathBuf,
    bytes: Arc<[u8]>,
}

pub struct RodioEffectPlayer {
    // Kept alive for the process lifetime; dropping it silences every sink.
    stream: OutputStream,
    clips: HashMap<SoundEffect, Clip>,
    dir: PathBuf,
    volume: f32,
}

impl RodioEffectPlayer {
    /// Open the default output device and load every clip found under the
    /// configured directory. Missing clips are logged, not fatal.
    pub fn open(config: &SoundsConfig) -> Result<Self, PlaybackError> {
        let mut stream = OutputStreamBuilder::open_default_stream()
            .map_err(|e| PlaybackError::NoDevice(e.to_string()))?;
        stream.log_on_drop(false);

        let dir = config.resolved_dir();
        let clips = load_clips(&dir);
        info!(
            "Loaded {}/{} sound clips from {}",
            clips.len(),
            SoundEffect::ALL.len(),
            dir.display()
        );

        Ok(Self {
            stream,
            clips,
            dir,
            volume: config.volume,
        })
    }
}

impl EffectPlayer for RodioEffectPlayer {
    fn play(&self, effect: SoundEffect) -> Result<(), PlaybackError> {
        let clip = self.clips.get(&effect).ok_or_else(|| PlaybackError::MissingClip {
            resource: effect.resource(),
            dir: self.dir.clone(),
        })?;

        let source = Decoder::new(Cursor::new(clip.bytes.clone())).map_err(|e| {
            PlaybackError::Decode {
                path: clip.path.clone(),
                reason: e.to_string(),
            }
        })?;

        let sink = Sink::connect_new(self.stream.mixer());
        sink.set_volume(self.volume);
        sink.append(source);
        sink.detach();

        debug!("Sound {effect}");
        Ok(())
    }
}

fn find_clip(dir: &Path, resource: &str) -> Option<PathBuf> {
    CLIP_EXTENSIONS
        .iter()
        .map(|ext| dir.join(format!("{resource}.{ext}")))
        .find(|p| p.is_file())
}

fn load_clips(dir: &Path) -> HashMap<SoundEffect, Clip> {
    let mut clips = HashMap::new();

    for effect in SoundEffect::ALL {
        let Some(path) = find_clip(dir, effect.resource()) else {
            warn!("No clip for {effect} in {}", dir.display());
            continue;
        };
        match fs::read(&path) {
            Ok(bytes) => {
                clips.insert(
                    effect,
                    Clip {
                        path,
                        bytes: bytes.into(),
                    },
                );
            }
            Err(e) => warn!("Failed to read {}: {e}", path.display()),
        }
    }

    clips
}

/// Stand-in used when no audio device is available: logs each stroke.
pub struct SilentEffectPlayer;

impl EffectPlayer for SilentEffectPlayer {
    fn play(&self, effect: SoundEffect) -> Result<(), PlaybackError> {
        info!("(silent) {effect}");
        Ok(())
    }
}
