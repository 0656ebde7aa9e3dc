//! Configuration management for watchbell.
//!
//! Loads config from a YAML file in standard locations. Every section has
//! defaults, so an empty or missing file gives a working service.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

use crate::alert::AlertMode;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WatchConfig {
    pub chimes: bool,
    pub alert_mode: AlertMode,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            chimes: true,
            alert_mode: AlertMode::Off,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SoundsConfig {
    /// Clip directory; empty means `<data dir>/watchbell/sounds`.
    pub dir: String,
    pub volume: f32,
}

impl Default for SoundsConfig {
    fn default() -> Self {
        Self {
            dir: String::new(),
            volume: 1.0,
        }
    }
}

impl SoundsConfig {
    pub fn resolved_dir(&self) -> PathBuf {
        if self.dir.is_empty() {
            return dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("watchbell/sounds");
        }
        match (self.dir.strip_prefix("~/"), dirs::home_dir()) {
            (Some(rest), Some(home)) => home.join(rest),
            _ => PathBuf::from(&self.dir),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SpeechConfig {
    pub enabled: bool,
    /// Synthesizer program; empty means detect espeak-ng, then espeak.
    pub command: String,
    pub voice: String,
    pub rate_wpm: u32,
    pub timeout_secs: u64,
    /// Spoken once at startup when set.
    pub greeting: Option<String>,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            command: String::new(),
            voice: "en-us".into(),
            rate_wpm: 140,
            timeout_secs: 30,
            greeting: None,
        }
    }
}

impl SpeechConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct QueueConfig {
    pub max_depth: usize,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self { max_depth: 16 }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TickerConfig {
    pub interval_secs: u32,
}

impl Default for TickerConfig {
    fn default() -> Self {
        Self { interval_secs: 60 }
    }
}

impl TickerConfig {
    /// Tick spacing in seconds. Must divide a minute, or alert boundaries
    /// would be skipped; anything else falls back to 60.
    pub fn interval(&self) -> u32 {
        match self.interval_secs {
            n if n > 0 && 60 % n == 0 => n,
            n => {
                warn!("ticker.interval_secs {n} does not divide 60, using 60");
                60
            }
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FeedbackConfig {
    pub notifications: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub watch: WatchConfig,
    pub sounds: SoundsConfig,
    pub speech: SpeechConfig,
    pub queue: QueueConfig,
    pub ticker: TickerConfig,
    pub feedback: FeedbackConfig,
}

impl Config {
    /// Load configuration from YAML file.
    ///
    /// Searches standard locations if no path is provided:
    /// 1. ./watchbell.yaml
    /// 2. ~/.config/watchbell/config.yaml
    /// 3. /etc/watchbell/config.yaml
    pub fn load(path: Option<&Path>) -> Self {
        let resolved = path.map(PathBuf::from).or_else(|| {
            let candidates = [
                std::env::current_dir().ok().map(|d| d.join("watchbell.yaml")),
                dirs::config_dir().map(|c| c.join("watchbell/config.yaml")),
                Some(PathBuf::from("/etc/watchbell/config.yaml")),
            ];
            candidates.into_iter().flatten().find(|p| p.exists())
        });

        let Some(config_path) = resolved else {
            info!("No config file found, using defaults");
            return Self::default();
        };

        match std::fs::read_to_string(&config_path) {
            Ok(contents) => match Self::parse(&contents) {
                Ok(config) => {
                    info!("Loaded config from {}", config_path.display());
                    config
                }
                Err(e) => {
                    warn!("Failed to parse {}: {e}, using defaults", config_path.display());
                    Self::default()
                }
            },
            Err(e) => {
                warn!("Failed to read {}: {e}, using defaults", config_path.display());
                Self::default()
            }
        }
    }

    pub fn parse(contents: &str) -> Result<Self, serde_yml::Error> {
        if contents.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yml::from_str(contents)
    }
}
