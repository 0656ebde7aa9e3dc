//! Error types for the chime pipeline.
//!
//! None of these are fatal once the service is running: a policy error
//! rejects one tick, a playback error skips one stroke, a speech error ends
//! one speech phase early.

use std::path::PathBuf;

/// Caller contract violations at the tick boundary.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum WatchError {
    #[error("day-seconds {0} outside [0, 86400)")]
    DayOutOfRange(i64),
}

/// Failures from the sound effect player.
#[derive(Debug, thiserror::Error)]
pub enum PlaybackError {
    #[error("no audio output device: {0}")]
    NoDevice(String),

    #[error("no clip found for '{resource}' in {}", .dir.display())]
    MissingClip { resource: &'static str, dir: PathBuf },

    #[error("failed to decode {}: {reason}", .path.display())]
    Decode { path: PathBuf, reason: String },
}

/// Failures from the speech synthesizer.
#[derive(Debug, thiserror::Error)]
pub enum SpeechError {
    #[error("speech is disabled")]
    Disabled,

    #[error("speech worker has stopped")]
    WorkerGone,

    #[error("failed to run {command}: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{command} exited with {status}: {stderr}")]
    Failed {
        command: String,
        status: std::process::ExitStatus,
        stderr: String,
    },
}
