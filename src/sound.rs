//! Sound effect table and playback requests.

use std::fmt;
use std::time::Duration;

/// The fixed set of clips the service can play.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SoundEffect {
    /// One stroke of the ship's bell.
    SingleBell,
    /// A pair of strokes, the normal unit when chiming.
    DoubleBell,
    /// Repeating alert.
    Ring,
    /// Attention buzzer.
    Buzzer,
    /// Major alarm.
    Emergency,
}

/// Clip and timing parameters for one effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EffectSpec {
    /// File stem of the clip, looked up under the sounds directory.
    pub resource: &'static str,
    /// Bell strokes one play of the clip accounts for.
    pub strokes: u32,
    /// Pause between consecutive plays.
    pub inter_delay: Duration,
    /// Pause after the final play.
    pub post_delay: Duration,
}

const fn effect(resource: &'static str, strokes: u32, inter_ms: u64, post_ms: u64) -> EffectSpec {
    EffectSpec {
        resource,
        strokes,
        inter_delay: Duration::from_millis(inter_ms),
        post_delay: Duration::from_millis(post_ms),
    }
}

impl SoundEffect {
    pub const ALL: [SoundEffect; 5] = [
        SoundEffect::SingleBell,
        SoundEffect::DoubleBell,
        SoundEffect::Ring,
        SoundEffect::Buzzer,
        SoundEffect::Emergency,
    ];

    pub const fn spec(self) -> EffectSpec {
        match self {
            Self::SingleBell => effect("bells_1", 1, 3_000, 3_000),
            Self::DoubleBell => effect("bells_2", 2, 3_000, 3_000),
            Self::Ring => effect("ring_ring", 1, 2_000, 0),
            Self::Buzzer => effect("alert_buzzer", 1, 2_000, 0),
            Self::Emergency => effect("defcon", 1, 2_000, 0),
        }
    }

    pub fn resource(self) -> &'static str {
        self.spec().resource
    }
}

impl fmt::Display for SoundEffect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.resource())
    }
}

/// How a request left the queue. Passed to its completion callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayOutcome {
    /// Fully played, every delay and speech wait included.
    Played,
    /// Rejected at enqueue because the queue was full.
    Dropped,
    /// Never played because the queue was shut down.
    Cancelled,
}

pub type Completion = Box<dyn FnOnce(PlayOutcome) + Send + 'static>;

/// One unit of work for the playback engine.
///
/// Holds an effect, spoken text, or both. The completion callback, if any,
/// runs exactly once: from the engine after playback, or from the queue when
/// the request is dropped or cancelled.
pub struct PlaybackRequest {
    effect: Option<(SoundEffect, u32)>,
    text: Option<String>,
    completion: Option<Completion>,
}

impl PlaybackRequest {
    /// Play `effect` for `count` strokes.
    pub fn effect(effect: SoundEffect, count: u32) -> Self {
        Self {
            effect: Some((effect, count.max(1))),
            text: None,
            completion: None,
        }
    }

    /// Speak `text` with no preceding effect.
    pub fn speech(text: impl Into<String>) -> Self {
        Self {
            effect: None,
            text: Some(text.into()),
            completion: None,
        }
    }

    /// Sound `effect` once, then speak `text`.
    pub fn announcement(effect: SoundEffect, text: impl Into<String>) -> Self {
        Self {
            effect: Some((effect, 1)),
            text: Some(text.into()),
            completion: None,
        }
    }

    pub fn on_complete(mut self, f: impl FnOnce(PlayOutcome) + Send + 'static) -> Self {
        self.completion = Some(Box::new(f));
        self
    }

    /// Split into the playable parts and the completion.
    pub(crate) fn into_parts(self) -> (Option<(SoundEffect, u32)>, Option<String>, Option<Completion>) {
        (self.effect, self.text, self.completion)
    }

    /// Consume without playing, reporting `outcome` to the completion.
    pub(crate) fn finish(self, outcome: PlayOutcome) {
        if let Some(done) = self.completion {
            done(outcome);
        }
    }
}

impl fmt::Display for PlaybackRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.effect, &self.text) {
            (Some((fx, n)), Some(text)) => write!(f, "{fx}x{n} + \"{text}\""),
            (Some((fx, n)), None) => write!(f, "{fx}x{n}"),
            (None, Some(text)) => write!(f, "\"{text}\""),
            (None, None) => write!(f, "<empty>"),
        }
    }
}

impl fmt::Debug for PlaybackRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlaybackRequest")
            .field("effect", &self.effect)
            .field("text", &self.text)
            .field("has_completion", &self.completion.is_some())
            .finish()
    }
}
