//! Playback engine: plays one request to completion.
//!
//! Effect phase: strike the clip the requested number of strokes with the
//! effect's pauses between and after. Speech phase: hand the text to the
//! synthesizer and wait (bounded) for its utterance-complete signal. Only the
//! queue's consumer task calls into this, so it holds no locks.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::oneshot;
use tracing::{debug, info, warn};

use crate::errors::{PlaybackError, SpeechError};
use crate::sound::{PlayOutcome, PlaybackRequest, SoundEffect};

/// Fire-and-forget clip player. Must not block for the clip's duration.
pub trait EffectPlayer: Send + Sync {
    fn play(&self, effect: SoundEffect) -> Result<(), PlaybackError>;
}

/// Queued speech synthesizer.
///
/// `speak` accepts text for playback after anything already submitted and
/// returns an [`Utterance`] that resolves when that text has been spoken.
pub trait SpeechSynth: Send + Sync {
    fn speak(&self, text: &str) -> Result<Utterance, SpeechError>;
}

/// Pending utterance-complete signal for one `speak` call.
#[derive(Debug)]
pub struct Utterance {
    done: oneshot::Receiver<()>,
}

/// Sending half held by the synthesizer; dropping it without calling
/// [`UtteranceDone::complete`] counts as an aborted utterance.
#[derive(Debug)]
pub struct UtteranceDone {
    tx: oneshot::Sender<()>,
}

impl UtteranceDone {
    pub fn complete(self) {
        let _ = self.tx.send(());
    }

    /// Resolves once nobody is waiting on the utterance any more, for
    /// example after the engine's wait timed out.
    pub async fn abandoned(&mut self) {
        self.tx.closed().await;
    }
}

/// How a speech phase ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpeechEnd {
    Completed,
    Aborted,
    TimedOut,
}

impl Utterance {
    /// A linked completion signal and utterance.
    pub fn channel() -> (UtteranceDone, Utterance) {
        let (tx, done) = oneshot::channel();
        (UtteranceDone { tx }, Utterance { done })
    }

    /// Wait for completion, giving up after `limit`.
    pub async fn wait(self, limit: Duration) -> SpeechEnd {
        match tokio::time::timeout(limit, self.done).await {
            Ok(Ok(())) => SpeechEnd::Completed,
            Ok(Err(_)) => SpeechEnd::Aborted,
            Err(_) => SpeechEnd::TimedOut,
        }
    }
}

pub struct PlaybackEngine {
    effects: Arc<dyn EffectPlayer>,
    speech: Arc<dyn SpeechSynth>,
    speech_timeout: Duration,
}

impl PlaybackEngine {
    pub fn new(
        effects: Arc<dyn EffectPlayer>,
        speech: Arc<dyn SpeechSynth>,
        speech_timeout: Duration,
    ) -> Self {
        Self {
            effects,
            speech,
            speech_timeout,
        }
    }

    /// Play `request` fully, then run its completion with `Played`.
    pub async fn play(&self, request: PlaybackRequest) {
        let t0 = Instant::now();
        let label = request.to_string();
        let (effect, text, completion) = request.into_parts();

        if let Some((fx, count)) = effect {
            self.play_effect(fx, count).await;
        }

        if let Some(text) = text {
            self.speak(&text).await;
        }

        info!("Played {label} in {:.1}s", t0.elapsed().as_secs_f64());

        if let Some(done) = completion {
            done(PlayOutcome::Played);
        }
    }

    /// Strike `count` strokes. A lone remaining stroke of a double bell is
    /// struck as a single bell, so 5 bells = 2 doubles + 1 single.
    async fn play_effect(&self, effect: SoundEffect, count: u32) {
        let mut remaining = count;
        let mut fx = effect;

        while remaining > 0 {
            if fx == SoundEffect::DoubleBell && remaining < 2 {
                fx = SoundEffect::SingleBell;
            }
            let spec = fx.spec();

            if let Err(e) = self.effects.play(fx) {
                warn!("Failed to play {fx}: {e}");
            }
            remaining = remaining.saturating_sub(spec.strokes);

            if remaining > 0 {
                tokio::time::sleep(spec.inter_delay).await;
            }
        }

        tokio::time::sleep(fx.spec().post_delay).await;
    }

    async fn speak(&self, text: &str) {
        if text.trim().is_empty() {
            debug!("Skipping empty speech text");
            return;
        }

        let utterance = match self.speech.speak(text) {
            Ok(u) => u,
            Err(e) => {
                warn!("Speech failed: {e}");
                return;
            }
        };

        match utterance.wait(self.speech_timeout).await {
            SpeechEnd::Completed => debug!("Utterance complete"),
            SpeechEnd::Aborted => warn!("Speech engine dropped the utterance"),
            SpeechEnd::TimedOut => warn!(
                "No utterance-complete after {}s, continuing",
                self.speech_timeout.as_secs()
            ),
        }
    }
}
