//! Alert dispatcher: turns wakeup ticks into queued sounds.
//!
//! Each tick carries a release callback from the tick source, which holds
//! a wake resource until it fires. The dispatcher calls it exactly once per
//! tick: immediately when nothing sounds, otherwise from the queued
//! request's completion.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::alert::{AlertMode, AlertPolicy, Selection};
use crate::bells::DaySeconds;
use crate::errors::WatchError;
use crate::notifier::Notifier;
use crate::queue::SoundQueue;
use crate::sound::{PlayOutcome, PlaybackRequest, SoundEffect};

pub struct AlertDispatcher {
    policy: Arc<AlertPolicy>,
    queue: Arc<SoundQueue>,
    notifier: Notifier,
}

impl AlertDispatcher {
    pub fn new(policy: Arc<AlertPolicy>, queue: Arc<SoundQueue>, notifier: Notifier) -> Self {
        Self {
            policy,
            queue,
            notifier,
        }
    }

    pub fn policy(&self) -> &AlertPolicy {
        &self.policy
    }

    pub fn set_chime_enabled(&self, enabled: bool) {
        self.policy.set_chime_enabled(enabled);
        info!("Chimes {}", if enabled { "on" } else { "off" });
    }

    pub fn set_alert_mode(&self, mode: AlertMode) {
        self.policy.set_mode(mode);
        info!("Alert mode {mode}");
    }

    pub fn cycle_alert_mode(&self) -> AlertMode {
        let mode = self.policy.cycle_mode();
        info!("Alert mode {mode}");
        mode
    }

    pub fn toggle_chimes(&self) -> bool {
        let enabled = self.policy.toggle_chimes();
        info!("Chimes {}", if enabled { "on" } else { "off" });
        enabled
    }

    /// Handle one wakeup.
    ///
    /// `time_ms` is the wall-clock time of the wakeup, for logging only;
    /// `day_secs` must be in `[0, 86400)`. Out-of-range input is rejected,
    /// but `release` is still called.
    pub fn on_tick<F>(&self, time_ms: i64, day_secs: i64, release: F) -> Result<Selection, WatchError>
    where
        F: FnOnce() + Send + 'static,
    {
        let day = match DaySeconds::new(day_secs) {
            Ok(day) => day,
            Err(e) => {
                warn!("Rejected tick at {time_ms}: {e}");
                release();
                return Err(e);
            }
        };

        let selection = self.policy.decide(day);
        if selection == Selection::None {
            debug!("Tick {day}: quiet");
        } else {
            info!("Tick {day} = {selection}");
        }

        let request = match selection {
            Selection::Chime(bell) => {
                PlaybackRequest::effect(SoundEffect::DoubleBell, u32::from(bell.count()))
            }
            Selection::Repeat => PlaybackRequest::effect(SoundEffect::Ring, 1),
            Selection::None => {
                release();
                return Ok(selection);
            }
        };

        self.queue.enqueue(request.on_complete(move |outcome| {
            if outcome != PlayOutcome::Played {
                debug!("Tick {day} sound {outcome:?}");
            }
            release();
        }));

        Ok(selection)
    }

    /// Speak `text` after anything already queued. Not tied to the schedule.
    pub fn text_alert(&self, text: &str) {
        info!("Text alert: {text}");
        self.notifier.text_alert(text);
        self.queue.enqueue(PlaybackRequest::speech(text));
    }
}
