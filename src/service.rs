//! Service wiring and lifecycle.
//!
//! startup → ticking (signals adjust policy) → shutdown: stop ticker,
//! drain queue, speech worker exits with the engine.

use std::sync::Arc;

use chrono::Local;
use tokio::sync::watch;
use tracing::{info, warn};

use crate::alert::AlertPolicy;
use crate::config::Config;
use crate::dispatcher::AlertDispatcher;
use crate::effects::{RodioEffectPlayer, SilentEffectPlayer};
use crate::notifier::Notifier;
use crate::player::{EffectPlayer, PlaybackEngine, SpeechSynth};
use crate::queue::SoundQueue;
use crate::speech::{CommandSpeech, NoSpeech, SpeechCommand};
use crate::ticker::{run_ticker, WakeHold};

/// Runtime control requests from the operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    Shutdown,
    CycleAlertMode,
    ToggleChimes,
}

pub struct WatchService {
    config: Config,
    dispatcher: Arc<AlertDispatcher>,
    queue: Arc<SoundQueue>,
    hold: Arc<WakeHold>,
}

impl WatchService {
    /// Build the service with the system audio device and synthesizer.
    /// Either falls back to a silent stand-in when unavailable.
    pub fn new(config: Config) -> Self {
        let effects: Arc<dyn EffectPlayer> = match RodioEffectPlayer::open(&config.sounds) {
            Ok(player) => Arc::new(player),
            Err(e) => {
                warn!("Sound effects disabled: {e}");
                Arc::new(SilentEffectPlayer)
            }
        };

        let speech: Arc<dyn SpeechSynth> = if !config.speech.enabled {
            info!("Speech disabled by config");
            Arc::new(NoSpeech)
        } else if let Some(command) = SpeechCommand::resolve(&config.speech) {
            Arc::new(CommandSpeech::spawn(command))
        } else {
            warn!("No espeak-ng or espeak found, text alerts will be silent");
            Arc::new(NoSpeech)
        };

        Self::with_players(config, effects, speech)
    }

    /// Build the service around the given collaborators.
    pub fn with_players(
        config: Config,
        effects: Arc<dyn EffectPlayer>,
        speech: Arc<dyn SpeechSynth>,
    ) -> Self {
        let engine = PlaybackEngine::new(effects, speech, config.speech.timeout());
        let queue = Arc::new(SoundQueue::start(engine, config.queue.max_depth));
        let policy = Arc::new(AlertPolicy::new(
            config.watch.chimes,
            config.watch.alert_mode,
        ));
        let notifier = Notifier::new(config.feedback.notifications);
        let dispatcher = Arc::new(AlertDispatcher::new(policy, queue.clone(), notifier));

        Self {
            config,
            dispatcher,
            queue,
            hold: Arc::new(WakeHold::default()),
        }
    }

    pub fn dispatcher(&self) -> Arc<AlertDispatcher> {
        self.dispatcher.clone()
    }

    pub fn apply(&self, control: Control) {
        match control {
            Control::CycleAlertMode => {
                self.dispatcher.cycle_alert_mode();
            }
            Control::ToggleChimes => {
                self.dispatcher.toggle_chimes();
            }
            Control::Shutdown => {}
        }
    }

    pub async fn run(self) -> Result<(), Box<dyn std::error::Error>> {
        let mut controls = Controls::install()?;

        let (stop_tx, stop_rx) = watch::channel(false);
        let ticker = tokio::spawn(run_ticker(
            self.dispatcher.clone(),
            self.config.ticker.interval(),
            self.hold.clone(),
            stop_rx,
            Local::now,
        ));

        info!(
            "On watch: chimes {}, alert mode {}",
            if self.dispatcher.policy().chime_enabled() { "on" } else { "off" },
            self.dispatcher.policy().mode()
        );

        if let Some(greeting) = &self.config.speech.greeting {
            self.dispatcher.text_alert(greeting);
        }

        loop {
            match controls.next().await {
                Control::Shutdown => break,
                control => self.apply(control),
            }
        }

        info!("Shutting down");
        let _ = stop_tx.send(true);
        if let Err(e) = ticker.await {
            warn!("Ticker ended abnormally: {e}");
        }
        self.queue.shutdown().await;
        info!("Stopped ({} wake holds outstanding)", self.hold.outstanding());

        Ok(())
    }
}

/// Ctrl-C shuts down; on Unix, SIGUSR1 cycles the alert mode and SIGUSR2
/// toggles chimes.
struct Controls {
    #[cfg(unix)]
    usr1: tokio::signal::unix::Signal,
    #[cfg(unix)]
    usr2: tokio::signal::unix::Signal,
}

impl Controls {
    fn install() -> std::io::Result<Self> {
        #[cfg(unix)]
        {
            use tokio::signal::unix::{signal, SignalKind};
            Ok(Self {
                usr1: signal(SignalKind::user_defined1())?,
                usr2: signal(SignalKind::user_defined2())?,
            })
        }
        #[cfg(not(unix))]
        {
            Ok(Self {})
        }
    }

    #[cfg(unix)]
    async fn next(&mut self) -> Control {
        tokio::select! {
            result = tokio::signal::ctrl_c() => {
                if let Err(e) = result {
                    warn!("Ctrl-C handler failed: {e}");
                }
                Control::Shutdown
            }
            Some(()) = self.usr1.recv() => Control::CycleAlertMode,
            Some(()) = self.usr2.recv() => Control::ToggleChimes,
        }
    }

    #[cfg(not(unix))]
    async fn next(&mut self) -> Control {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Ctrl-C handler failed: {e}");
        }
        Control::Shutdown
    }
}
