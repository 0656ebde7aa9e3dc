//! Speech through the espeak-ng / espeak command line synthesizer.
//!
//! Utterances are spoken one at a time, in submission order, by a worker
//! task; each `speak` call gets an [`Utterance`] that resolves when its
//! process exits. The worker stops once the synthesizer is dropped.

use std::process::Stdio;

use tokio::io::AsyncWriteExt;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::config::SpeechConfig;
use crate::errors::SpeechError;
use crate::player::{SpeechSynth, Utterance, UtteranceDone};

struct Job {
    text: String,
    done: UtteranceDone,
}

/// How to run the synthesizer for one utterance.
#[derive(Debug, Clone)]
pub struct SpeechCommand {
    pub program: String,
    pub voice: String,
    pub rate_wpm: u32,
}

impl SpeechCommand {
    /// Use the configured command, or detect espeak-ng, then espeak.
    pub fn resolve(config: &SpeechConfig) -> Option<Self> {
        let program = if config.command.is_empty() {
            ["espeak-ng", "espeak"]
                .into_iter()
                .find(|bin| which::which(bin).is_ok())?
                .to_string()
        } else {
            config.command.clone()
        };

        Some(Self {
            program,
            voice: config.voice.clone(),
            rate_wpm: config.rate_wpm,
        })
    }

    async fn say(&self, text: &str) -> Result<(), SpeechError> {
        let mut cmd = tokio::process::Command::new(&self.program);
        cmd.arg("-v")
            .arg(&self.voice)
            .arg("-s")
            .arg(self.rate_wpm.to_string())
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = cmd.spawn().map_err(|source| SpeechError::Spawn {
            command: self.program.clone(),
            source,
        })?;

        if let Some(mut stdin) = child.stdin.take() {
            match stdin.write_all(text.as_bytes()).await {
                Ok(()) => {}
                // program exited without reading; its exit status decides
                Err(e) if e.kind() == std::io::ErrorKind::BrokenPipe => {}
                Err(source) => {
                    return Err(SpeechError::Spawn {
                        command: self.program.clone(),
                        source,
                    })
                }
            }
            // EOF tells the synthesizer the text is complete
            drop(stdin);
        }

        let output = child
            .wait_with_output()
            .await
            .map_err(|source| SpeechError::Spawn {
                command: self.program.clone(),
                source,
            })?;

        if output.status.success() {
            Ok(())
        } else {
            Err(SpeechError::Failed {
                command: self.program.clone(),
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            })
        }
    }
}

pub struct CommandSpeech {
    tx: mpsc::UnboundedSender<Job>,
}

impl CommandSpeech {
    /// Start the utterance worker on the current tokio runtime.
    pub fn spawn(command: SpeechCommand) -> Self {
        info!(
            "Speech via {} (voice {}, {} wpm)",
            command.program, command.voice, command.rate_wpm
        );
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(run_worker(command, rx));
        Self { tx }
    }
}

impl SpeechSynth for CommandSpeech {
    fn speak(&self, text: &str) -> Result<Utterance, SpeechError> {
        let (done, utterance) = Utterance::channel();
        self.tx
            .send(Job {
                text: text.to_string(),
                done,
            })
            .map_err(|_| SpeechError::WorkerGone)?;
        Ok(utterance)
    }
}

async fn run_worker(command: SpeechCommand, mut rx: mpsc::UnboundedReceiver<Job>) {
    while let Some(Job { text, mut done }) = rx.recv().await {
        debug!("Speaking {} chars", text.len());

        // an abandoned utterance drops `say`, which kills the child
        let result = tokio::select! {
            result = command.say(&text) => result,
            _ = done.abandoned() => {
                warn!("Utterance abandoned, stopping {}", command.program);
                continue;
            }
        };

        match result {
            Ok(()) => done.complete(),
            // dropping `done` reports the utterance as aborted
            Err(e) => warn!("Speech failed: {e}"),
        }
    }
    debug!("Speech worker stopped");
}

/// Synthesizer used when speech is disabled or no command is available.
pub struct NoSpeech;

impl SpeechSynth for NoSpeech {
    fn speak(&self, _text: &str) -> Result<Utterance, SpeechError> {
        Err(SpeechError::Disabled)
    }
}
