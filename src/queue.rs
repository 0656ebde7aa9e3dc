//! Ordered sound queue with a single playback consumer.
//!
//! Producers never block: `enqueue` is a `try_send` onto a bounded channel.
//! One consumer task pops requests in submission order and awaits each
//! playback to the end before taking the next, so at most one request is
//! audible at a time.
//!
//! Shutdown lets the in-flight request finish, then completes every request
//! still queued with [`PlayOutcome::Cancelled`]. Requests that arrive after
//! shutdown, or when the queue is full, are completed immediately with
//! `Cancelled` / `Dropped`. Every completion therefore runs exactly once.

use std::sync::{Mutex, PoisonError};

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::player::PlaybackEngine;
use crate::sound::{PlayOutcome, PlaybackRequest};

pub struct SoundQueue {
    tx: mpsc::Sender<PlaybackRequest>,
    stop: watch::Sender<bool>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl SoundQueue {
    /// Spawn the consumer task on the current tokio runtime.
    pub fn start(engine: PlaybackEngine, max_depth: usize) -> Self {
        let (tx, rx) = mpsc::channel(max_depth.max(1));
        let (stop, stop_rx) = watch::channel(false);
        let worker = tokio::spawn(run_consumer(engine, rx, stop_rx));

        info!("Sound queue started (max depth {})", max_depth.max(1));

        Self {
            tx,
            stop,
            worker: Mutex::new(Some(worker)),
        }
    }

    /// Append `request` to the tail.
    pub fn enqueue(&self, request: PlaybackRequest) {
        match self.tx.try_send(request) {
            Ok(()) => debug!("Queue add"),
            Err(mpsc::error::TrySendError::Full(request)) => {
                warn!("Sound queue full, dropping {request}");
                request.finish(PlayOutcome::Dropped);
            }
            Err(mpsc::error::TrySendError::Closed(request)) => {
                warn!("Sound queue shut down, cancelling {request}");
                request.finish(PlayOutcome::Cancelled);
            }
        }
    }

    /// Number of requests waiting behind the one playing.
    pub fn pending(&self) -> usize {
        self.tx.max_capacity() - self.tx.capacity()
    }

    /// Stop the consumer after the in-flight request and wait for it to exit.
    pub async fn shutdown(&self) {
        let _ = self.stop.send(true);
        let worker = self
            .worker
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        if let Some(worker) = worker {
            if let Err(e) = worker.await {
                warn!("Sound queue worker ended abnormally: {e}");
            }
        }
    }
}

async fn run_consumer(
    engine: PlaybackEngine,
    mut rx: mpsc::Receiver<PlaybackRequest>,
    mut stop: watch::Receiver<bool>,
) {
    loop {
        if *stop.borrow() {
            break;
        }

        let request = tokio::select! {
            biased;
            changed = stop.changed() => {
                if changed.is_err() {
                    break;
                }
                continue;
            }
            request = rx.recv() => match request {
                Some(request) => request,
                None => break,
            },
        };

        debug!("Queue play {request}");
        engine.play(request).await;
    }

    rx.close();
    let mut cancelled = 0;
    while let Ok(request) = rx.try_recv() {
        request.finish(PlayOutcome::Cancelled);
        cancelled += 1;
    }
    info!("Sound queue stopped ({cancelled} pending cancelled)");
}
