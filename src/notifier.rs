//! Desktop mirror for spoken text alerts, via notify-rust (D-Bus).

use notify_rust::{Notification, Timeout};
use tracing::{debug, warn};

const SUMMARY: &str = "Watch alert";

#[derive(Debug, Clone, Copy)]
pub struct Notifier {
    enabled: bool,
}

impl Notifier {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    /// Show `text` as a notification without blocking the caller.
    pub fn text_alert(&self, text: &str) {
        if !self.enabled {
            return;
        }

        debug!("Notification: {text}");
        let body = text.to_string();

        // D-Bus round trip; keep it off the caller's thread
        std::thread::spawn(move || {
            if let Err(e) = Notification::new()
                .summary(SUMMARY)
                .body(&body)
                .icon("dialog-warning")
                .timeout(Timeout::Milliseconds(10_000))
                .show()
            {
                warn!("Failed to show notification: {e}");
            }
        });
    }
}
