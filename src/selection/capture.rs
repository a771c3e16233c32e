use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use tokio::time::{sleep, Duration};

use crate::host_bridge::{ClipboardAccess, OverlaySink};
use crate::utils::logging::preview;

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_info};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClipboardTiming {
    /// Copy shortcut to re-reading the change token.
    pub copy_wait_ms: u64,
    /// Capture to restoring the user's clipboard.
    pub restore_delay_ms: u64,
    pub restore_clipboard: bool,
}

impl Default for ClipboardTiming {
    fn default() -> Self {
        Self {
            copy_wait_ms: 180,
            restore_delay_ms: 500,
            restore_clipboard: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClipboardSnapshot {
    pub content: Option<String>,
    pub change_token: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureOutcome {
    /// New selection, published to the overlay sink.
    Captured(String),
    /// The copy did not touch the clipboard; nothing is selected.
    NothingSelected,
    /// The clipboard changed but holds the same text as before or as the
    /// last capture.
    Unchanged,
    /// Another capture was still running; this trigger was dropped.
    Busy,
}

/// Captures whatever the user has selected by copying it and diffing the
/// clipboard, then puts the user's clipboard back.
pub struct SelectionCapture {
    clipboard: Arc<dyn ClipboardAccess>,
    overlay: Arc<dyn OverlaySink>,
    timing: ClipboardTiming,
    in_flight: AtomicBool,
    last_captured: Mutex<Option<String>>,
}

struct InFlightGuard<'a>(&'a AtomicBool);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl SelectionCapture {
    pub fn new(
        clipboard: Arc<dyn ClipboardAccess>,
        overlay: Arc<dyn OverlaySink>,
        timing: ClipboardTiming,
    ) -> Self {
        Self {
            clipboard,
            overlay,
            timing,
            in_flight: AtomicBool::new(false),
            last_captured: Mutex::new(None),
        }
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    pub fn last_captured(&self) -> Option<String> {
        self.last_captured
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }

    pub fn snapshot(&self) -> ClipboardSnapshot {
        ClipboardSnapshot {
            content: self.clipboard.read_text(),
            change_token: self.clipboard.change_token(),
        }
    }

    pub async fn capture(&self) -> CaptureOutcome {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            log_debug!("selection capture already in flight; dropping trigger");
            return CaptureOutcome::Busy;
        }
        let _guard = InFlightGuard(&self.in_flight);

        let prior = self.snapshot();
        self.clipboard.synthesize_copy_shortcut();
        pause(self.timing.copy_wait_ms).await;

        if self.clipboard.change_token() == prior.change_token {
            log_debug!("clipboard untouched after copy; no selection");
            return CaptureOutcome::NothingSelected;
        }

        let current = self.clipboard.read_text();
        let outcome = match current.as_deref() {
            Some(text)
                if !text.is_empty()
                    && Some(text) != prior.content.as_deref()
                    && !self.was_last_captured(text) =>
            {
                log_info!("captured selection: {}", preview(text, 100));
                self.remember(text);
                self.overlay.captured_text(text);
                CaptureOutcome::Captured(text.to_string())
            }
            _ => CaptureOutcome::Unchanged,
        };

        if self.timing.restore_clipboard {
            self.restore(&prior, current.as_deref()).await;
        }

        outcome
    }

    async fn restore(&self, prior: &ClipboardSnapshot, current: Option<&str>) {
        let Some(previous) = prior.content.as_deref() else {
            log_debug!("clipboard held no text before the copy; leaving it as is");
            return;
        };
        if current == Some(previous) {
            return;
        }
        pause(self.timing.restore_delay_ms).await;
        self.clipboard.write_text(previous);
        log_debug!("restored previous clipboard contents");
    }

    fn was_last_captured(&self, text: &str) -> bool {
        self.last_captured().as_deref() == Some(text)
    }

    fn remember(&self, text: &str) {
        match self.last_captured.lock() {
            Ok(mut guard) => *guard = Some(text.to_string()),
            Err(poisoned) => *poisoned.into_inner() = Some(text.to_string()),
        }
    }
}

async fn pause(ms: u64) {
    if ms > 0 {
        sleep(Duration::from_millis(ms)).await;
    }
}
