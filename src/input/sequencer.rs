use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::time::{sleep, Duration};

use crate::geometry::InjectionPoint;
use crate::host_bridge::{InputDriver, OverlaySink};

/// Delays between synthetic events. Each one covers a race with the target
/// application's own event handling; zero them only in tests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputTiming {
    /// Pointer move to button press.
    pub pointer_settle_ms: u64,
    /// Button press to release.
    pub press_release_ms: u64,
    /// Key down to key up for one character.
    pub key_event_gap_ms: u64,
    /// Between characters.
    pub inter_key_ms: u64,
    /// Focusing click to first keystroke.
    pub focus_settle_ms: u64,
}

impl Default for InputTiming {
    fn default() -> Self {
        Self {
            pointer_settle_ms: 300,
            press_release_ms: 100,
            key_event_gap_ms: 10,
            inter_key_ms: 30,
            focus_settle_ms: 1200,
        }
    }
}

impl InputTiming {
    #[cfg(test)]
    pub(crate) fn immediate() -> Self {
        Self {
            pointer_settle_ms: 0,
            press_release_ms: 0,
            key_event_gap_ms: 0,
            inter_key_ms: 0,
            focus_settle_ms: 0,
        }
    }
}

#[derive(Clone)]
pub struct InputSequencer {
    driver: Arc<dyn InputDriver>,
    overlay: Arc<dyn OverlaySink>,
    timing: InputTiming,
}

impl InputSequencer {
    pub fn new(
        driver: Arc<dyn InputDriver>,
        overlay: Arc<dyn OverlaySink>,
        timing: InputTiming,
    ) -> Self {
        Self {
            driver,
            overlay,
            timing,
        }
    }

    pub async fn click(&self, target: InjectionPoint) {
        let at = target.point();
        log::info!("clicking at ({:.0}, {:.0})", at.x, at.y);
        self.overlay.click_indicator(at);
        self.driver.move_cursor(at);
        pause(self.timing.pointer_settle_ms).await;
        self.driver.mouse_down(at);
        pause(self.timing.press_release_ms).await;
        self.driver.mouse_up(at);
    }

    /// Types `text` one character at a time. Returns the number of
    /// characters sent.
    pub async fn type_text(&self, text: &str) -> usize {
        let mut sent = 0;
        let mut units = [0u16; 2];
        for (i, ch) in text.chars().enumerate() {
            if i > 0 {
                pause(self.timing.inter_key_ms).await;
            }
            let encoded = ch.encode_utf16(&mut units);
            self.driver.key_down(encoded);
            pause(self.timing.key_event_gap_ms).await;
            self.driver.key_up(encoded);
            sent += 1;
        }
        log::info!("typed {sent} characters");
        sent
    }

    /// Click to focus, wait for the focus change to land, then type.
    pub async fn click_then_type(&self, target: InjectionPoint, text: &str) -> usize {
        self.click(target).await;
        pause(self.timing.focus_settle_ms).await;
        self.type_text(text).await
    }
}

async fn pause(ms: u64) {
    if ms > 0 {
        sleep(Duration::from_millis(ms)).await;
    }
}
