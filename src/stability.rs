use serde::{Deserialize, Serialize};

use crate::geometry::ScreenRect;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StabilitySettings {
    /// Max per-axis movement, in display points, still counted as "same place".
    pub epsilon_px: f64,
    /// Consecutive sightings in the same place needed before an action
    /// fires. 2 means one full poll interval of stillness.
    pub threshold: u32,
}

impl Default for StabilitySettings {
    fn default() -> Self {
        Self {
            epsilon_px: 5.0,
            threshold: 2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StabilityState {
    pub last_rect: Option<ScreenRect>,
    /// Sightings at `last_rect` so far, the first one included.
    pub consecutive_stable_count: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Observation {
    /// Target moved or was seen for the first time.
    Moved,
    /// Same place as last cycle; `count` of `threshold` sightings so far.
    Settling { count: u32, threshold: u32 },
    /// Threshold reached. State has already been reset.
    Fired,
}

/// Two-state debounce gating automated actions on a target that may still
/// be animating into place.
///
/// Only the immediately preceding observation matters; there is no window.
#[derive(Debug, Clone)]
pub struct StabilityDebouncer {
    settings: StabilitySettings,
    state: StabilityState,
}

impl StabilityDebouncer {
    pub fn new(settings: StabilitySettings) -> Self {
        Self {
            settings,
            state: StabilityState::default(),
        }
    }

    pub fn state(&self) -> StabilityState {
        self.state
    }

    pub fn reset(&mut self) {
        self.state = StabilityState::default();
    }

    pub fn observe(&mut self, rect: ScreenRect) -> Observation {
        let eps = self.settings.epsilon_px;
        let same_place = self
            .state
            .last_rect
            .map(|prev| (rect.x - prev.x).abs() < eps && (rect.y - prev.y).abs() < eps)
            .unwrap_or(false);

        if same_place {
            self.state.consecutive_stable_count += 1;
        } else {
            // A new position opens a run of one.
            self.state = StabilityState {
                last_rect: Some(rect),
                consecutive_stable_count: 1,
            };
        }

        if self.state.consecutive_stable_count >= self.settings.threshold {
            self.reset();
            return Observation::Fired;
        }

        if same_place {
            Observation::Settling {
                count: self.state.consecutive_stable_count,
                threshold: self.settings.threshold,
            }
        } else {
            Observation::Moved
        }
    }
}
