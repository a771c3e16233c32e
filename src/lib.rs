pub mod accessibility;
pub mod detection;
pub mod errors;
pub mod geometry;
pub mod host_bridge;
pub mod input;
pub mod matching;
pub mod models;
pub mod selection;
pub mod settings;
pub mod stability;
mod utils;

#[cfg(test)]
mod testing;

use std::path::PathBuf;

pub use detection::{DetectionController, SessionState, SessionStatus};
pub use errors::{Capability, DetectionError};
pub use host_bridge::{HostBridge, Severity};
pub use models::{DetectionMode, DetectionQuery, SessionRequest};
pub use settings::{EngineSettings, SettingsStore};

/// Installs the process-wide logger (reads RUST_LOG). Repeated calls are
/// ignored.
pub fn init_logging() {
    let _ = env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .try_init();
}

/// Application root: persisted settings plus the detection controller built
/// from them.
pub struct NaviApp {
    settings: SettingsStore,
    detector: DetectionController,
}

impl NaviApp {
    pub fn new(host: HostBridge, settings_path: PathBuf) -> anyhow::Result<Self> {
        if let Some(dir) = settings_path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        let settings = SettingsStore::new(settings_path)?;
        let detector = DetectionController::new(host, settings.engine());
        log::info!("Navi starting up...");
        Ok(Self { settings, detector })
    }

    /// Handle to the shared controller; clones drive the same session.
    pub fn detector(&self) -> DetectionController {
        self.detector.clone()
    }

    pub fn settings(&self) -> &SettingsStore {
        &self.settings
    }
}
