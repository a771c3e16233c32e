use serde::Serialize;
use thiserror::Error;

use crate::models::DetectionMode;

/// Host capabilities gated by an OS permission grant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Capability {
    ScreenCapture,
    Automation,
}

impl std::fmt::Display for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Capability::ScreenCapture => f.write_str("Screen Recording"),
            Capability::Automation => f.write_str("Accessibility"),
        }
    }
}

#[derive(Debug, Error)]
pub enum DetectionError {
    /// Not retried; the caller has to start again once the grant is in place.
    #[error("{0} permission required - grant it in System Settings > Privacy & Security, then start again")]
    PermissionRequired(Capability),

    #[error("Please enter text to search for")]
    EmptyQuery,

    #[error("Please enter a message to type")]
    EmptyTypeMessage,

    #[error("A {0} session is already active; stop it first")]
    SessionActive(DetectionMode),

    #[error("Screen capture failed: {0}")]
    CaptureFailed(String),

    #[error("Text recognition failed: {0}")]
    RecognitionFailed(String),

    /// The acquisition is still running; it keeps the in-flight slot.
    #[error("Scan timed out after {0}ms; retrying")]
    ScanTimedOut(u64),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl DetectionError {
    /// Errors that only cost the current poll cycle.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            DetectionError::CaptureFailed(_)
                | DetectionError::RecognitionFailed(_)
                | DetectionError::ScanTimedOut(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, DetectionError>;
