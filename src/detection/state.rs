use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::geometry::MappedTarget;
use crate::models::{DetectionMode, SessionRequest};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum SessionStatus {
    #[default]
    Idle,
    TextSearching,
    FieldTyping,
    SelectionMonitoring,
}

impl SessionStatus {
    pub fn for_mode(mode: DetectionMode) -> Self {
        match mode {
            DetectionMode::TextSearch => SessionStatus::TextSearching,
            DetectionMode::FieldTyping => SessionStatus::FieldTyping,
            DetectionMode::SelectionMonitor => SessionStatus::SelectionMonitoring,
        }
    }

    pub fn is_active(&self) -> bool {
        *self != SessionStatus::Idle
    }
}

/// Observable view of the current (or last finished) session.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionState {
    pub status: SessionStatus,
    pub session_id: Option<String>,
    pub request: Option<SessionRequest>,
    pub started_at: Option<DateTime<Utc>>,
    /// Poll cycles that ran to completion.
    pub cycles: u64,
    pub last_found: Option<MappedTarget>,
    pub action_fired: bool,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin_session(
        &mut self,
        session_id: String,
        request: SessionRequest,
        started_at: DateTime<Utc>,
    ) {
        *self = Self {
            status: SessionStatus::for_mode(request.mode),
            session_id: Some(session_id),
            request: Some(request),
            started_at: Some(started_at),
            cycles: 0,
            last_found: None,
            action_fired: false,
        };
    }

    /// Whether results from session `id` may still be applied.
    pub fn is_current(&self, id: &str) -> bool {
        self.status.is_active() && self.session_id.as_deref() == Some(id)
    }

    /// Auto-action done; keeps the record of what was found.
    pub fn finish(&mut self) {
        self.status = SessionStatus::Idle;
        self.action_fired = true;
    }

    pub fn cancel(&mut self) {
        *self = Self::default();
    }
}
