use std::sync::Arc;

use anyhow::Context;
use chrono::Utc;
use tokio::{sync::Mutex, task::JoinHandle};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::errors::{Capability, DetectionError, Result};
use crate::host_bridge::{HostBridge, Severity};
use crate::models::{DetectionMode, SessionRequest};
use crate::selection::{CaptureOutcome, SelectionCapture};
use crate::settings::EngineSettings;

use super::loop_worker::detection_loop;
use super::session::DetectionSession;
use super::state::{SessionState, SessionStatus};

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::{log_error, log_info, log_warn};

struct SessionWorker {
    handle: JoinHandle<()>,
    cancel_token: CancellationToken,
}

/// Entry point for the presentation layer. Cheap to clone; all clones drive
/// the same session.
#[derive(Clone)]
pub struct DetectionController {
    state: Arc<Mutex<SessionState>>,
    host: HostBridge,
    settings: Arc<EngineSettings>,
    worker: Arc<Mutex<Option<SessionWorker>>>,
    selection: Arc<SelectionCapture>,
}

impl DetectionController {
    pub fn new(host: HostBridge, settings: EngineSettings) -> Self {
        let selection = SelectionCapture::new(
            host.clipboard.clone(),
            host.overlay.clone(),
            settings.clipboard.clone(),
        );
        Self {
            state: Arc::new(Mutex::new(SessionState::new())),
            host,
            settings: Arc::new(settings),
            worker: Arc::new(Mutex::new(None)),
            selection: Arc::new(selection),
        }
    }

    pub async fn snapshot(&self) -> SessionState {
        self.state.lock().await.clone()
    }

    /// Starts a session. Failures are also published on the status sink.
    pub async fn start(&self, request: SessionRequest) -> Result<SessionState> {
        match self.try_start(request).await {
            Ok(state) => Ok(state),
            Err(err) => {
                if matches!(err, DetectionError::Internal(_)) {
                    log_error!("start failed: {err:#}");
                } else {
                    log_warn!("start rejected: {err}");
                }
                self.host.report(&err.to_string(), Severity::Error);
                Err(err)
            }
        }
    }

    async fn try_start(&self, request: SessionRequest) -> Result<SessionState> {
        request.validate()?;

        // Held until the new worker is installed so two starts cannot race.
        let mut worker = self.worker.lock().await;
        {
            let state = self.state.lock().await;
            if state.status.is_active() {
                let active = state
                    .request
                    .as_ref()
                    .map(|r| r.mode)
                    .unwrap_or(request.mode);
                return Err(DetectionError::SessionActive(active));
            }
        }

        for capability in request.required_capabilities() {
            if !self.host.permissions.has(capability) {
                return Err(DetectionError::PermissionRequired(capability));
            }
        }

        // A session that finished on its own leaves its worker behind.
        if let Some(previous) = worker.take() {
            previous.cancel_token.cancel();
            previous
                .handle
                .await
                .context("previous detection loop failed to join")?;
        }

        let session_id = Uuid::new_v4().to_string();
        let started_at = Utc::now();
        let snapshot = {
            let mut state = self.state.lock().await;
            state.begin_session(session_id.clone(), request.clone(), started_at);
            state.clone()
        };

        self.host.overlay.clear();
        self.host
            .report(&start_message(&request, &self.settings), Severity::Info);

        if request.mode.polls() {
            let cancel_token = CancellationToken::new();
            let session = DetectionSession::new(
                session_id.clone(),
                request.clone(),
                &self.settings,
                self.host.clone(),
                self.state.clone(),
            );
            let handle = tokio::spawn(detection_loop(
                session,
                self.settings.poll_interval(),
                cancel_token.clone(),
            ));
            *worker = Some(SessionWorker {
                handle,
                cancel_token,
            });
        }

        log_info!(
            "session {session_id} started: mode={}, armed={}",
            request.mode,
            request.action_armed()
        );
        Ok(snapshot)
    }

    /// Stops the current session. Safe to call at any time; an in-flight scan
    /// or action is abandoned.
    pub async fn stop(&self) -> Result<()> {
        let mut worker = self.worker.lock().await;
        let taken = worker.take();
        if let Some(running) = &taken {
            running.cancel_token.cancel();
        }

        let was_active = {
            let mut state = self.state.lock().await;
            let active = state.status.is_active();
            if active {
                state.cancel();
            }
            active
        };

        self.host.overlay.clear();
        if was_active {
            self.host.report("Detection stopped", Severity::Info);
            log_info!("detection stopped");
        }

        if let Some(running) = taken {
            running
                .handle
                .await
                .context("detection loop task failed to join")?;
        }
        Ok(())
    }

    /// Copies the current selection right now, whatever the session state.
    pub async fn capture_selection(&self) -> Result<CaptureOutcome> {
        if !self.host.permissions.has(Capability::Automation) {
            let err = DetectionError::PermissionRequired(Capability::Automation);
            self.host.report(&err.to_string(), Severity::Error);
            return Err(err);
        }
        let outcome = self.selection.capture().await;
        log_info!("selection capture: {outcome:?}");
        Ok(outcome)
    }

    /// Pointer-up hook for the selection monitor. Returns the spawned capture
    /// when a monitoring session is active.
    pub async fn pointer_released(&self) -> Option<JoinHandle<CaptureOutcome>> {
        if self.state.lock().await.status != SessionStatus::SelectionMonitoring {
            return None;
        }
        let selection = self.selection.clone();
        Some(tokio::spawn(async move { selection.capture().await }))
    }
}

fn start_message(request: &SessionRequest, settings: &EngineSettings) -> String {
    let every = describe_interval(settings.poll_interval_ms);
    match (request.mode, &request.query) {
        (DetectionMode::TextSearch, Some(query)) => format!(
            "Detecting: \"{}\" ({every})\n{}",
            query.text,
            query.describe_mode()
        ),
        (DetectionMode::FieldTyping, _) => format!("Looking for an input field ({every})"),
        (DetectionMode::SelectionMonitor, _) => "Monitoring text selection".to_string(),
        (DetectionMode::TextSearch, None) => format!("Detecting ({every})"),
    }
}

fn describe_interval(ms: u64) -> String {
    match ms {
        1000 => "every 1 second".to_string(),
        ms if ms % 1000 == 0 => format!("every {} seconds", ms / 1000),
        ms => format!("every {:.1} seconds", ms as f64 / 1000.0),
    }
}
