use std::sync::Arc;

use anyhow::anyhow;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{timeout, Duration};

use crate::accessibility::ElementLocator;
use crate::errors::DetectionError;
use crate::geometry::{CoordinateMapper, InjectionPoint, MappedTarget, ScreenSize};
use crate::host_bridge::{HostBridge, Severity};
use crate::input::InputSequencer;
use crate::matching::TextMatcher;
use crate::models::{DetectionMode, ElementHandle, FieldCandidate, RecognizedTextCandidate, SessionRequest};
use crate::settings::EngineSettings;
use crate::stability::{Observation, StabilityDebouncer};
use crate::utils::logging::preview;

use super::state::SessionState;

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_error, log_info, log_warn};

/// Raw result of one acquisition, produced off the loop on a blocking worker.
pub(crate) enum Acquisition {
    Text {
        screen: ScreenSize,
        candidates: Vec<RecognizedTextCandidate>,
    },
    Field {
        screen: ScreenSize,
        field: Option<FieldCandidate>,
    },
}

type AcquisitionTask = JoinHandle<Result<Acquisition, DetectionError>>;

/// Settled target plus what to do with it.
#[derive(Debug, Clone)]
pub(crate) struct PendingAction {
    pub label: String,
    pub click_point: InjectionPoint,
    pub focus: Option<ElementHandle>,
    pub type_message: Option<String>,
}

#[derive(Debug)]
pub(crate) enum CycleOutcome {
    /// Previous acquisition still outstanding; this tick did nothing.
    Skipped,
    NoCandidate,
    Tracking,
    /// Target settled. The cycle's status is published by `perform`.
    Fired(PendingAction),
    /// The session was stopped while the acquisition was running.
    Discarded,
}

struct Found {
    target: MappedTarget,
    element: Option<ElementHandle>,
    label: String,
}

/// Per-session detection engine. Owned by the loop task; nothing here is
/// shared except the observable `SessionState`.
pub(crate) struct DetectionSession {
    id: String,
    request: SessionRequest,
    matcher: Option<TextMatcher>,
    locator: ElementLocator,
    stability: StabilityDebouncer,
    cycle_timeout: Duration,
    host: HostBridge,
    sequencer: InputSequencer,
    state: Arc<Mutex<SessionState>>,
    in_flight: Option<AcquisitionTask>,
}

impl DetectionSession {
    pub(crate) fn new(
        id: String,
        request: SessionRequest,
        settings: &EngineSettings,
        host: HostBridge,
        state: Arc<Mutex<SessionState>>,
    ) -> Self {
        let sequencer = InputSequencer::new(
            host.input.clone(),
            host.overlay.clone(),
            settings.input.clone(),
        );
        Self {
            id,
            matcher: request.query.as_ref().map(TextMatcher::new),
            request,
            locator: ElementLocator::new(settings.accessibility.clone()),
            stability: StabilityDebouncer::new(settings.stability),
            cycle_timeout: settings.cycle_timeout(),
            host,
            sequencer,
            state,
            in_flight: None,
        }
    }

    pub(crate) fn id(&self) -> &str {
        &self.id
    }

    /// One poll: acquire, match, map, debounce, and publish exactly one
    /// overlay update and one status update. On `Fired` the status is
    /// deferred to `perform`.
    pub(crate) async fn run_cycle(&mut self) -> CycleOutcome {
        if let Some(pending) = &self.in_flight {
            if !pending.is_finished() {
                log_debug!("session {}: previous scan still pending, tick ignored", self.id);
                return CycleOutcome::Skipped;
            }
            log_debug!("session {}: discarding late scan result", self.id);
            self.in_flight = None;
        }

        let mut task = self.spawn_acquisition();
        let acquired = match timeout(self.cycle_timeout, &mut task).await {
            Ok(joined) => joined
                .map_err(|err| DetectionError::Internal(anyhow!("scan worker join failed: {err}")))
                .and_then(|result| result),
            Err(_) => {
                // Keep the task in the slot so no second request is issued.
                self.in_flight = Some(task);
                Err(DetectionError::ScanTimedOut(self.cycle_timeout.as_millis() as u64))
            }
        };

        let found = acquired.map(|acquisition| self.evaluate(acquisition));
        self.apply(found).await
    }

    fn spawn_acquisition(&self) -> AcquisitionTask {
        let host = self.host.clone();
        if self.request.mode == DetectionMode::FieldTyping {
            let locator = self.locator.clone();
            tokio::task::spawn_blocking(move || acquire_field(&host, &locator))
        } else {
            tokio::task::spawn_blocking(move || acquire_text(&host))
        }
    }

    fn evaluate(&self, acquisition: Acquisition) -> Option<Found> {
        match acquisition {
            Acquisition::Text { screen, candidates } => {
                let matcher = self.matcher.as_ref()?;
                log_info!(
                    "session {}: {} text regions, scanning for '{}'",
                    self.id,
                    candidates.len(),
                    matcher.needle()
                );
                for (index, candidate) in candidates.iter().enumerate() {
                    log_debug!("  [{index}] {}", preview(&candidate.text, 100));
                }

                let (_, hit) = matcher.find_first(&candidates)?;
                let mapper = CoordinateMapper::new(screen);
                let target = mapper.recognition_target(&hit.normalized_box);
                let b = hit.normalized_box;
                log_info!(
                    "match '{}': box=({:.3}, {:.3}, {:.3}, {:.3}) rect=({:.0}, {:.0}, {:.0}, {:.0}) click=({:.0}, {:.0}) screen={}x{}",
                    hit.text,
                    b.x,
                    b.y,
                    b.width,
                    b.height,
                    target.highlight.x,
                    target.highlight.y,
                    target.highlight.width,
                    target.highlight.height,
                    target.click_point.point().x,
                    target.click_point.point().y,
                    screen.width,
                    screen.height
                );
                Some(Found {
                    target,
                    element: None,
                    label: format!("Found \"{}\"", hit.text),
                })
            }
            Acquisition::Field { screen, field } => {
                let field = field?;
                let target = CoordinateMapper::new(screen).accessibility_target(&field.rect);
                log_info!(
                    "session {}: input field {:?} at ax=({:.0}, {:.0}, {:.0}, {:.0})",
                    self.id,
                    field.element,
                    field.rect.x,
                    field.rect.y,
                    field.rect.width,
                    field.rect.height
                );
                Some(Found {
                    target,
                    element: Some(field.element),
                    label: "Found input field".to_string(),
                })
            }
        }
    }

    async fn apply(&mut self, found: Result<Option<Found>, DetectionError>) -> CycleOutcome {
        let mut state = self.state.lock().await;
        if !state.is_current(&self.id) {
            log_debug!("session {}: stopped mid-scan, result discarded", self.id);
            return CycleOutcome::Discarded;
        }
        state.cycles += 1;

        let found = match found {
            Ok(Some(found)) => found,
            Ok(None) => {
                self.stability.reset();
                state.last_found = None;
                self.host.overlay.clear();
                self.host.report(&self.not_found_message(), Severity::Info);
                return CycleOutcome::NoCandidate;
            }
            Err(err) => {
                let severity = if err.is_transient() {
                    log_warn!("session {}: scan failed: {err}", self.id);
                    Severity::Warning
                } else {
                    log_error!("session {}: scan failed: {err:#}", self.id);
                    Severity::Error
                };
                self.stability.reset();
                state.last_found = None;
                self.host.overlay.clear();
                self.host.report(&err.to_string(), severity);
                return CycleOutcome::NoCandidate;
            }
        };

        self.host.overlay.highlight(found.target.highlight);
        state.last_found = Some(found.target);

        if !self.request.action_armed() {
            self.host.report(&found.label, Severity::Success);
            return CycleOutcome::Tracking;
        }

        match self.stability.observe(found.target.highlight) {
            Observation::Fired => {
                log_info!("session {}: {} settled, acting", self.id, found.label);
                CycleOutcome::Fired(PendingAction {
                    label: found.label,
                    click_point: found.target.click_point,
                    focus: found.element,
                    type_message: self.request.message_to_type().map(String::from),
                })
            }
            Observation::Settling { count, threshold } => {
                self.host.report(
                    &format!("{}; waiting for it to settle ({count}/{threshold})", found.label),
                    Severity::Info,
                );
                CycleOutcome::Tracking
            }
            Observation::Moved => {
                self.host.report(
                    &format!("{}; waiting for it to settle", found.label),
                    Severity::Info,
                );
                CycleOutcome::Tracking
            }
        }
    }

    fn not_found_message(&self) -> String {
        match &self.request.query {
            Some(query) if self.request.mode == DetectionMode::TextSearch => {
                format!("Text \"{}\" not found on screen", query.text)
            }
            _ => "No input field in the focused app".to_string(),
        }
    }

    /// Runs the fired action: focus (field path), click, then optional typing.
    pub(crate) async fn perform(&self, action: PendingAction) {
        if let Some(element) = action.focus {
            if let Err(err) = self.host.accessibility.set_focus(element) {
                log_warn!("could not focus {element:?}, clicking anyway: {err:#}");
            }
        }

        match action.type_message.as_deref() {
            Some(message) => {
                let sent = self.sequencer.click_then_type(action.click_point, message).await;
                self.host.report(
                    &format!("{}; clicked and typed {sent} characters", action.label),
                    Severity::Success,
                );
            }
            None => {
                self.sequencer.click(action.click_point).await;
                self.host
                    .report(&format!("{}; clicked", action.label), Severity::Success);
            }
        }
    }

    /// Marks the session finished after its one-shot action.
    pub(crate) async fn finish(&self) {
        let mut state = self.state.lock().await;
        if state.is_current(&self.id) {
            state.finish();
        }
    }
}

fn acquire_text(host: &HostBridge) -> Result<Acquisition, DetectionError> {
    let sample = host
        .display
        .capture()
        .map_err(|err| DetectionError::CaptureFailed(format!("{err:#}")))?;
    if sample.screen.is_empty() {
        return Err(DetectionError::CaptureFailed(
            "display reported an empty frame".to_string(),
        ));
    }
    log_debug!(
        "sample {}x{} px, screen {}x{} pt, scale {}",
        sample.image.width(),
        sample.image.height(),
        sample.screen.width,
        sample.screen.height,
        sample.scale_factor
    );

    let candidates = host
        .recognizer
        .recognize(&sample.image)
        .map_err(|err| DetectionError::RecognitionFailed(format!("{err:#}")))?;

    Ok(Acquisition::Text {
        screen: sample.screen,
        candidates,
    })
}

fn acquire_field(host: &HostBridge, locator: &ElementLocator) -> Result<Acquisition, DetectionError> {
    let screen = host
        .display
        .screen_size()
        .filter(|s| !s.is_empty())
        .ok_or_else(|| DetectionError::CaptureFailed("no primary display".to_string()))?;
    let field = locator.locate_field(host.accessibility.as_ref());
    Ok(Acquisition::Field { screen, field })
}
