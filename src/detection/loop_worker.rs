use tokio::time::{Duration, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use super::session::{CycleOutcome, DetectionSession};

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_info};

/// Polls until cancelled, the session is stopped, or an armed action has
/// fired. The first cycle runs immediately.
pub(crate) async fn detection_loop(
    mut session: DetectionSession,
    poll_interval: Duration,
    cancel_token: CancellationToken,
) {
    let mut ticker = tokio::time::interval(poll_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            biased;
            _ = cancel_token.cancelled() => {
                log_info!("detection loop {} shutting down", session.id());
                return;
            }
            _ = ticker.tick() => {}
        }

        let outcome = tokio::select! {
            biased;
            _ = cancel_token.cancelled() => {
                log_info!("detection loop {} cancelled mid-cycle", session.id());
                return;
            }
            outcome = session.run_cycle() => outcome,
        };

        match outcome {
            CycleOutcome::Fired(action) => {
                tokio::select! {
                    biased;
                    _ = cancel_token.cancelled() => {
                        log_info!("detection loop {} cancelled during action", session.id());
                        return;
                    }
                    _ = session.perform(action) => {}
                }
                session.finish().await;
                log_info!("detection loop {} finished after action", session.id());
                return;
            }
            CycleOutcome::Discarded => {
                log_debug!("detection loop {} no longer current", session.id());
                return;
            }
            CycleOutcome::Skipped | CycleOutcome::NoCandidate | CycleOutcome::Tracking => {}
        }
    }
}
