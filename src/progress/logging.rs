//! Logging-based progress handler

use super::{ProgressEvent, ProgressHandler};
use tracing::{error, info, warn};

/// Handler that logs progress events using tracing
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingHandler;

impl ProgressHandler for LoggingHandler {
    fn on_progress(&self, event: &ProgressEvent) {
        match event {
            ProgressEvent::Started { run_id, data_root } => {
                info!(run_id = %run_id, data_root = %data_root, "Starting pipeline run");
            }
            ProgressEvent::PhaseStarted { phase } => {
                info!(phase = %phase, "Starting phase");
            }
            ProgressEvent::PhaseComplete { phase, duration } => {
                info!(
                    phase = %phase,
                    duration_ms = duration.as_millis(),
                    "Phase complete"
                );
            }
            ProgressEvent::DatasetProcessed {
                dataset,
                valid,
                quarantined,
                quality_passed,
            } => {
                if *quarantined > 0 || !quality_passed {
                    warn!(
                        dataset = %dataset,
                        valid,
                        quarantined,
                        quality_passed,
                        "Dataset processed with issues"
                    );
                } else {
                    info!(dataset = %dataset, valid, "Dataset processed");
                }
            }
            ProgressEvent::DatabaseAttemptFailed {
                attempt,
                max_attempts,
                error,
                retry_in,
            } => match retry_in {
                Some(delay) => warn!(
                    attempt,
                    max_attempts,
                    retry_in_ms = delay.as_millis(),
                    error = %error,
                    "Database not ready, retrying"
                ),
                None => warn!(attempt, max_attempts, error = %error, "Database not ready"),
            },
            ProgressEvent::DatabaseReady { attempts, elapsed } => {
                info!(
                    attempts,
                    elapsed_ms = elapsed.as_millis(),
                    "Database is ready"
                );
            }
            ProgressEvent::Completed { total_time } => {
                info!(total_time_ms = total_time.as_millis(), "Pipeline run complete");
            }
            ProgressEvent::Failed { error: message } => {
                error!(error = %message, "Pipeline run failed");
            }
        }
    }
}
