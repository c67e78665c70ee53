//! Progress handler trait and events

use std::time::Duration;

use crate::dataset::Dataset;

/// Events emitted while a pipeline run progresses
#[derive(Debug, Clone)]
pub enum ProgressEvent {
    /// Run started
    Started { run_id: String, data_root: String },

    /// A phase started
    PhaseStarted { phase: String },

    /// A phase finished
    PhaseComplete { phase: String, duration: Duration },

    /// A dataset went through extraction, checks and curation
    DatasetProcessed {
        dataset: Dataset,
        valid: usize,
        quarantined: usize,
        quality_passed: bool,
    },

    /// A database readiness attempt failed
    DatabaseAttemptFailed {
        attempt: u32,
        max_attempts: u32,
        error: String,
        retry_in: Option<Duration>,
    },

    /// The database accepted a connection
    DatabaseReady { attempts: u32, elapsed: Duration },

    /// Run completed successfully
    Completed { total_time: Duration },

    /// Run failed
    Failed { error: String },
}

/// Trait for handling progress events during a run
pub trait ProgressHandler: Send + Sync {
    /// Called when a progress event occurs
    fn on_progress(&self, event: &ProgressEvent);
}

/// No-op handler that ignores all events
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOpHandler;

impl ProgressHandler for NoOpHandler {
    fn on_progress(&self, _event: &ProgressEvent) {}
}
