//! Run context shared by all phases

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use crate::config::PipelineConfig;
use crate::database::ConnectionProbe;
use crate::dataset::Dataset;
use crate::progress::{NoOpHandler, ProgressHandler};
use crate::storage::timestamp_prefix;

/// Outcome of ingesting one dataset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetReport {
    pub dataset: Dataset,
    pub extracted: usize,
    pub valid: usize,
    pub quarantined: usize,
    pub quality_passed: bool,
    pub quarantine_path: PathBuf,
    pub curated_path: PathBuf,
    pub validation_path: PathBuf,
    pub profile_path: Option<PathBuf>,
}

/// Outcome of building the analytics base table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsumableReport {
    pub rows: usize,
    pub columns: usize,
    pub path: PathBuf,
    pub profile_path: Option<PathBuf>,
}

/// Serializable result of a complete run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub data_root: PathBuf,
    pub database_attempts: Option<u32>,
    pub datasets: Vec<DatasetReport>,
    pub consumable: Option<ConsumableReport>,
    pub duration_ms: u64,
}

impl RunSummary {
    pub fn quarantined(&self) -> usize {
        self.datasets.iter().map(|d| d.quarantined).sum()
    }

    pub fn quality_passed(&self) -> bool {
        self.datasets.iter().all(|d| d.quality_passed)
    }
}

/// Mutable state of one pipeline run
pub struct RunContext {
    pub config: PipelineConfig,
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,

    /// File name prefix shared by every output of this run
    pub prefix: String,

    pub skip_readiness: bool,

    /// Overrides the probe built from `config.database`
    pub probe: Option<Arc<dyn ConnectionProbe>>,

    pub progress: Arc<dyn ProgressHandler>,

    pub database_attempts: Option<u32>,
    pub datasets: Vec<DatasetReport>,
    pub consumable: Option<ConsumableReport>,
}

impl RunContext {
    pub fn new(config: PipelineConfig) -> Self {
        let started_at = Utc::now();
        Self {
            config,
            run_id: Uuid::new_v4(),
            started_at,
            prefix: timestamp_prefix(started_at),
            skip_readiness: false,
            probe: None,
            progress: Arc::new(NoOpHandler),
            database_attempts: None,
            datasets: Vec::new(),
            consumable: None,
        }
    }

    pub fn with_progress(mut self, progress: Arc<dyn ProgressHandler>) -> Self {
        self.progress = progress;
        self
    }

    pub fn with_probe(mut self, probe: Arc<dyn ConnectionProbe>) -> Self {
        self.probe = Some(probe);
        self
    }

    pub fn skip_readiness(mut self, skip: bool) -> Self {
        self.skip_readiness = skip;
        self
    }

    pub fn summary(&self, duration: Duration) -> RunSummary {
        RunSummary {
            run_id: self.run_id,
            started_at: self.started_at,
            data_root: self.config.data_root.clone(),
            database_attempts: self.database_attempts,
            datasets: self.datasets.clone(),
            consumable: self.consumable.clone(),
            duration_ms: duration.as_millis() as u64,
        }
    }
}
