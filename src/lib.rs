//! data-pipeline - batch ETL building an analytics base table
//!
//! Raw JSON-lines extracts of sales, products, orders, customers and countries are
//! checked line by line against their schemas. Broken lines are quarantined, the
//! rest is curated, quality-checked and profiled, and the five curated datasets are
//! joined into a single analytics base table. Before a run the pipeline can wait for
//! a Postgres database to accept connections, retrying with exponential backoff.
//!
//! # Example Usage
//!
//! ```no_run
//! use data_pipeline::{PipelineConfig, PipelineOrchestrator, RunContext};
//!
//! # async fn run() -> anyhow::Result<()> {
//! let config = PipelineConfig::load().with_data_root("./data");
//! let mut context = RunContext::new(config).skip_readiness(true);
//!
//! let summary = PipelineOrchestrator::new().execute(&mut context).await?;
//! println!("{} quarantined lines", summary.quarantined());
//! # Ok(())
//! # }
//! ```
//!
//! # Project Structure
//!
//! - [`extractor`]: reads raw files into numbered JSON lines
//! - [`checker`]: schema checks, quarantine tables and quality expectations
//! - [`curator`]: curated tables with creation timestamps
//! - [`transformer`]: joins and features of the analytics base table
//! - [`storage`]: timestamp-prefixed CSV and JSON-lines files
//! - [`database`]: Postgres readiness probe with retry and backoff
//! - [`pipeline`]: phases and the orchestrator driving a run

pub mod checker;
pub mod cli;
pub mod config;
pub mod curator;
pub mod database;
pub mod dataset;
pub mod error;
pub mod extractor;
pub mod pipeline;
pub mod profiler;
pub mod progress;
pub mod storage;
pub mod table;
pub mod transformer;
pub mod util;

pub use config::{ConfigError, DatabaseConfig, PipelineConfig, ReadinessConfig};
pub use database::{wait_for_database, BackoffPolicy, ConnectionProbe, PgProbe, ProbeError};
pub use dataset::Dataset;
pub use error::{PipelineError, Result};
pub use pipeline::{PipelineOrchestrator, RunContext, RunSummary};
pub use table::FlatTable;
pub use util::{init_logging, LoggingConfig};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
