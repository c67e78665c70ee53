//! Command handlers; each returns the process exit code

use std::sync::Arc;
use tracing::{error, info};

use super::commands::{CheckArgs, ConfigArgs, HealthArgs, RunArgs};
use super::output::{HealthStatus, OutputFormat, OutputFormatter};
use crate::checker::{check_json_lines, CheckSummary};
use crate::config::{ConfigError, PipelineConfig};
use crate::database::{probe_from_config, wait_for_database, BackoffPolicy, ConnectionProbe};
use crate::dataset::Dataset;
use crate::error::PipelineError;
use crate::extractor::extract_json_lines;
use crate::pipeline::{PipelineOrchestrator, RunContext};
use crate::progress::LoggingHandler;

fn print_output(output: anyhow::Result<String>) -> bool {
    match output {
        Ok(text) => {
            println!("{}", text);
            true
        }
        Err(e) => {
            error!("Failed to format output: {:#}", e);
            false
        }
    }
}

fn load_validated(config: PipelineConfig) -> Option<PipelineConfig> {
    match config.validate() {
        Ok(()) => Some(config),
        Err(e) => {
            error!("{}", e);
            None
        }
    }
}

pub async fn handle_run(args: &RunArgs) -> i32 {
    let mut config = PipelineConfig::load();
    if let Some(data_root) = &args.data_root {
        config.data_root = data_root.clone();
    }
    if args.no_profiles {
        config.profiles_enabled = false;
    }
    if args.fail_on_validation {
        config.fail_on_validation = true;
    }
    let Some(config) = load_validated(config) else {
        return 1;
    };

    let mut context = RunContext::new(config)
        .skip_readiness(args.skip_readiness)
        .with_progress(Arc::new(LoggingHandler));

    match PipelineOrchestrator::new().execute(&mut context).await {
        Ok(summary) => {
            let formatter = OutputFormatter::new(OutputFormat::from(args.format));
            if print_output(formatter.format_summary(&summary)) {
                0
            } else {
                1
            }
        }
        Err(e) => {
            error!("Pipeline failed: {:#}", e);
            1
        }
    }
}

pub fn handle_check(args: &CheckArgs) -> i32 {
    let mut config = PipelineConfig::load();
    if let Some(data_root) = &args.data_root {
        config.data_root = data_root.clone();
    }

    let datasets: Vec<Dataset> = if args.datasets.is_empty() {
        Dataset::ALL.to_vec()
    } else {
        args.datasets.clone()
    };

    let mut results: Vec<CheckSummary> = Vec::with_capacity(datasets.len());
    for dataset in datasets {
        match extract_json_lines(&config.data_root, dataset) {
            Ok(extracted) => results.push(check_json_lines(extracted).summary()),
            Err(e) => {
                error!("Cannot check {}: {}", dataset, e);
                return 1;
            }
        }
    }

    let formatter = OutputFormatter::new(OutputFormat::from(args.format));
    let printed = print_output(formatter.format_check(&results));
    if printed && results.iter().all(|r| r.broken == 0) {
        0
    } else {
        1
    }
}

pub async fn handle_health(args: &HealthArgs) -> i32 {
    let config = PipelineConfig::load();
    let formatter = OutputFormatter::new(OutputFormat::from(args.format));

    let probe = match probe_from_config(&config) {
        Ok(probe) => probe,
        Err(e) => {
            let target = config.database.as_ref().map(|db| db.display_target());
            if !matches!(e, ConfigError::DatabaseNotConfigured) {
                error!("{}", e);
            }
            print_output(formatter.format_health(&HealthStatus::unavailable(
                target,
                0,
                e.to_string(),
            )));
            return 1;
        }
    };

    let policy = if args.wait {
        config.readiness.backoff_policy()
    } else {
        BackoffPolicy::once()
    };

    let status = match wait_for_database(&probe, &policy, &LoggingHandler).await {
        Ok(attempts) => HealthStatus::available(probe.target(), attempts),
        Err(PipelineError::DatabaseUnavailable {
            attempts,
            last_error,
        }) => HealthStatus::unavailable(Some(probe.target()), attempts, last_error),
        Err(e) => HealthStatus::unavailable(Some(probe.target()), 0, e.to_string()),
    };
    info!(available = status.available, "Health check complete");

    if print_output(formatter.format_health(&status)) && status.available {
        0
    } else {
        1
    }
}

pub fn handle_config(args: &ConfigArgs) -> i32 {
    let config = PipelineConfig::load();
    let formatter = OutputFormatter::new(OutputFormat::from(args.format));

    if !print_output(formatter.format_config(&config)) {
        return 1;
    }
    match config.validate() {
        Ok(()) => 0,
        Err(e) => {
            error!("{}", e);
            1
        }
    }
}
