//! Output formatting for multiple formats
//!
//! Command results are rendered as JSON, YAML or human-readable text. Output goes to
//! stdout; logs stay on stderr.
//!
//! # Example
//!
//! ```
//! use data_pipeline::cli::output::{HealthStatus, OutputFormat, OutputFormatter};
//!
//! let status = HealthStatus::available("postgres://app@db:5432/app", 1);
//! let output = OutputFormatter::new(OutputFormat::Json).format_health(&status).unwrap();
//! assert!(output.contains("\"available\": true"));
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::checker::CheckSummary;
use crate::config::PipelineConfig;
use crate::pipeline::RunSummary;

const RULE: &str = "\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}";
const CHECK: &str = "\u{2713}";
const CROSS: &str = "\u{2717}";
const WARN: &str = "\u{26A0}";

/// Output format enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// JSON format (machine-readable)
    Json,
    /// YAML format
    Yaml,
    /// Human-readable formatted text
    Human,
}

/// Database health as reported by the `health` command
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub available: bool,
    pub target: Option<String>,
    pub attempts: u32,
    pub message: String,
}

impl HealthStatus {
    pub fn available(target: impl Into<String>, attempts: u32) -> Self {
        Self {
            available: true,
            target: Some(target.into()),
            attempts,
            message: "Database accepts connections".to_string(),
        }
    }

    pub fn unavailable(target: Option<String>, attempts: u32, message: impl Into<String>) -> Self {
        Self {
            available: false,
            target,
            attempts,
            message: message.into(),
        }
    }
}

/// Output formatter for command results
pub struct OutputFormatter {
    format: OutputFormat,
}

impl OutputFormatter {
    /// Creates a new output formatter with the specified format
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    fn structured<T: Serialize>(&self, value: &T, what: &str) -> Result<String> {
        match self.format {
            OutputFormat::Yaml => serde_yaml::to_string(value)
                .with_context(|| format!("Failed to serialize {} to YAML", what)),
            _ => serde_json::to_string_pretty(value)
                .with_context(|| format!("Failed to serialize {} to JSON", what)),
        }
    }

    /// Formats the summary of a pipeline run
    pub fn format_summary(&self, summary: &RunSummary) -> Result<String> {
        if self.format != OutputFormat::Human {
            return self.structured(summary, "run summary");
        }

        let mut output = String::new();
        if summary.quarantined() == 0 && summary.quality_passed() {
            output.push_str(&format!("{} Pipeline Run Complete\n", CHECK));
        } else {
            output.push_str(&format!("{} Pipeline Run Complete (with data issues)\n", WARN));
        }
        output.push_str(RULE);
        output.push_str("\n\n");

        output.push_str(&format!("Run ID:     {}\n", summary.run_id));
        output.push_str(&format!("Started:    {}\n", summary.started_at.to_rfc3339()));
        output.push_str(&format!("Data Root:  {}\n", summary.data_root.display()));
        match summary.database_attempts {
            Some(attempts) => output.push_str(&format!(
                "Database:   ready after {} attempt(s)\n\n",
                attempts
            )),
            None => output.push_str("Database:   not checked\n\n"),
        }

        output.push_str("Datasets:\n");
        for (i, report) in summary.datasets.iter().enumerate() {
            let connector = if i + 1 == summary.datasets.len() {
                "\u{2514}\u{2500}"
            } else {
                "\u{251C}\u{2500}"
            };
            let quality = if report.quality_passed { CHECK } else { CROSS };
            output.push_str(&format!(
                "{} {:<10} {:>6} lines, {:>6} valid, {:>4} quarantined, quality {}\n",
                connector,
                report.dataset.name(),
                report.extracted,
                report.valid,
                report.quarantined,
                quality
            ));
        }
        output.push('\n');

        if let Some(consumable) = &summary.consumable {
            output.push_str("Analytics Base Table:\n");
            output.push_str(&format!(
                "\u{251C}\u{2500} Shape:   {} rows x {} columns\n",
                consumable.rows, consumable.columns
            ));
            match &consumable.profile_path {
                Some(profile) => {
                    output.push_str(&format!(
                        "\u{251C}\u{2500} File:    {}\n",
                        consumable.path.display()
                    ));
                    output.push_str(&format!(
                        "\u{2514}\u{2500} Profile: {}\n",
                        profile.display()
                    ));
                }
                None => output.push_str(&format!(
                    "\u{2514}\u{2500} File:    {}\n",
                    consumable.path.display()
                )),
            }
        }

        output.push_str(&format!("\nProcessed in {}ms\n", summary.duration_ms));
        Ok(output)
    }

    /// Formats schema check results
    pub fn format_check(&self, results: &[CheckSummary]) -> Result<String> {
        if self.format != OutputFormat::Human {
            return self.structured(&results, "check results");
        }

        let mut output = String::new();
        output.push_str("Schema Check\n");
        output.push_str(RULE);
        output.push_str("\n\n");

        for result in results {
            let symbol = if result.broken == 0 { CHECK } else { CROSS };
            output.push_str(&format!(
                "{} {}: {}/{} lines valid\n",
                symbol,
                result.dataset.name(),
                result.valid,
                result.total
            ));
            if !result.broken_lines.is_empty() {
                let lines: Vec<String> = result.broken_lines.iter().map(|l| l.to_string()).collect();
                output.push_str(&format!("  Broken lines: {}\n", lines.join(", ")));
            }
        }
        Ok(output)
    }

    /// Formats configuration display
    pub fn format_config(&self, config: &PipelineConfig) -> Result<String> {
        let config_map: BTreeMap<String, String> = config.to_display_map().into_iter().collect();
        match self.format {
            OutputFormat::Human => Ok(config.to_string()),
            _ => self.structured(&config_map, "config"),
        }
    }

    /// Formats the database health check
    pub fn format_health(&self, status: &HealthStatus) -> Result<String> {
        if self.format != OutputFormat::Human {
            return self.structured(status, "health status");
        }

        let mut output = String::new();
        output.push_str("Database Health Status\n");
        output.push_str(RULE);
        output.push_str("\n\n");

        let symbol = if status.available { CHECK } else { CROSS };
        output.push_str(&format!(
            "{} {}\n",
            symbol,
            status.target.as_deref().unwrap_or("database")
        ));
        output.push_str(&format!(
            "  Status: {}\n",
            if status.available {
                "Available"
            } else {
                "Unavailable"
            }
        ));
        output.push_str(&format!("  Attempts: {}\n", status.attempts));
        output.push_str(&format!("  Message: {}\n", status.message));
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::Dataset;
    use crate::pipeline::{ConsumableReport, DatasetReport};
    use chrono::Utc;
    use std::path::PathBuf;
    use uuid::Uuid;

    fn summary(quarantined: usize) -> RunSummary {
        RunSummary {
            run_id: Uuid::new_v4(),
            started_at: Utc::now(),
            data_root: PathBuf::from("data"),
            database_attempts: Some(2),
            datasets: vec![DatasetReport {
                dataset: Dataset::Sales,
                extracted: 10,
                valid: 10 - quarantined,
                quarantined,
                quality_passed: true,
                quarantine_path: PathBuf::from("q.csv"),
                curated_path: PathBuf::from("c.jsonl"),
                validation_path: PathBuf::from("v.json"),
                profile_path: None,
            }],
            consumable: Some(ConsumableReport {
                rows: 10,
                columns: 20,
                path: PathBuf::from("data/consumable_data/x_analytics_base_table.jsonl"),
                profile_path: None,
            }),
            duration_ms: 42,
        }
    }

    #[test]
    fn test_human_summary() {
        let output = OutputFormatter::new(OutputFormat::Human)
            .format_summary(&summary(0))
            .unwrap();
        assert!(output.starts_with(CHECK));
        assert!(output.contains("ready after 2 attempt(s)"));
        assert!(output.contains("10 rows x 20 columns"));
        assert!(output.contains("Processed in 42ms"));
    }

    #[test]
    fn test_human_summary_flags_quarantine() {
        let output = OutputFormatter::new(OutputFormat::Human)
            .format_summary(&summary(3))
            .unwrap();
        assert!(output.contains("with data issues"));
    }

    #[test]
    fn test_json_summary_round_trips() {
        let original = summary(1);
        let output = OutputFormatter::new(OutputFormat::Json)
            .format_summary(&original)
            .unwrap();
        let parsed: RunSummary = serde_json::from_str(&output).unwrap();
        assert_eq!(parsed, original);
    }

    #[test]
    fn test_yaml_check() {
        let results = vec![CheckSummary {
            dataset: Dataset::Orders,
            total: 3,
            valid: 2,
            broken: 1,
            broken_lines: vec![2],
        }];
        let output = OutputFormatter::new(OutputFormat::Yaml)
            .format_check(&results)
            .unwrap();
        assert!(output.contains("dataset: orders"));
        assert!(output.contains("broken: 1"));
    }

    #[test]
    fn test_human_check_lists_broken_lines() {
        let results = vec![CheckSummary {
            dataset: Dataset::Orders,
            total: 4,
            valid: 2,
            broken: 2,
            broken_lines: vec![2, 4],
        }];
        let output = OutputFormatter::new(OutputFormat::Human)
            .format_check(&results)
            .unwrap();
        assert!(output.contains("orders: 2/4 lines valid"));
        assert!(output.contains("Broken lines: 2, 4"));
    }

    #[test]
    fn test_health_formats() {
        let status = HealthStatus::unavailable(None, 0, "Database not configured");
        let human = OutputFormatter::new(OutputFormat::Human)
            .format_health(&status)
            .unwrap();
        assert!(human.contains("Unavailable"));
        assert!(human.contains("Database not configured"));

        let json = OutputFormatter::new(OutputFormat::Json)
            .format_health(&status)
            .unwrap();
        assert!(json.contains("\"available\": false"));
    }
}
