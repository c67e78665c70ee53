//! Data-quality expectation suites for curated tables

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::dataset::{Dataset, CREATED_TIMESTAMP_COLUMN};
use crate::error::{PipelineError, Result};
use crate::storage::timestamp_prefix;
use crate::table::FlatTable;

pub const CURATED_SUITE_NAME: &str = "curated_data_suite";
pub const VALIDATION_RESULTS_FOLDER: &str = "validation_results";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Expectation {
    ColumnToExist { column: String },
    ValuesNotNull { column: String },
    ValuesUnique { column: String },
    ValueLengthsEqual { column: String, length: usize },
}

impl Expectation {
    pub fn column(&self) -> &str {
        match self {
            Expectation::ColumnToExist { column }
            | Expectation::ValuesNotNull { column }
            | Expectation::ValuesUnique { column }
            | Expectation::ValueLengthsEqual { column, .. } => column,
        }
    }

    /// Number of offending cells, `None` when the column does not exist
    fn unexpected_count(&self, table: &FlatTable) -> Option<usize> {
        let values = table.column_values(self.column()).ok()?;

        let count = match self {
            Expectation::ColumnToExist { .. } => 0,
            Expectation::ValuesNotNull { .. } => values.iter().filter(|v| v.is_null()).count(),
            Expectation::ValuesUnique { .. } => {
                let mut seen: HashMap<String, usize> = HashMap::new();
                for value in values.iter().filter(|v| !v.is_null()) {
                    *seen.entry(value.to_string()).or_default() += 1;
                }
                seen.values().filter(|&&n| n > 1).sum()
            }
            Expectation::ValueLengthsEqual { length, .. } => values
                .iter()
                .filter(|v| !v.is_null())
                .filter(|v| match v {
                    Value::String(s) => s.chars().count() != *length,
                    _ => true,
                })
                .count(),
        };

        Some(count)
    }
}

impl fmt::Display for Expectation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expectation::ColumnToExist { column } => write!(f, "expect_column_to_exist({})", column),
            Expectation::ValuesNotNull { column } => {
                write!(f, "expect_column_values_to_not_be_null({})", column)
            }
            Expectation::ValuesUnique { column } => {
                write!(f, "expect_column_values_to_be_unique({})", column)
            }
            Expectation::ValueLengthsEqual { column, length } => {
                write!(f, "expect_column_value_lengths_to_equal({}, {})", column, length)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpectationResult {
    pub expectation: Expectation,
    pub column: String,
    pub success: bool,
    pub unexpected_count: usize,
    pub element_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub suite: String,
    pub dataset: Dataset,
    pub success: bool,
    pub evaluated_at: DateTime<Utc>,
    pub results: Vec<ExpectationResult>,
}

impl ValidationReport {
    pub fn failed(&self) -> impl Iterator<Item = &ExpectationResult> {
        self.results.iter().filter(|r| !r.success)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpectationSuite {
    pub name: String,
    pub dataset: Dataset,
    pub expectations: Vec<Expectation>,
}

impl ExpectationSuite {
    /// The curated-data suite of a dataset
    ///
    /// Every schema column and `CreatedTimeStamp` must exist and be non-null; on top of
    /// that each dataset has its own uniqueness and code-length checks.
    pub fn curated(dataset: Dataset) -> Self {
        let mut expectations = Vec::new();

        for column in dataset.curated_columns() {
            expectations.push(Expectation::ColumnToExist {
                column: column.clone(),
            });
            expectations.push(Expectation::ValuesNotNull { column });
        }

        let (unique, lengths): (&[&str], &[(&str, usize)]) = match dataset {
            Dataset::Sales => (&["SaleId"], &[]),
            Dataset::Products => (&["ProductId", "Name"], &[("ManufacturedCountry", 2)]),
            Dataset::Orders => (&["OrderId"], &[]),
            Dataset::Customers => (&["CustomerId"], &[("Country", 2)]),
            Dataset::Countries => (&["Country"], &[("Country", 2), ("Currency", 3)]),
        };

        expectations.extend(unique.iter().map(|c| Expectation::ValuesUnique {
            column: c.to_string(),
        }));
        expectations.extend(lengths.iter().map(|(c, length)| Expectation::ValueLengthsEqual {
            column: c.to_string(),
            length: *length,
        }));

        debug_assert!(expectations
            .iter()
            .any(|e| e.column() == CREATED_TIMESTAMP_COLUMN));

        Self {
            name: CURATED_SUITE_NAME.to_string(),
            dataset,
            expectations,
        }
    }

    pub fn validate(&self, table: &FlatTable, evaluated_at: DateTime<Utc>) -> ValidationReport {
        let element_count = table.row_count();
        let results: Vec<ExpectationResult> = self
            .expectations
            .iter()
            .map(|expectation| {
                let (success, unexpected_count) = match expectation.unexpected_count(table) {
                    Some(n) => (n == 0, n),
                    None => (false, element_count),
                };
                ExpectationResult {
                    expectation: expectation.clone(),
                    column: expectation.column().to_string(),
                    success,
                    unexpected_count,
                    element_count,
                }
            })
            .collect();

        ValidationReport {
            suite: self.name.clone(),
            dataset: self.dataset,
            success: results.iter().all(|r| r.success),
            evaluated_at,
            results,
        }
    }
}

/// Runs the curated suite of `dataset` against `table` and persists the report
///
/// A failing suite is logged; it becomes an error only when `fail_on_failure` is set.
pub fn validate_curated_flat_structure(
    table: &FlatTable,
    dataset: Dataset,
    data_root: &Path,
    evaluated_at: DateTime<Utc>,
    fail_on_failure: bool,
) -> Result<(ValidationReport, PathBuf)> {
    let suite = ExpectationSuite::curated(dataset);
    let report = suite.validate(table, evaluated_at);
    let path = write_validation_report(&report, data_root)?;

    if report.success {
        info!(dataset = %dataset, suite = %report.suite, "Data quality suite passed");
    } else {
        for failed in report.failed() {
            warn!(
                dataset = %dataset,
                expectation = %failed.expectation,
                unexpected = failed.unexpected_count,
                "Expectation not met"
            );
        }
        if fail_on_failure {
            return Err(PipelineError::DataQuality {
                suite: report.suite.clone(),
                dataset: dataset.to_string(),
                failed: report.failed().count(),
            });
        }
    }

    Ok((report, path))
}

fn write_validation_report(report: &ValidationReport, data_root: &Path) -> Result<PathBuf> {
    let folder = data_root.join(VALIDATION_RESULTS_FOLDER);
    std::fs::create_dir_all(&folder).map_err(|e| PipelineError::io(&folder, e))?;

    let path = folder.join(format!(
        "{}_{}.json",
        timestamp_prefix(report.evaluated_at),
        report.dataset.name()
    ));
    let body = serde_json::to_string_pretty(report)?;
    std::fs::write(&path, body).map_err(|e| PipelineError::io(&path, e))?;

    Ok(path)
}
