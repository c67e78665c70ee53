//! Column statistics reports for stored tables

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cmp::Ordering;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::error::{PipelineError, Result};
use crate::table::FlatTable;

pub const DATA_PROFILES_FOLDER: &str = "data_profiles";

/// Inferred type of a column's non-null values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnType {
    Integer,
    Float,
    String,
    Boolean,
    Mixed,
    Null,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnProfile {
    pub name: String,
    pub column_type: ColumnType,
    pub count: usize,
    pub null_count: usize,
    pub distinct_count: usize,
    pub min: Option<Value>,
    pub max: Option<Value>,
    pub mean: Option<f64>,
    pub std_dev: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileReport {
    pub title: String,
    pub generated_at: DateTime<Utc>,
    pub rows: usize,
    pub columns: usize,
    pub duplicate_rows: usize,
    pub column_profiles: Vec<ColumnProfile>,
}

pub fn infer_column_type(values: &[&Value]) -> ColumnType {
    let mut seen: Option<ColumnType> = None;
    for value in values.iter().filter(|v| !v.is_null()) {
        let kind = match value {
            Value::Number(n) if n.is_f64() => ColumnType::Float,
            Value::Number(_) => ColumnType::Integer,
            Value::String(_) => ColumnType::String,
            Value::Bool(_) => ColumnType::Boolean,
            _ => ColumnType::Mixed,
        };
        seen = match (seen, kind) {
            (None, k) => Some(k),
            (Some(a), b) if a == b => Some(a),
            (Some(ColumnType::Integer), ColumnType::Float)
            | (Some(ColumnType::Float), ColumnType::Integer) => Some(ColumnType::Float),
            _ => return ColumnType::Mixed,
        };
    }
    seen.unwrap_or(ColumnType::Null)
}

fn profile_column(name: &str, values: &[&Value]) -> ColumnProfile {
    let non_null: Vec<&Value> = values.iter().copied().filter(|v| !v.is_null()).collect();
    let distinct: HashSet<String> = non_null.iter().map(|v| v.to_string()).collect();
    let column_type = infer_column_type(values);

    let (min, max, mean, std_dev) = match column_type {
        ColumnType::Integer | ColumnType::Float => {
            let numbers: Vec<f64> = non_null.iter().filter_map(|v| v.as_f64()).collect();
            let numeric = || non_null.iter().copied().filter(|v| v.is_number());
            let by_value = |a: &&Value, b: &&Value| {
                let (a, b) = (a.as_f64().unwrap_or(0.0), b.as_f64().unwrap_or(0.0));
                a.partial_cmp(&b).unwrap_or(Ordering::Equal)
            };
            let (mean, std_dev) = mean_and_std_dev(&numbers);
            (
                numeric().min_by(by_value).cloned(),
                numeric().max_by(by_value).cloned(),
                mean,
                std_dev,
            )
        }
        ColumnType::String => {
            let strings = non_null.iter().filter_map(|v| v.as_str());
            let min = strings.clone().min().map(|s| Value::String(s.to_string()));
            let max = strings.max().map(|s| Value::String(s.to_string()));
            (min, max, None, None)
        }
        _ => (None, None, None, None),
    };

    ColumnProfile {
        name: name.to_string(),
        column_type,
        count: values.len(),
        null_count: values.len() - non_null.len(),
        distinct_count: distinct.len(),
        min,
        max,
        mean,
        std_dev,
    }
}

/// Mean and sample standard deviation; the deviation needs at least two values
fn mean_and_std_dev(numbers: &[f64]) -> (Option<f64>, Option<f64>) {
    if numbers.is_empty() {
        return (None, None);
    }
    let n = numbers.len() as f64;
    let mean = numbers.iter().sum::<f64>() / n;
    if numbers.len() < 2 {
        return (Some(mean), None);
    }
    let variance = numbers.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (n - 1.0);
    (Some(mean), Some(variance.sqrt()))
}

pub fn profile_table(table: &FlatTable, name: &str, generated_at: DateTime<Utc>) -> ProfileReport {
    let column_profiles = table
        .columns
        .iter()
        .enumerate()
        .map(|(i, column)| {
            let values: Vec<&Value> = table.rows.iter().map(|row| &row[i]).collect();
            profile_column(column, &values)
        })
        .collect();

    let mut unique_rows = HashSet::new();
    let duplicate_rows = table
        .rows
        .iter()
        .filter(|row| !unique_rows.insert(Value::Array(row.to_vec()).to_string()))
        .count();

    ProfileReport {
        title: format!("Profile Report of {}", name),
        generated_at,
        rows: table.row_count(),
        columns: table.column_count(),
        duplicate_rows,
        column_profiles,
    }
}

/// Profiles `table` and writes the report to `{data_root}/data_profiles/{prefix}_{name}.json`
pub fn write_data_profile_report(
    table: &FlatTable,
    data_root: &Path,
    name: &str,
    prefix: &str,
    generated_at: DateTime<Utc>,
) -> Result<PathBuf> {
    let report = profile_table(table, name, generated_at);

    let folder = data_root.join(DATA_PROFILES_FOLDER);
    std::fs::create_dir_all(&folder).map_err(|e| PipelineError::io(&folder, e))?;
    let path = folder.join(format!("{}_{}.json", prefix, name));
    std::fs::write(&path, serde_json::to_string_pretty(&report)?)
        .map_err(|e| PipelineError::io(&path, e))?;

    info!(name, path = %path.display(), "Data profile written");
    Ok(path)
}
