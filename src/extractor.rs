//! Extraction of raw JSON-lines files
//!
//! Raw files hold one JSON object per line, optionally followed by a trailing comma
//! (files exported as a JSON array with one element per line). Keys are normalized
//! to PascalCase so that headers such as `"GDP ($ per capita)"` become `GDPPerCapita`.

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::{debug, info};

use crate::dataset::Dataset;
use crate::error::{PipelineError, Result};

pub const RAW_DATA_FOLDER: &str = "raw_data";

/// A parsed line with its 1-based line number in the raw file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonLine {
    pub line_number: usize,
    pub record: Map<String, Value>,
}

/// A line that is not a JSON object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnparseableLine {
    pub line_number: usize,
    pub raw: String,
    pub error: String,
}

#[derive(Debug, Clone)]
pub struct ExtractedLines {
    pub dataset: Dataset,
    pub source: PathBuf,
    pub lines: Vec<JsonLine>,
    pub unparseable: Vec<UnparseableLine>,
}

impl ExtractedLines {
    pub fn total(&self) -> usize {
        self.lines.len() + self.unparseable.len()
    }
}

pub fn raw_file_path(data_root: &Path, dataset: Dataset) -> PathBuf {
    data_root
        .join(RAW_DATA_FOLDER)
        .join(format!("{}.json", dataset.name()))
}

/// Reads and parses `{data_root}/raw_data/{dataset}.json`
pub fn extract_json_lines(data_root: &Path, dataset: Dataset) -> Result<ExtractedLines> {
    let source = raw_file_path(data_root, dataset);
    debug!("Reading raw file {}", source.display());

    let content = std::fs::read_to_string(&source).map_err(|e| PipelineError::io(&source, e))?;
    let (lines, unparseable) = parse_json_lines(&content);

    info!(
        dataset = %dataset,
        parsed = lines.len(),
        unparseable = unparseable.len(),
        "Extracted raw lines"
    );

    Ok(ExtractedLines {
        dataset,
        source,
        lines,
        unparseable,
    })
}

/// Splits file content into parsed objects and lines that failed to parse
pub fn parse_json_lines(content: &str) -> (Vec<JsonLine>, Vec<UnparseableLine>) {
    let mut lines = Vec::new();
    let mut unparseable = Vec::new();

    for (idx, raw) in content.lines().enumerate() {
        let line_number = idx + 1;
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed == "[" || trimmed == "]" {
            continue;
        }

        let body = remove_final_comma(trimmed);
        match serde_json::from_str::<Value>(body) {
            Ok(Value::Object(record)) => lines.push(JsonLine {
                line_number,
                record: normalize_keys(record),
            }),
            Ok(other) => unparseable.push(UnparseableLine {
                line_number,
                raw: trimmed.to_string(),
                error: format!("expected a JSON object, got {}", json_type_name(&other)),
            }),
            Err(e) => unparseable.push(UnparseableLine {
                line_number,
                raw: trimmed.to_string(),
                error: format!("invalid JSON: {}", e),
            }),
        }
    }

    (lines, unparseable)
}

fn remove_final_comma(line: &str) -> &str {
    line.strip_suffix(',').map(str::trim_end).unwrap_or(line)
}

fn key_separator() -> &'static Regex {
    static SEPARATOR: OnceLock<Regex> = OnceLock::new();
    SEPARATOR.get_or_init(|| Regex::new(r"[\s.()$%/]+").expect("static regex"))
}

/// Turns a raw header into a PascalCase column name
///
/// ```
/// use data_pipeline::extractor::normalize_key;
///
/// assert_eq!(normalize_key("Area (sq. mi.)"), "AreaSqMi");
/// assert_eq!(normalize_key("GDP ($ per capita)"), "GDPPerCapita");
/// assert_eq!(normalize_key("SaleId"), "SaleId");
/// ```
pub fn normalize_key(key: &str) -> String {
    key_separator()
        .split(key)
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect()
}

fn normalize_keys(record: Map<String, Value>) -> Map<String, Value> {
    record
        .into_iter()
        .map(|(k, v)| (normalize_key(&k), v))
        .collect()
}

pub(crate) fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_f64() => "float",
        Value::Number(_) => "integer",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
