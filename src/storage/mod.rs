//! Timestamped table files on disk
//!
//! Every output is written as `{data_root}/{folder}/{prefix}_{file_name}.{ext}` where
//! the prefix is the run's UTC timestamp. Prefixes sort lexicographically in
//! chronological order, so the latest file for a name is the greatest prefix.

pub mod reader;
pub mod writer;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

pub use reader::{latest_file, read_data_from_file};
pub use writer::write_data_to_file;

pub const QUARANTINE_DATA_FOLDER: &str = "quarantine_data";
pub const CONSUMABLE_DATA_FOLDER: &str = "consumable_data";
pub const ANALYTICS_BASE_TABLE: &str = "analytics_base_table";

const TIMESTAMP_PREFIX_FORMAT: &str = "%Y%m%dT%H%M%S%6f";

/// Supported file formats for stored tables
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileType {
    Csv,
    JsonLines,
}

impl FileType {
    pub fn extension(&self) -> &'static str {
        match self {
            FileType::Csv => "csv",
            FileType::JsonLines => "jsonl",
        }
    }
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// File name prefix for outputs created at `at`, e.g. `20240301T120000123456`
pub fn timestamp_prefix(at: DateTime<Utc>) -> String {
    at.format(TIMESTAMP_PREFIX_FORMAT).to_string()
}

fn file_suffix(file_name: &str, file_type: FileType) -> String {
    format!("_{}.{}", file_name, file_type.extension())
}
