use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use super::{file_suffix, FileType};
use crate::error::{PipelineError, Result};
use crate::table::FlatTable;

/// Path of the most recent `{prefix}_{file_name}.{ext}` in `{data_root}/{folder}`
pub fn latest_file(
    data_root: &Path,
    folder: &str,
    file_name: &str,
    file_type: FileType,
) -> Result<PathBuf> {
    let dir = data_root.join(folder);
    let suffix = file_suffix(file_name, file_type);
    let missing = || PipelineError::MissingInput {
        folder: dir.clone(),
        suffix: suffix.clone(),
    };

    let entries = match fs::read_dir(&dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Err(missing()),
        Err(e) => return Err(PipelineError::io(&dir, e)),
    };

    let mut latest: Option<(String, PathBuf)> = None;
    for entry in entries {
        let entry = entry.map_err(|e| PipelineError::io(&dir, e))?;
        let name = entry.file_name().to_string_lossy().into_owned();
        let Some(stem) = name.strip_suffix(&suffix) else {
            continue;
        };
        // the prefix never contains '_', so a name like `x_sales` belongs to another file
        if stem.is_empty() || stem.contains('_') {
            continue;
        }
        if latest.as_ref().map_or(true, |(best, _)| stem > best.as_str()) {
            latest = Some((stem.to_string(), entry.path()));
        }
    }

    latest.map(|(_, path)| path).ok_or_else(missing)
}

/// Reads the most recent stored table named `file_name`
///
/// Only JSON Lines files can be read back.
pub fn read_data_from_file(
    data_root: &Path,
    folder: &str,
    file_name: &str,
    file_type: FileType,
) -> Result<FlatTable> {
    if file_type != FileType::JsonLines {
        return Err(PipelineError::UnsupportedFormat(file_type.to_string()));
    }

    let path = latest_file(data_root, folder, file_name, file_type)?;
    debug!("Reading {}", path.display());

    let content = fs::read_to_string(&path).map_err(|e| PipelineError::io(&path, e))?;
    let records = content
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(serde_json::from_str::<Map<String, Value>>)
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(FlatTable::from_records(&records))
}
