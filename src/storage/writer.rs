use serde_json::{Map, Value};
use std::fs;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::info;

use super::FileType;
use crate::error::{PipelineError, Result};
use crate::table::FlatTable;

/// Writes `table` to `{data_root}/{folder}/{prefix}_{file_name}.{ext}`
///
/// Missing folders are created. Returns the written path.
pub fn write_data_to_file(
    table: &FlatTable,
    data_root: &Path,
    folder: &str,
    file_name: &str,
    file_type: FileType,
    prefix: &str,
) -> Result<PathBuf> {
    let dir = data_root.join(folder);
    fs::create_dir_all(&dir).map_err(|e| PipelineError::io(&dir, e))?;

    let path = dir.join(format!(
        "{}_{}.{}",
        prefix,
        file_name,
        file_type.extension()
    ));
    let file = fs::File::create(&path).map_err(|e| PipelineError::io(&path, e))?;
    let mut out = BufWriter::new(file);

    match file_type {
        FileType::Csv => write_csv(table, &mut out),
        FileType::JsonLines => write_json_lines(table, &mut out),
    }
    .and_then(|_| out.flush())
    .map_err(|e| PipelineError::io(&path, e))?;

    info!(
        path = %path.display(),
        rows = table.row_count(),
        format = %file_type,
        "Table written"
    );
    Ok(path)
}

fn write_csv<W: Write>(table: &FlatTable, out: &mut W) -> io::Result<()> {
    let header: Vec<String> = table.columns.iter().map(|c| csv_field(c)).collect();
    writeln!(out, "{}", header.join(","))?;

    for row in &table.rows {
        let fields: Vec<String> = row.iter().map(|v| csv_field(&csv_text(v))).collect();
        writeln!(out, "{}", fields.join(","))?;
    }
    Ok(())
}

fn write_json_lines<W: Write>(table: &FlatTable, out: &mut W) -> io::Result<()> {
    for row in &table.rows {
        let record: Map<String, Value> = table
            .columns
            .iter()
            .cloned()
            .zip(row.iter().cloned())
            .collect();
        serde_json::to_writer(&mut *out, &record)?;
        out.write_all(b"\n")?;
    }
    Ok(())
}

fn csv_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Quotes a field when it contains a delimiter, quote or line break
fn csv_field(text: &str) -> String {
    if text.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", text.replace('"', "\"\""))
    } else {
        text.to_string()
    }
}
