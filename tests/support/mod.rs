use data_pipeline::config::PipelineConfig;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Raw files shipped with the tests
pub fn fixture_raw_data() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/raw_data")
}

/// Fresh data root holding a copy of the fixture raw files
pub fn fixture_data_root() -> TempDir {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let raw = dir.path().join("raw_data");
    fs::create_dir_all(&raw).expect("Failed to create raw_data");

    for entry in fs::read_dir(fixture_raw_data()).expect("Fixtures missing") {
        let entry = entry.expect("Failed to read fixture entry");
        fs::copy(entry.path(), raw.join(entry.file_name())).expect("Failed to copy fixture");
    }
    dir
}

/// Configuration bound to `data_root`, without a database and with fast retries
#[allow(dead_code)]
pub fn test_config(data_root: &Path) -> PipelineConfig {
    let mut config = PipelineConfig::default()
        .with_data_root(data_root)
        .with_database(None);
    config.fail_on_validation = false;
    config.profiles_enabled = true;
    config.readiness.max_attempts = 3;
    config.readiness.initial_backoff_ms = 1;
    config.readiness.max_backoff_ms = 2;
    config
}

/// Files in `{data_root}/{folder}` sorted by name
#[allow(dead_code)]
pub fn files_in(data_root: &Path, folder: &str) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = match fs::read_dir(data_root.join(folder)) {
        Ok(entries) => entries.filter_map(|e| e.ok()).map(|e| e.path()).collect(),
        Err(_) => Vec::new(),
    };
    files.sort();
    files
}

#[allow(dead_code)]
pub fn data_pipeline_bin() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_data-pipeline"))
}
