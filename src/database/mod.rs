//! Database connectivity

pub mod readiness;

pub use readiness::{wait_for_database, BackoffPolicy, ConnectionProbe, PgProbe, ProbeError};

use crate::config::{ConfigError, PipelineConfig};

/// Builds the Postgres probe described by `config`
///
/// # Errors
///
/// Returns `ConfigError::DatabaseNotConfigured` when no database is configured.
pub fn probe_from_config(config: &PipelineConfig) -> Result<PgProbe, ConfigError> {
    let database = config
        .database
        .as_ref()
        .ok_or(ConfigError::DatabaseNotConfigured)?;

    Ok(PgProbe::new(
        database.connect_options()?,
        database.display_target(),
        config.readiness.connect_timeout(),
    ))
}
