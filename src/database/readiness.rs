//! Database readiness gate
//!
//! The pipeline never writes to the database, but it must not start before the
//! database accepts connections. [`wait_for_database`] probes the database until
//! it answers or the retry budget is spent, sleeping with exponential backoff
//! between attempts.

use async_trait::async_trait;
use sqlx::postgres::{PgConnectOptions, PgConnection};
use sqlx::Connection;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, info};

use crate::error::{PipelineError, Result};
use crate::progress::{ProgressEvent, ProgressHandler};

/// Why a single readiness attempt failed
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("connection attempt timed out after {0:?}")]
    Timeout(Duration),

    #[error("{0}")]
    Connection(String),
}

/// One readiness attempt against a database
#[async_trait]
pub trait ConnectionProbe: Send + Sync {
    /// Connection target for logs, without credentials
    fn target(&self) -> String;

    /// Succeeds when the database accepts a connection and answers a query
    async fn probe(&self) -> std::result::Result<(), ProbeError>;
}

/// Exponential backoff between readiness attempts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffPolicy {
    pub max_attempts: u32,
    pub initial: Duration,
    pub max: Duration,
    pub multiplier: u32,
}

impl BackoffPolicy {
    pub fn new(max_attempts: u32, initial: Duration, max: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            initial,
            max,
            multiplier: 2,
        }
    }

    /// A policy with a single attempt
    pub fn once() -> Self {
        Self::new(1, Duration::ZERO, Duration::ZERO)
    }

    /// Delay after the `failed_attempts`-th failure: `min(initial * multiplier^(n-1), max)`
    pub fn delay(&self, failed_attempts: u32) -> Duration {
        let exponent = failed_attempts.saturating_sub(1);
        let factor = self.multiplier.saturating_pow(exponent);
        self.initial.saturating_mul(factor).min(self.max)
    }
}

/// Postgres probe: connect, run `SELECT 1`, close
pub struct PgProbe {
    options: PgConnectOptions,
    target: String,
    timeout: Duration,
}

impl PgProbe {
    pub fn new(options: PgConnectOptions, target: impl Into<String>, timeout: Duration) -> Self {
        Self {
            options,
            target: target.into(),
            timeout,
        }
    }

    async fn connect_and_query(&self) -> std::result::Result<(), sqlx::Error> {
        let mut conn = PgConnection::connect_with(&self.options).await?;
        sqlx::query("SELECT 1").execute(&mut conn).await?;
        conn.close().await
    }
}

#[async_trait]
impl ConnectionProbe for PgProbe {
    fn target(&self) -> String {
        self.target.clone()
    }

    async fn probe(&self) -> std::result::Result<(), ProbeError> {
        match tokio::time::timeout(self.timeout, self.connect_and_query()).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(ProbeError::Connection(e.to_string())),
            Err(_) => Err(ProbeError::Timeout(self.timeout)),
        }
    }
}

/// Probes until the database is ready, returning the number of attempts used
///
/// # Errors
///
/// Returns `PipelineError::DatabaseUnavailable` once `policy.max_attempts` attempts failed.
pub async fn wait_for_database(
    probe: &dyn ConnectionProbe,
    policy: &BackoffPolicy,
    progress: &dyn ProgressHandler,
) -> Result<u32> {
    let start = Instant::now();
    let mut last_error = String::new();

    info!(
        target_db = %probe.target(),
        max_attempts = policy.max_attempts,
        "Waiting for database"
    );

    for attempt in 1..=policy.max_attempts {
        debug!(attempt, "Probing database");
        match probe.probe().await {
            Ok(()) => {
                progress.on_progress(&ProgressEvent::DatabaseReady {
                    attempts: attempt,
                    elapsed: start.elapsed(),
                });
                return Ok(attempt);
            }
            Err(e) => {
                last_error = e.to_string();
                let retry_in = (attempt < policy.max_attempts).then(|| policy.delay(attempt));
                progress.on_progress(&ProgressEvent::DatabaseAttemptFailed {
                    attempt,
                    max_attempts: policy.max_attempts,
                    error: last_error.clone(),
                    retry_in,
                });
                if let Some(delay) = retry_in {
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    Err(PipelineError::DatabaseUnavailable {
        attempts: policy.max_attempts,
        last_error,
    })
}
