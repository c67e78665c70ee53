use crate::database::{probe_from_config, wait_for_database, ConnectionProbe};
use crate::pipeline::context::RunContext;
use crate::pipeline::phase_trait::WorkflowPhase;
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;

/// Blocks until the configured database accepts connections
pub struct ReadinessPhase;

#[async_trait]
impl WorkflowPhase for ReadinessPhase {
    fn name(&self) -> &'static str {
        "ReadinessPhase"
    }

    async fn execute(&self, context: &mut RunContext) -> Result<()> {
        if context.skip_readiness {
            info!("Database readiness check skipped");
            return Ok(());
        }

        let probe: Arc<dyn ConnectionProbe> = match (&context.probe, &context.config.database) {
            (Some(probe), _) => probe.clone(),
            (None, Some(_)) => Arc::new(
                probe_from_config(&context.config).context("Invalid database configuration")?,
            ),
            (None, None) => {
                info!("No database configured, skipping readiness check");
                return Ok(());
            }
        };

        let policy = context.config.readiness.backoff_policy();
        let attempts = wait_for_database(probe.as_ref(), &policy, context.progress.as_ref())
            .await
            .with_context(|| format!("Database {} is not ready", probe.target()))?;

        context.database_attempts = Some(attempts);
        Ok(())
    }
}
