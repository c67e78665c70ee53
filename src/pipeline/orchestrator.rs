use super::context::{RunContext, RunSummary};
use super::phase_trait::WorkflowPhase;
use super::phases::{IngestPhase, ReadinessPhase, TransformPhase};
use crate::progress::ProgressEvent;
use anyhow::{Context, Result};
use std::time::Instant;
use tracing::{debug, info};

pub struct PipelineOrchestrator {
    phases: Vec<Box<dyn WorkflowPhase>>,
}

impl Default for PipelineOrchestrator {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineOrchestrator {
    /// Readiness gate, ingestion of every dataset, then the analytics table
    pub fn new() -> Self {
        Self::with_phases(vec![
            Box::new(ReadinessPhase),
            Box::new(IngestPhase),
            Box::new(TransformPhase),
        ])
    }

    pub fn with_phases(phases: Vec<Box<dyn WorkflowPhase>>) -> Self {
        Self { phases }
    }

    pub fn phase_names(&self) -> Vec<&'static str> {
        self.phases.iter().map(|p| p.name()).collect()
    }

    pub async fn execute(&self, context: &mut RunContext) -> Result<RunSummary> {
        let start = Instant::now();
        info!(
            run_id = %context.run_id,
            "Starting pipeline run for: {}",
            context.config.data_root.display()
        );

        context.progress.on_progress(&ProgressEvent::Started {
            run_id: context.run_id.to_string(),
            data_root: context.config.data_root.display().to_string(),
        });

        match self.run_phases(context).await {
            Ok(()) => {
                let summary = context.summary(start.elapsed());
                info!(
                    datasets = summary.datasets.len(),
                    quarantined = summary.quarantined(),
                    "Pipeline complete"
                );
                context.progress.on_progress(&ProgressEvent::Completed {
                    total_time: start.elapsed(),
                });
                Ok(summary)
            }
            Err(e) => {
                context.progress.on_progress(&ProgressEvent::Failed {
                    error: format!("{:#}", e),
                });
                Err(e)
            }
        }
    }

    async fn run_phases(&self, context: &mut RunContext) -> Result<()> {
        for phase in &self.phases {
            let phase_name = phase.name();
            info!("Phase: {}", phase_name);

            context.progress.on_progress(&ProgressEvent::PhaseStarted {
                phase: phase_name.to_string(),
            });

            let phase_start = Instant::now();
            phase
                .execute(context)
                .await
                .with_context(|| format!("Phase {} failed", phase_name))?;

            context.progress.on_progress(&ProgressEvent::PhaseComplete {
                phase: phase_name.to_string(),
                duration: phase_start.elapsed(),
            });

            debug!("Phase {} complete", phase_name);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PipelineConfig;
    use crate::progress::ProgressHandler;
    use async_trait::async_trait;
    use std::sync::{Arc, Mutex};

    struct FailingPhase;

    #[async_trait]
    impl WorkflowPhase for FailingPhase {
        fn name(&self) -> &'static str {
            "FailingPhase"
        }

        async fn execute(&self, _context: &mut RunContext) -> Result<()> {
            anyhow::bail!("disk on fire")
        }
    }

    #[derive(Default)]
    struct Recorder {
        events: Mutex<Vec<String>>,
    }

    impl ProgressHandler for Recorder {
        fn on_progress(&self, event: &ProgressEvent) {
            let name = format!("{:?}", event);
            let name = name.split([' ', '{']).next().unwrap_or_default().to_string();
            self.events.lock().unwrap().push(name);
        }
    }

    #[test]
    fn test_default_phase_order() {
        let orchestrator = PipelineOrchestrator::new();
        assert_eq!(
            orchestrator.phase_names(),
            vec!["ReadinessPhase", "IngestPhase", "TransformPhase"]
        );
    }

    #[tokio::test]
    async fn test_failure_is_reported_with_phase_context() {
        let recorder = Arc::new(Recorder::default());
        let mut context = RunContext::new(PipelineConfig::default().with_data_root("/nonexistent"))
            .with_progress(recorder.clone());
        let orchestrator = PipelineOrchestrator::with_phases(vec![Box::new(FailingPhase)]);

        let err = orchestrator.execute(&mut context).await.unwrap_err();
        assert_eq!(err.to_string(), "Phase FailingPhase failed");
        assert!(format!("{:#}", err).contains("disk on fire"));

        let events = recorder.events.lock().unwrap();
        assert_eq!(*events, vec!["Started", "PhaseStarted", "Failed"]);
    }

    #[tokio::test]
    async fn test_empty_pipeline_completes() {
        let mut context = RunContext::new(PipelineConfig::default().with_data_root("/nonexistent"));
        let summary = PipelineOrchestrator::with_phases(Vec::new())
            .execute(&mut context)
            .await
            .unwrap();
        assert_eq!(summary.run_id, context.run_id);
        assert!(summary.datasets.is_empty());
    }
}
