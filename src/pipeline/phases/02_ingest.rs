use crate::checker::{check_json_lines, quarantine_table, validate_curated_flat_structure};
use crate::curator::{create_curated_flat_structure, CURATED_DATA_FOLDER};
use crate::dataset::Dataset;
use crate::extractor::extract_json_lines;
use crate::pipeline::context::{DatasetReport, RunContext};
use crate::pipeline::phase_trait::WorkflowPhase;
use crate::profiler::write_data_profile_report;
use crate::progress::ProgressEvent;
use crate::storage::{write_data_to_file, FileType, QUARANTINE_DATA_FOLDER};
use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::debug;

/// Extract, check, quarantine, curate, validate and store every dataset
pub struct IngestPhase;

impl IngestPhase {
    fn ingest(context: &RunContext, dataset: Dataset) -> Result<DatasetReport> {
        let config = &context.config;
        let data_root = config.data_root.as_path();

        let extracted = extract_json_lines(data_root, dataset)?;
        let extracted_count = extracted.total();
        let checked = check_json_lines(extracted);

        let quarantine_path = write_data_to_file(
            &quarantine_table(&checked.broken),
            data_root,
            QUARANTINE_DATA_FOLDER,
            dataset.name(),
            FileType::Csv,
            &context.prefix,
        )?;

        let curated = create_curated_flat_structure(dataset, &checked, context.started_at);

        let (report, validation_path) = validate_curated_flat_structure(
            &curated,
            dataset,
            data_root,
            context.started_at,
            config.fail_on_validation,
        )?;

        let curated_path = write_data_to_file(
            &curated,
            data_root,
            CURATED_DATA_FOLDER,
            dataset.name(),
            FileType::JsonLines,
            &context.prefix,
        )?;

        let profile_path = if config.profiles_enabled {
            Some(write_data_profile_report(
                &curated,
                data_root,
                dataset.name(),
                &context.prefix,
                context.started_at,
            )?)
        } else {
            debug!(dataset = %dataset, "Data profiles disabled");
            None
        };

        Ok(DatasetReport {
            dataset,
            extracted: extracted_count,
            valid: checked.valid.len(),
            quarantined: checked.broken.len(),
            quality_passed: report.success,
            quarantine_path,
            curated_path,
            validation_path,
            profile_path,
        })
    }
}

#[async_trait]
impl WorkflowPhase for IngestPhase {
    fn name(&self) -> &'static str {
        "IngestPhase"
    }

    async fn execute(&self, context: &mut RunContext) -> Result<()> {
        for dataset in Dataset::ALL {
            let report = Self::ingest(context, dataset)
                .with_context(|| format!("Failed to ingest {}", dataset))?;

            context.progress.on_progress(&ProgressEvent::DatasetProcessed {
                dataset,
                valid: report.valid,
                quarantined: report.quarantined,
                quality_passed: report.quality_passed,
            });
            context.datasets.push(report);
        }
        Ok(())
    }
}
