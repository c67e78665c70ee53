use crate::curator::CURATED_DATA_FOLDER;
use crate::dataset::Dataset;
use crate::pipeline::context::{ConsumableReport, RunContext};
use crate::pipeline::phase_trait::WorkflowPhase;
use crate::profiler::write_data_profile_report;
use crate::storage::{
    read_data_from_file, write_data_to_file, FileType, ANALYTICS_BASE_TABLE,
    CONSUMABLE_DATA_FOLDER,
};
use crate::table::FlatTable;
use crate::transformer::create_consumable_flat_structure;
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::Path;

/// Builds the analytics base table from the latest curated files
pub struct TransformPhase;

/// Latest curated table of `dataset`; an empty file yields an empty table with the schema columns
pub fn read_curated(data_root: &Path, dataset: Dataset) -> Result<FlatTable> {
    let mut table = read_data_from_file(
        data_root,
        CURATED_DATA_FOLDER,
        dataset.name(),
        FileType::JsonLines,
    )
    .with_context(|| format!("Failed to read curated {}", dataset))?;
    table.ensure_columns(&dataset.curated_columns());
    Ok(table)
}

#[async_trait]
impl WorkflowPhase for TransformPhase {
    fn name(&self) -> &'static str {
        "TransformPhase"
    }

    async fn execute(&self, context: &mut RunContext) -> Result<()> {
        let config = &context.config;
        let data_root = config.data_root.as_path();

        let curated = Dataset::ALL
            .iter()
            .map(|&dataset| Ok((dataset, read_curated(data_root, dataset)?)))
            .collect::<Result<BTreeMap<_, _>>>()?;

        let consumable =
            create_consumable_flat_structure(curated, &config.consumable_columns, &config.currencies)
                .context("Failed to build the analytics base table")?;

        let path = write_data_to_file(
            &consumable,
            data_root,
            CONSUMABLE_DATA_FOLDER,
            ANALYTICS_BASE_TABLE,
            FileType::JsonLines,
            &context.prefix,
        )?;

        let profile_path = if config.profiles_enabled {
            Some(write_data_profile_report(
                &consumable,
                data_root,
                ANALYTICS_BASE_TABLE,
                &context.prefix,
                context.started_at,
            )?)
        } else {
            None
        };

        context.consumable = Some(ConsumableReport {
            rows: consumable.row_count(),
            columns: consumable.column_count(),
            path,
            profile_path,
        });
        Ok(())
    }
}
