//! End-to-end pipeline tests
//!
//! Runs the orchestrator over the fixture raw files and checks every output folder:
//! - quarantine CSVs with the broken lines
//! - curated JSON-lines tables and their validation reports
//! - data profiles
//! - the analytics base table and its derived features

mod support;

use data_pipeline::checker::VALIDATION_RESULTS_FOLDER;
use data_pipeline::curator::CURATED_DATA_FOLDER;
use data_pipeline::dataset::{Dataset, CREATED_TIMESTAMP_COLUMN};
use data_pipeline::pipeline::phases::read_curated;
use data_pipeline::pipeline::{PipelineOrchestrator, RunContext, RunSummary};
use data_pipeline::profiler::DATA_PROFILES_FOLDER;
use data_pipeline::storage::{
    read_data_from_file, FileType, ANALYTICS_BASE_TABLE, CONSUMABLE_DATA_FOLDER,
    QUARANTINE_DATA_FOLDER,
};
use data_pipeline::table::FlatTable;
use data_pipeline::transformer::{
    COUNTRY_QUANTITY_SHARE_COLUMN, COUNTRY_SHARE_COLUMN, DEFAULT_CONSUMABLE_COLUMNS,
    MAIN_COUNTRIES_SHARE_COLUMN, TOTAL_PER_COUNTRY_COLUMN, WEIGHT_PER_QUANTITY_COLUMN,
};
use serde_json::{json, Value};
use std::fs;
use std::path::Path;
use support::{files_in, fixture_data_root, test_config};

async fn run(data_root: &Path) -> RunSummary {
    let mut context = RunContext::new(test_config(data_root)).skip_readiness(true);
    PipelineOrchestrator::new()
        .execute(&mut context)
        .await
        .expect("Pipeline run failed")
}

fn abt(data_root: &Path) -> FlatTable {
    read_data_from_file(
        data_root,
        CONSUMABLE_DATA_FOLDER,
        ANALYTICS_BASE_TABLE,
        FileType::JsonLines,
    )
    .expect("Analytics base table missing")
}

fn floats(table: &FlatTable, column: &str) -> Vec<Option<f64>> {
    table
        .column_values(column)
        .unwrap()
        .into_iter()
        .map(Value::as_f64)
        .collect()
}

#[tokio::test]
async fn test_run_reports_every_dataset() {
    let dir = fixture_data_root();
    let summary = run(dir.path()).await;

    let datasets: Vec<Dataset> = summary.datasets.iter().map(|r| r.dataset).collect();
    assert_eq!(datasets, Dataset::ALL.to_vec());
    assert_eq!(summary.database_attempts, None);

    let counts: Vec<(usize, usize, usize)> = summary
        .datasets
        .iter()
        .map(|r| (r.extracted, r.valid, r.quarantined))
        .collect();
    assert_eq!(
        counts,
        vec![(5, 4, 1), (2, 2, 0), (5, 4, 1), (5, 4, 1), (3, 3, 0)]
    );
    assert_eq!(summary.quarantined(), 3);
}

#[tokio::test]
async fn test_countries_with_missing_indicators_fail_quality_only() {
    let dir = fixture_data_root();
    let summary = run(dir.path()).await;

    for report in &summary.datasets {
        let expected = report.dataset != Dataset::Countries;
        assert_eq!(report.quality_passed, expected, "{}", report.dataset);
    }
    assert!(!summary.quality_passed());
    assert!(summary.consumable.is_some());
}

#[tokio::test]
async fn test_outputs_share_the_run_prefix() {
    let dir = fixture_data_root();
    let summary = run(dir.path()).await;
    let root = dir.path();

    for folder in [
        QUARANTINE_DATA_FOLDER,
        CURATED_DATA_FOLDER,
        VALIDATION_RESULTS_FOLDER,
        DATA_PROFILES_FOLDER,
    ] {
        assert!(files_in(root, folder).len() >= 5, "{} incomplete", folder);
    }
    assert_eq!(files_in(root, CONSUMABLE_DATA_FOLDER).len(), 1);

    let consumable = summary.consumable.unwrap();
    assert!(consumable.path.exists());
    let name = consumable.path.file_name().unwrap().to_string_lossy().into_owned();
    assert!(name.ends_with("_analytics_base_table.jsonl"));
    assert!(consumable.profile_path.unwrap().exists());

    let sales = &summary.datasets[0];
    let prefix = name.trim_end_matches("_analytics_base_table.jsonl");
    assert!(sales
        .curated_path
        .to_string_lossy()
        .ends_with(&format!("{}_sales.jsonl", prefix)));
}

#[tokio::test]
async fn test_quarantine_keeps_line_numbers_and_raw_lines() {
    let dir = fixture_data_root();
    let summary = run(dir.path()).await;

    let sales_csv = fs::read_to_string(&summary.datasets[0].quarantine_path).unwrap();
    let header = sales_csv.lines().next().unwrap();
    assert!(header.contains("LineNumber"));
    assert!(header.contains("ValidationErrors"));
    assert!(sales_csv.contains("three"));
    assert!(sales_csv.contains("Quantity"));

    let customers_csv = fs::read_to_string(&summary.datasets[3].quarantine_path).unwrap();
    assert!(customers_csv.contains("RawLine"));
    assert!(customers_csv.contains("invalid JSON"));

    let products_csv = fs::read_to_string(&summary.datasets[1].quarantine_path).unwrap();
    assert_eq!(products_csv.lines().filter(|l| !l.is_empty()).count(), 1);
}

#[tokio::test]
async fn test_curated_tables_normalize_country_headers() {
    let dir = fixture_data_root();
    run(dir.path()).await;

    let countries = read_curated(dir.path(), Dataset::Countries).unwrap();
    assert_eq!(countries.columns, Dataset::Countries.curated_columns());
    assert_eq!(countries.row_count(), 3);
    assert_eq!(
        floats(&countries, "GDPPerCapita"),
        vec![Some(26700.0), Some(27700.0), None]
    );
    assert_eq!(
        floats(&countries, "CoastlineCoastPerAreaRatio"),
        vec![Some(2.52), Some(5.08), None]
    );
    // GB ships Climate as the string "3"
    assert_eq!(
        floats(&countries, "Climate"),
        vec![Some(3.0), Some(3.0), None]
    );

    let timestamps = countries.column_values(CREATED_TIMESTAMP_COLUMN).unwrap();
    assert!(timestamps.iter().all(|t| t.as_str().is_some_and(|s| s.ends_with('Z'))));
}

#[tokio::test]
async fn test_analytics_base_table_features() {
    let dir = fixture_data_root();
    run(dir.path()).await;

    let table = abt(dir.path());
    assert_eq!(table.columns, DEFAULT_CONSUMABLE_COLUMNS);
    assert_eq!(table.row_count(), 4);

    let ids: Vec<Value> = table.column_values("SaleId").unwrap().into_iter().cloned().collect();
    assert_eq!(ids, vec![json!(1), json!(2), json!(3), json!(5)]);

    let countries: Vec<Value> = table
        .column_values("CountryName")
        .unwrap()
        .into_iter()
        .cloned()
        .collect();
    assert_eq!(
        countries,
        vec![
            json!("Italy"),
            json!("United Kingdom"),
            json!("Switzerland"),
            json!("Italy")
        ]
    );

    assert_eq!(
        floats(&table, TOTAL_PER_COUNTRY_COLUMN),
        vec![Some(10.0), Some(6.0), Some(4.0), Some(10.0)]
    );
    assert_eq!(
        floats(&table, COUNTRY_SHARE_COLUMN),
        vec![Some(0.5), Some(0.3), Some(0.2), Some(0.5)]
    );
    assert_eq!(
        floats(&table, COUNTRY_QUANTITY_SHARE_COLUMN),
        vec![Some(0.2), Some(1.0), Some(1.0), Some(0.8)]
    );
    assert_eq!(
        floats(&table, MAIN_COUNTRIES_SHARE_COLUMN),
        vec![Some(0.125), Some(0.375), Some(0.25), Some(0.5)]
    );
    assert_eq!(
        floats(&table, WEIGHT_PER_QUANTITY_COLUMN),
        vec![Some(15.0), Some(5.0), Some(30.0), Some(15.0)]
    );
}

#[tokio::test]
async fn test_second_run_reads_latest_curated_files() {
    let dir = fixture_data_root();
    run(dir.path()).await;

    fs::write(
        dir.path().join("raw_data/sales.json"),
        "{\"SaleId\": 9, \"OrderId\": 10, \"ProductId\": 100, \"Quantity\": 1}\n",
    )
    .unwrap();
    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    let summary = run(dir.path()).await;

    assert_eq!(summary.consumable.as_ref().unwrap().rows, 1);
    assert_eq!(files_in(dir.path(), CONSUMABLE_DATA_FOLDER).len(), 2);

    let table = abt(dir.path());
    assert_eq!(table.column_values("SaleId").unwrap(), vec![&json!(9)]);
    assert_eq!(floats(&table, COUNTRY_SHARE_COLUMN), vec![Some(1.0)]);
}

#[tokio::test]
async fn test_profiles_can_be_disabled() {
    let dir = fixture_data_root();
    let mut config = test_config(dir.path());
    config.profiles_enabled = false;

    let mut context = RunContext::new(config).skip_readiness(true);
    let summary = PipelineOrchestrator::new().execute(&mut context).await.unwrap();

    assert!(summary.datasets.iter().all(|r| r.profile_path.is_none()));
    assert!(files_in(dir.path(), DATA_PROFILES_FOLDER).is_empty());
    assert!(summary.consumable.unwrap().profile_path.is_none());
}

#[tokio::test]
async fn test_custom_consumable_columns() {
    let dir = fixture_data_root();
    let mut config = test_config(dir.path());
    config.consumable_columns = vec!["SaleId".to_string(), "CountryCurrency".to_string()];

    let mut context = RunContext::new(config).skip_readiness(true);
    let summary = PipelineOrchestrator::new().execute(&mut context).await.unwrap();
    assert_eq!(summary.consumable.unwrap().columns, 2);

    let table = abt(dir.path());
    assert_eq!(table.columns, vec!["SaleId", "CountryCurrency"]);
    assert_eq!(
        table.column_values("CountryCurrency").unwrap(),
        vec![&json!("EUR"), &json!("GBP"), &json!("CHF"), &json!("EUR")]
    );
}
