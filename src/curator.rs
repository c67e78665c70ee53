//! Curated table construction

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::Value;
use tracing::debug;

use crate::checker::{float_value, CheckedLines};
use crate::dataset::{Dataset, FieldKind, CREATED_TIMESTAMP_COLUMN};
use crate::table::{number_value, FlatTable};

pub const CURATED_DATA_FOLDER: &str = "curated_data";

/// Projects valid records onto the dataset schema and stamps them with `created_at`
///
/// Keys outside the schema are dropped and numeric strings in float fields are stored
/// as numbers.
pub fn create_curated_flat_structure(
    dataset: Dataset,
    checked: &CheckedLines,
    created_at: DateTime<Utc>,
) -> FlatTable {
    let schema: Vec<String> = dataset.field_names().iter().map(|f| f.to_string()).collect();
    let stamp = Value::String(created_at.to_rfc3339_opts(SecondsFormat::Micros, true));

    let mut table = FlatTable::from_records_with_columns(checked.valid_records(), &schema);
    for (idx, field) in dataset.fields().iter().enumerate() {
        if field.kind != FieldKind::Float {
            continue;
        }
        for row in &mut table.rows {
            if row[idx].is_string() {
                row[idx] = float_value(&row[idx]).map(number_value).unwrap_or(Value::Null);
            }
        }
    }
    let table = table.with_constant(CREATED_TIMESTAMP_COLUMN, stamp);

    debug!(dataset = %dataset, rows = table.row_count(), "Curated flat structure created");
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checker::check_json_lines;
    use crate::extractor::{parse_json_lines, ExtractedLines};
    use chrono::TimeZone;
    use serde_json::json;
    use std::path::PathBuf;

    fn checked(dataset: Dataset, content: &str) -> CheckedLines {
        let (lines, unparseable) = parse_json_lines(content);
        check_json_lines(ExtractedLines {
            dataset,
            source: PathBuf::from("raw"),
            lines,
            unparseable,
        })
    }

    #[test]
    fn test_curated_columns_and_timestamp() {
        let lines = checked(
            Dataset::Products,
            "{\"ProductId\": 1, \"Name\": \"Pen\", \"ManufacturedCountry\": \"IT\", \"WeightGrams\": 12, \"Colour\": \"blue\"},\n",
        );
        let created_at = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let table = create_curated_flat_structure(Dataset::Products, &lines, created_at);

        assert_eq!(table.columns, Dataset::Products.curated_columns());
        assert_eq!(
            table.rows[0],
            vec![
                json!(1),
                json!("Pen"),
                json!("IT"),
                json!(12),
                json!("2024-03-01T12:00:00.000000Z")
            ]
        );
    }

    fn country_line(indicators: &[(&str, Value)]) -> String {
        let mut value = json!({
            "Country": "IT", "Currency": "EUR", "Name": "Italy",
            "Region": "Europe", "Population": 1
        });
        for field in Dataset::Countries.fields().iter().filter(|f| f.nullable) {
            value[field.name] = Value::Null;
        }
        for (name, indicator) in indicators {
            value[*name] = indicator.clone();
        }
        format!("{}\n", value)
    }

    #[test]
    fn test_numeric_strings_are_stored_as_numbers() {
        let lines = checked(
            Dataset::Countries,
            &country_line(&[("AreaSqMi", json!("301230")), ("Literacy", json!(" 98.6 "))]),
        );
        let table = create_curated_flat_structure(Dataset::Countries, &lines, Utc::now());

        assert_eq!(table.column_values("AreaSqMi").unwrap(), vec![&json!(301230.0)]);
        assert_eq!(table.column_values("Literacy").unwrap(), vec![&json!(98.6)]);
        assert_eq!(table.column_values("Climate").unwrap(), vec![&Value::Null]);
    }

    #[test]
    fn test_countries_without_indicators_are_not_curated() {
        let lines = checked(
            Dataset::Countries,
            "{\"Country\": \"IT\", \"Currency\": \"EUR\", \"Name\": \"Italy\", \"Region\": \"Europe\", \"Population\": 1}\n",
        );
        assert_eq!(lines.broken.len(), 1);
        let table = create_curated_flat_structure(Dataset::Countries, &lines, Utc::now());
        assert!(table.is_empty());
    }

    #[test]
    fn test_broken_lines_are_not_curated() {
        let lines = checked(
            Dataset::Orders,
            "{\"OrderId\": 1, \"CustomerId\": 1, \"Date\": \"2023-01-01\"}\n{\"OrderId\": \"2\"}\n",
        );
        let table = create_curated_flat_structure(Dataset::Orders, &lines, Utc::now());
        assert_eq!(table.row_count(), 1);
    }
}
