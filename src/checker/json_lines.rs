//! Line-level schema validation of extracted records

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::dataset::{Dataset, FieldKind, FieldSpec};
use crate::extractor::{json_type_name, ExtractedLines, JsonLine};
use crate::table::FlatTable;

pub const LINE_NUMBER_COLUMN: &str = "LineNumber";
pub const RAW_LINE_COLUMN: &str = "RawLine";
pub const VALIDATION_ERRORS_COLUMN: &str = "ValidationErrors";

/// What was read from a line that failed validation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BrokenContent {
    Record(Map<String, Value>),
    Raw(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrokenLine {
    pub line_number: usize,
    pub content: BrokenContent,
    pub errors: Vec<String>,
}

/// Line counts of one checked dataset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckSummary {
    pub dataset: Dataset,
    pub total: usize,
    pub valid: usize,
    pub broken: usize,
    pub broken_lines: Vec<usize>,
}

#[derive(Debug, Clone)]
pub struct CheckedLines {
    pub dataset: Dataset,
    pub valid: Vec<JsonLine>,
    pub broken: Vec<BrokenLine>,
}

impl CheckedLines {
    pub fn total(&self) -> usize {
        self.valid.len() + self.broken.len()
    }

    pub fn summary(&self) -> CheckSummary {
        CheckSummary {
            dataset: self.dataset,
            total: self.total(),
            valid: self.valid.len(),
            broken: self.broken.len(),
            broken_lines: self.broken.iter().map(|b| b.line_number).collect(),
        }
    }

    /// Valid records in file order
    pub fn valid_records(&self) -> impl Iterator<Item = &Map<String, Value>> {
        self.valid.iter().map(|line| &line.record)
    }
}

/// Returns every violation of `fields` in `record`; empty when the record is valid
///
/// Every schema field must be present. Integers, strings and booleans must have
/// exactly that JSON type. Floats accept a number or a numeric string, and nullable
/// floats also accept an explicit null.
pub fn validate_record(fields: &[FieldSpec], record: &Map<String, Value>) -> Vec<String> {
    let mut errors = Vec::new();

    for field in fields {
        match record.get(field.name) {
            None => errors.push(format!("missing field {}", field.name)),
            Some(Value::Null) if field.nullable => {}
            Some(value) => {
                if !matches_kind(field.kind, value) {
                    errors.push(format!(
                        "field {}: expected {}, got {}",
                        field.name,
                        field.kind.as_str(),
                        json_type_name(value)
                    ));
                }
            }
        }
    }

    errors
}

fn matches_kind(kind: FieldKind, value: &Value) -> bool {
    match kind {
        FieldKind::Integer => value.is_i64() || value.is_u64(),
        FieldKind::String => value.is_string(),
        FieldKind::Boolean => value.is_boolean(),
        FieldKind::Float => float_value(value).is_some(),
    }
}

/// Numeric value of a float field: a JSON number or a string holding a finite number
///
/// ```
/// use data_pipeline::checker::json_lines::float_value;
/// use serde_json::json;
///
/// assert_eq!(float_value(&json!(2)), Some(2.0));
/// assert_eq!(float_value(&json!(" 2.5 ")), Some(2.5));
/// assert_eq!(float_value(&json!("26,4")), None);
/// ```
pub fn float_value(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|v| v.is_finite()),
        _ => None,
    }
}

/// Splits extracted lines into schema-valid and broken lines
pub fn check_json_lines(extracted: ExtractedLines) -> CheckedLines {
    let dataset = extracted.dataset;
    let fields = dataset.fields();

    let mut valid = Vec::with_capacity(extracted.lines.len());
    let mut broken: Vec<BrokenLine> = extracted
        .unparseable
        .into_iter()
        .map(|line| BrokenLine {
            line_number: line.line_number,
            content: BrokenContent::Raw(line.raw),
            errors: vec![line.error],
        })
        .collect();

    for line in extracted.lines {
        let errors = validate_record(fields, &line.record);
        if errors.is_empty() {
            valid.push(line);
        } else {
            debug!(dataset = %dataset, line = line.line_number, errors = ?errors, "Incorrect schema in JSON line");
            broken.push(BrokenLine {
                line_number: line.line_number,
                content: BrokenContent::Record(line.record),
                errors,
            });
        }
    }

    broken.sort_by_key(|line| line.line_number);

    if !broken.is_empty() {
        warn!(
            dataset = %dataset,
            valid = valid.len(),
            broken = broken.len(),
            "Lines failed schema validation"
        );
    }

    CheckedLines {
        dataset,
        valid,
        broken,
    }
}

/// Tabulates broken lines for the quarantine file
///
/// Columns: `LineNumber`, every record key in first-seen order (`RawLine` for lines
/// that were not JSON objects), then `ValidationErrors`.
pub fn quarantine_table(broken: &[BrokenLine]) -> FlatTable {
    let mut data_columns: Vec<String> = Vec::new();
    for line in broken {
        let keys: Vec<&str> = match &line.content {
            BrokenContent::Record(record) => record.keys().map(String::as_str).collect(),
            BrokenContent::Raw(_) => vec![RAW_LINE_COLUMN],
        };
        for key in keys {
            if !data_columns.iter().any(|c| c == key) {
                data_columns.push(key.to_string());
            }
        }
    }

    let mut columns = vec![LINE_NUMBER_COLUMN.to_string()];
    columns.extend(data_columns.iter().cloned());
    columns.push(VALIDATION_ERRORS_COLUMN.to_string());

    let mut table = FlatTable::new(columns);
    for line in broken {
        let mut row = vec![Value::from(line.line_number)];
        for column in &data_columns {
            let cell = match &line.content {
                BrokenContent::Record(record) => record.get(column).cloned().unwrap_or(Value::Null),
                BrokenContent::Raw(raw) if column == RAW_LINE_COLUMN => Value::String(raw.clone()),
                BrokenContent::Raw(_) => Value::Null,
            };
            row.push(cell);
        }
        row.push(Value::String(line.errors.join("; ")));
        table.push_row(row);
    }

    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractor::{parse_json_lines, ExtractedLines};
    use serde_json::json;
    use std::path::PathBuf;

    fn extracted(dataset: Dataset, content: &str) -> ExtractedLines {
        let (lines, unparseable) = parse_json_lines(content);
        ExtractedLines {
            dataset,
            source: PathBuf::from("raw"),
            lines,
            unparseable,
        }
    }

    fn record(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_valid_sale_passes() {
        let errors = validate_record(
            Dataset::Sales.fields(),
            &record(json!({"SaleId": 1, "OrderId": 2, "ProductId": 3, "Quantity": 4})),
        );
        assert!(errors.is_empty());
    }

    #[test]
    fn test_integers_are_strict() {
        let errors = validate_record(
            Dataset::Sales.fields(),
            &record(json!({"SaleId": "1", "OrderId": 2.5, "ProductId": true})),
        );
        assert_eq!(
            errors,
            vec![
                "field SaleId: expected integer, got string",
                "field OrderId: expected integer, got float",
                "field ProductId: expected integer, got boolean",
                "missing field Quantity",
            ]
        );
    }

    fn country(indicator: Value) -> Value {
        let mut value = json!({
            "Country": "IT", "Currency": "EUR", "Name": "Italy",
            "Region": "Europe", "Population": 58_000_000
        });
        for field in Dataset::Countries.fields().iter().filter(|f| f.nullable) {
            value[field.name] = indicator.clone();
        }
        value
    }

    #[test]
    fn test_nullable_floats_accept_null_integers_and_numeric_strings() {
        let mut value = country(Value::Null);
        value["AreaSqMi"] = json!(301230);
        value["Literacy"] = json!("98.6");
        value["Climate"] = json!(" 3 ");
        let errors = validate_record(Dataset::Countries.fields(), &record(value.clone()));
        assert!(errors.is_empty(), "{:?}", errors);

        value["Arable"] = json!("26,4");
        value["Crops"] = json!(true);
        let errors = validate_record(Dataset::Countries.fields(), &record(value));
        assert_eq!(
            errors,
            vec![
                "field Arable: expected float, got string",
                "field Crops: expected float, got boolean",
            ]
        );
    }

    #[test]
    fn test_every_indicator_as_numeric_string_passes() {
        let errors = validate_record(Dataset::Countries.fields(), &record(country(json!("2.5"))));
        assert!(errors.is_empty(), "{:?}", errors);
    }

    #[test]
    fn test_absent_nullable_floats_are_missing() {
        let value = json!({
            "Country": "IT", "Currency": "EUR", "Name": "Italy",
            "Region": "Europe", "Population": 58_000_000
        });
        let errors = validate_record(Dataset::Countries.fields(), &record(value));
        assert_eq!(errors.len(), 17);
        assert_eq!(errors[0], "missing field AreaSqMi");
        assert_eq!(errors[16], "missing field Service");
    }

    #[test]
    fn test_non_finite_strings_are_not_floats() {
        assert_eq!(float_value(&json!("NaN")), None);
        assert_eq!(float_value(&json!("inf")), None);
        assert_eq!(float_value(&json!("")), None);
        assert_eq!(float_value(&Value::Null), None);
    }

    #[test]
    fn test_required_fields_reject_null() {
        let errors = validate_record(
            Dataset::Orders.fields(),
            &record(json!({"OrderId": 1, "CustomerId": 2, "Date": null})),
        );
        assert_eq!(errors, vec!["field Date: expected string, got null"]);
    }

    #[test]
    fn test_check_splits_valid_and_broken_in_line_order() {
        let content = concat!(
            "{\"OrderId\": 1, \"CustomerId\": 1, \"Date\": \"2023-01-01\"},\n",
            "{\"OrderId\": \"x\", \"CustomerId\": 1, \"Date\": \"2023-01-01\"},\n",
            "garbage\n",
            "{\"OrderId\": 3, \"CustomerId\": 1, \"Date\": \"2023-01-03\"}\n",
        );
        let checked = check_json_lines(extracted(Dataset::Orders, content));

        assert_eq!(checked.total(), 4);
        assert_eq!(checked.valid.len(), 2);
        assert_eq!(
            checked.broken.iter().map(|b| b.line_number).collect::<Vec<_>>(),
            vec![2, 3]
        );
        assert!(matches!(checked.broken[1].content, BrokenContent::Raw(_)));

        let summary = checked.summary();
        assert_eq!(summary.broken, 2);
        assert_eq!(summary.broken_lines, vec![2, 3]);
    }

    #[test]
    fn test_quarantine_table_layout() {
        let content = concat!(
            "{\"SaleId\": \"a\", \"OrderId\": 1, \"ProductId\": 1, \"Quantity\": 1}\n",
            "oops\n",
        );
        let checked = check_json_lines(extracted(Dataset::Sales, content));
        let table = quarantine_table(&checked.broken);

        assert_eq!(
            table.columns,
            vec![
                LINE_NUMBER_COLUMN,
                "SaleId",
                "OrderId",
                "ProductId",
                "Quantity",
                RAW_LINE_COLUMN,
                VALIDATION_ERRORS_COLUMN
            ]
        );
        assert_eq!(table.row_count(), 2);
        assert_eq!(table.rows[1][5], json!("oops"));
        assert_eq!(table.rows[0][5], Value::Null);
        assert_eq!(table.rows[0][6], json!("field SaleId: expected integer, got string"));
    }

    #[test]
    fn test_empty_quarantine_has_header_only() {
        let table = quarantine_table(&[]);
        assert_eq!(table.columns, vec![LINE_NUMBER_COLUMN, VALIDATION_ERRORS_COLUMN]);
        assert!(table.is_empty());
    }
}
