//! In-memory flat table used between pipeline stages
//!
//! A [`FlatTable`] is a row-major table with named, ordered columns whose cells are
//! JSON values. It carries exactly the relational operations the pipeline needs:
//! projection, renaming, computed columns, left joins and grouped sums.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};
use std::collections::HashMap;

use crate::error::{PipelineError, Result};

/// Suffix given to right-hand columns whose name already exists on the left side of a join
pub const JOIN_SUFFIX: &str = "_right";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FlatTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

impl FlatTable {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Builds a table whose columns are the union of record keys in first-seen order
    pub fn from_records<'a, I>(records: I) -> Self
    where
        I: IntoIterator<Item = &'a Map<String, Value>>,
    {
        let records: Vec<&Map<String, Value>> = records.into_iter().collect();
        let mut columns: Vec<String> = Vec::new();
        for record in &records {
            for key in record.keys() {
                if !columns.iter().any(|c| c == key) {
                    columns.push(key.clone());
                }
            }
        }
        Self::from_records_with_columns(records, &columns)
    }

    /// Builds a table projected onto `columns`; absent keys become null, extra keys are dropped
    pub fn from_records_with_columns<'a, I>(records: I, columns: &[String]) -> Self
    where
        I: IntoIterator<Item = &'a Map<String, Value>>,
    {
        let rows = records
            .into_iter()
            .map(|record| {
                columns
                    .iter()
                    .map(|c| record.get(c).cloned().unwrap_or(Value::Null))
                    .collect()
            })
            .collect();

        Self {
            columns: columns.to_vec(),
            rows,
        }
    }

    pub fn to_records(&self) -> Vec<Map<String, Value>> {
        self.rows
            .iter()
            .map(|row| {
                self.columns
                    .iter()
                    .cloned()
                    .zip(row.iter().cloned())
                    .collect()
            })
            .collect()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c == name)
    }

    pub fn column_index(&self, name: &str) -> Result<usize> {
        self.columns
            .iter()
            .position(|c| c == name)
            .ok_or_else(|| PipelineError::MissingColumn(name.to_string()))
    }

    pub fn column_values(&self, name: &str) -> Result<Vec<&Value>> {
        let idx = self.column_index(name)?;
        Ok(self.rows.iter().map(|row| &row[idx]).collect())
    }

    /// Appends a row, padding with nulls or truncating to the column count
    pub fn push_row(&mut self, mut row: Vec<Value>) {
        row.resize(self.columns.len(), Value::Null);
        self.rows.push(row);
    }

    pub fn rename(&mut self, from: &str, to: &str) -> Result<()> {
        let idx = self.column_index(from)?;
        self.columns[idx] = to.to_string();
        Ok(())
    }

    pub fn rename_all<F>(&mut self, f: F)
    where
        F: Fn(&str) -> String,
    {
        for column in &mut self.columns {
            *column = f(column);
        }
    }

    pub fn select<S: AsRef<str>>(&self, columns: &[S]) -> Result<FlatTable> {
        let indices = columns
            .iter()
            .map(|c| self.column_index(c.as_ref()))
            .collect::<Result<Vec<_>>>()?;

        Ok(FlatTable {
            columns: columns.iter().map(|c| c.as_ref().to_string()).collect(),
            rows: self
                .rows
                .iter()
                .map(|row| indices.iter().map(|&i| row[i].clone()).collect())
                .collect(),
        })
    }

    /// Adds every missing column from `columns`, filled with nulls
    pub fn ensure_columns<S: AsRef<str>>(&mut self, columns: &[S]) {
        for column in columns {
            let column = column.as_ref();
            if !self.has_column(column) {
                self.columns.push(column.to_string());
                for row in &mut self.rows {
                    row.push(Value::Null);
                }
            }
        }
    }

    /// Sets `name` to `f(row)` for every row, replacing the column if it exists
    pub fn with_column<F>(mut self, name: &str, f: F) -> Self
    where
        F: Fn(&[Value]) -> Value,
    {
        match self.columns.iter().position(|c| c == name) {
            Some(idx) => {
                for row in &mut self.rows {
                    let value = f(row);
                    row[idx] = value;
                }
            }
            None => {
                self.columns.push(name.to_string());
                for row in &mut self.rows {
                    let value = f(row);
                    row.push(value);
                }
            }
        }
        self
    }

    pub fn with_constant(self, name: &str, value: Value) -> Self {
        self.with_column(name, |_| value.clone())
    }

    /// Left join on `left_on == right_on`
    ///
    /// The right key column is dropped. Null keys never match. A left row matching
    /// several right rows is repeated once per match; an unmatched one gets nulls.
    pub fn left_join(&self, right: &FlatTable, left_on: &str, right_on: &str) -> Result<FlatTable> {
        let left_key = self.column_index(left_on)?;
        let right_key = right.column_index(right_on)?;

        let mut index: HashMap<String, Vec<usize>> = HashMap::new();
        for (i, row) in right.rows.iter().enumerate() {
            if let Some(key) = join_key(&row[right_key]) {
                index.entry(key).or_default().push(i);
            }
        }

        let right_columns: Vec<usize> = (0..right.columns.len()).filter(|&i| i != right_key).collect();

        let mut columns = self.columns.clone();
        for &i in &right_columns {
            let name = &right.columns[i];
            if columns.iter().any(|c| c == name) {
                columns.push(format!("{}{}", name, JOIN_SUFFIX));
            } else {
                columns.push(name.clone());
            }
        }

        let mut rows = Vec::with_capacity(self.rows.len());
        for row in &self.rows {
            let matches = join_key(&row[left_key]).and_then(|k| index.get(&k));
            match matches {
                Some(matched) => {
                    for &m in matched {
                        let mut joined = row.clone();
                        joined.extend(right_columns.iter().map(|&i| right.rows[m][i].clone()));
                        rows.push(joined);
                    }
                }
                None => {
                    let mut joined = row.clone();
                    joined.extend(right_columns.iter().map(|_| Value::Null));
                    rows.push(joined);
                }
            }
        }

        Ok(FlatTable { columns, rows })
    }

    /// Sums `value` per distinct combination of `keys`, in first-seen group order
    ///
    /// Null and non-numeric values contribute nothing; null keys form their own group.
    pub fn group_sum(&self, keys: &[&str], value: &str, alias: &str) -> Result<FlatTable> {
        let key_indices = keys
            .iter()
            .map(|k| self.column_index(k))
            .collect::<Result<Vec<_>>>()?;
        let value_idx = self.column_index(value)?;

        let mut order: Vec<Vec<Value>> = Vec::new();
        let mut sums: HashMap<String, f64> = HashMap::new();

        for row in &self.rows {
            let group: Vec<Value> = key_indices.iter().map(|&i| row[i].clone()).collect();
            let group_id = Value::Array(group.clone()).to_string();
            let entry = sums.entry(group_id).or_insert_with(|| {
                order.push(group);
                0.0
            });
            if let Some(v) = row[value_idx].as_f64() {
                *entry += v;
            }
        }

        let mut columns: Vec<String> = keys.iter().map(|k| k.to_string()).collect();
        columns.push(alias.to_string());

        let rows = order
            .into_iter()
            .map(|group| {
                let group_id = Value::Array(group.clone()).to_string();
                let total = sums.get(&group_id).copied().unwrap_or(0.0);
                let mut row = group;
                row.push(number_value(total));
                row
            })
            .collect();

        Ok(FlatTable { columns, rows })
    }

    /// Sum of the numeric cells of `column`
    pub fn sum(&self, column: &str) -> Result<f64> {
        let idx = self.column_index(column)?;
        Ok(self.rows.iter().filter_map(|row| row[idx].as_f64()).sum())
    }
}

fn join_key(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(format!("s:{}", s)),
        other => Some(other.to_string()),
    }
}

/// Converts a float into a JSON number, or null when it is not finite
pub fn number_value(value: f64) -> Value {
    Number::from_f64(value)
        .map(Value::Number)
        .unwrap_or(Value::Null)
}
