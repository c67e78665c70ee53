//! Analytics base table construction
//!
//! Curated tables are prefixed with their dataset prefix, left-joined starting from
//! sales, enriched with per-country quantity totals and the derived features, and
//! finally projected onto the consumable columns.

use serde_json::Value;
use std::collections::BTreeMap;
use tracing::{debug, info};

use crate::dataset::Dataset;
use crate::error::Result;
use crate::table::{number_value, FlatTable};

/// Decimal places kept by derived features
pub const FEATURE_SCALE: i32 = 6;

pub const TOTAL_PER_COUNTRY_COLUMN: &str = "TotalSaleQuantityPerCountry";
pub const COUNTRY_SHARE_COLUMN: &str = "CountryQuantityOverTotalQuantityPercentage";
pub const COUNTRY_QUANTITY_SHARE_COLUMN: &str = "QuantityOverTotalCountryQuantityPercentage";
pub const MAIN_COUNTRIES_SHARE_COLUMN: &str = "QuantityOverMainCountriesQuantityPercentage";
pub const WEIGHT_PER_QUANTITY_COLUMN: &str = "ProductWeightGramsPerSaleQuantity";

pub const DEFAULT_CONSUMABLE_COLUMNS: &[&str] = &[
    "SaleId",
    "SaleOrderId",
    "SaleProductId",
    "SaleQuantity",
    "ProductName",
    "ProductManufacturedCountry",
    "ProductWeightGrams",
    "OrderCustomerId",
    "OrderDate",
    "CustomerName",
    "CustomerCity",
    "CustomerCountry",
    "CountryName",
    "CountryCurrency",
    "CountryRegion",
    TOTAL_PER_COUNTRY_COLUMN,
    COUNTRY_SHARE_COLUMN,
    COUNTRY_QUANTITY_SHARE_COLUMN,
    MAIN_COUNTRIES_SHARE_COLUMN,
    WEIGHT_PER_QUANTITY_COLUMN,
];

/// Joined lookups, as (right dataset, left key, right key)
const JOINS: &[(Dataset, &str, &str)] = &[
    (Dataset::Products, "SaleProductId", "ProductProductId"),
    (Dataset::Orders, "SaleOrderId", "OrderOrderId"),
    (Dataset::Customers, "OrderCustomerId", "CustomerCustomerId"),
    (Dataset::Countries, "CustomerCountry", "CountryCountry"),
];

/// Rounds to [`FEATURE_SCALE`] decimals; non-finite results become null
pub fn round_scale(value: f64) -> Value {
    let factor = 10f64.powi(FEATURE_SCALE);
    number_value((value * factor).round() / factor)
}

/// `numerator / denominator` at feature scale, null on a null operand or zero divisor
pub fn safe_divide(numerator: &Value, denominator: &Value) -> Value {
    match (numerator.as_f64(), denominator.as_f64()) {
        (Some(n), Some(d)) if d != 0.0 => round_scale(n / d),
        _ => Value::Null,
    }
}

fn prefixed(dataset: Dataset, mut table: FlatTable) -> Result<FlatTable> {
    let prefix = dataset.column_prefix();
    table.rename_all(|column| format!("{}{}", prefix, column));
    if dataset == Dataset::Sales {
        table.rename("SaleSaleId", "SaleId")?;
    }
    Ok(table)
}

/// Builds the analytics base table from the curated tables of all datasets
///
/// A dataset absent from `curated` is treated as an empty table with its curated columns.
pub fn create_consumable_flat_structure<S: AsRef<str>>(
    mut curated: BTreeMap<Dataset, FlatTable>,
    consumable_columns: &[S],
    currencies: &[String],
) -> Result<FlatTable> {
    let mut take = |dataset: Dataset| -> Result<FlatTable> {
        let table = curated
            .remove(&dataset)
            .unwrap_or_else(|| FlatTable::new(dataset.curated_columns()));
        prefixed(dataset, table)
    };

    let mut joined = take(Dataset::Sales)?;
    for &(dataset, left_on, right_on) in JOINS {
        joined = joined.left_join(&take(dataset)?, left_on, right_on)?;
    }
    debug!(rows = joined.row_count(), columns = joined.column_count(), "Curated tables joined");

    let totals = joined.group_sum(
        &["CountryName", "CountryCurrency"],
        "SaleQuantity",
        TOTAL_PER_COUNTRY_COLUMN,
    )?;
    let totals = totals.with_column(TOTAL_PER_COUNTRY_COLUMN, |row| {
        row[2].as_f64().map(round_scale).unwrap_or(Value::Null)
    });

    let total_quantity = number_value(joined.sum("SaleQuantity")?);
    let main_countries_quantity: f64 = totals
        .rows
        .iter()
        .filter(|row| {
            row[1]
                .as_str()
                .is_some_and(|currency| currencies.iter().any(|c| c == currency))
        })
        .filter_map(|row| row[2].as_f64())
        .sum();
    let main_countries_quantity = number_value(main_countries_quantity);

    let per_country = totals.select(&["CountryName", TOTAL_PER_COUNTRY_COLUMN])?;
    let joined = joined.left_join(&per_country, "CountryName", "CountryName")?;

    let quantity = joined.column_index("SaleQuantity")?;
    let per_country_total = joined.column_index(TOTAL_PER_COUNTRY_COLUMN)?;
    let weight = joined.column_index("ProductWeightGrams")?;

    let joined = joined
        .with_column(COUNTRY_SHARE_COLUMN, |row| {
            safe_divide(&row[per_country_total], &total_quantity)
        })
        .with_column(COUNTRY_QUANTITY_SHARE_COLUMN, |row| {
            safe_divide(&row[quantity], &row[per_country_total])
        })
        .with_column(MAIN_COUNTRIES_SHARE_COLUMN, |row| {
            safe_divide(&row[quantity], &main_countries_quantity)
        })
        .with_column(WEIGHT_PER_QUANTITY_COLUMN, |row| {
            safe_divide(&row[weight], &row[quantity])
        });

    let consumable = joined.select(consumable_columns)?;
    info!(
        rows = consumable.row_count(),
        columns = consumable.column_count(),
        "Consumable flat structure created"
    );
    Ok(consumable)
}
