//! Raw datasets and their line schemas

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Column holding the curation timestamp, added to every curated table
pub const CREATED_TIMESTAMP_COLUMN: &str = "CreatedTimeStamp";

/// Expected JSON type of a field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Integer,
    String,
    Boolean,
    Float,
}

impl FieldKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldKind::Integer => "integer",
            FieldKind::String => "string",
            FieldKind::Boolean => "boolean",
            FieldKind::Float => "float",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
    pub nullable: bool,
}

const fn required(name: &'static str, kind: FieldKind) -> FieldSpec {
    FieldSpec {
        name,
        kind,
        nullable: false,
    }
}

const fn nullable_float(name: &'static str) -> FieldSpec {
    FieldSpec {
        name,
        kind: FieldKind::Float,
        nullable: true,
    }
}

const SALES_FIELDS: &[FieldSpec] = &[
    required("SaleId", FieldKind::Integer),
    required("OrderId", FieldKind::Integer),
    required("ProductId", FieldKind::Integer),
    required("Quantity", FieldKind::Integer),
];

const PRODUCTS_FIELDS: &[FieldSpec] = &[
    required("ProductId", FieldKind::Integer),
    required("Name", FieldKind::String),
    required("ManufacturedCountry", FieldKind::String),
    required("WeightGrams", FieldKind::Integer),
];

const ORDERS_FIELDS: &[FieldSpec] = &[
    required("OrderId", FieldKind::Integer),
    required("CustomerId", FieldKind::Integer),
    required("Date", FieldKind::String),
];

const CUSTOMERS_FIELDS: &[FieldSpec] = &[
    required("CustomerId", FieldKind::Integer),
    required("Active", FieldKind::Boolean),
    required("Name", FieldKind::String),
    required("Address", FieldKind::String),
    required("City", FieldKind::String),
    required("Country", FieldKind::String),
    required("Email", FieldKind::String),
];

const COUNTRIES_FIELDS: &[FieldSpec] = &[
    required("Country", FieldKind::String),
    required("Currency", FieldKind::String),
    required("Name", FieldKind::String),
    required("Region", FieldKind::String),
    required("Population", FieldKind::Integer),
    nullable_float("AreaSqMi"),
    nullable_float("PopDensityPerSqMi"),
    nullable_float("CoastlineCoastPerAreaRatio"),
    nullable_float("NetMigration"),
    nullable_float("InfantMortalityPer1000Births"),
    nullable_float("GDPPerCapita"),
    nullable_float("Literacy"),
    nullable_float("PhonesPer1000"),
    nullable_float("Arable"),
    nullable_float("Crops"),
    nullable_float("Other"),
    nullable_float("Climate"),
    nullable_float("Birthrate"),
    nullable_float("Deathrate"),
    nullable_float("Agriculture"),
    nullable_float("Industry"),
    nullable_float("Service"),
];

/// One of the five raw input files
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dataset {
    Sales,
    Products,
    Orders,
    Customers,
    Countries,
}

impl Dataset {
    /// Processing order; sales first, lookup tables after
    pub const ALL: [Dataset; 5] = [
        Dataset::Sales,
        Dataset::Products,
        Dataset::Orders,
        Dataset::Customers,
        Dataset::Countries,
    ];

    /// File stem of the raw input and of every output derived from it
    pub fn name(&self) -> &'static str {
        match self {
            Dataset::Sales => "sales",
            Dataset::Products => "products",
            Dataset::Orders => "orders",
            Dataset::Customers => "customers",
            Dataset::Countries => "countries",
        }
    }

    pub fn fields(&self) -> &'static [FieldSpec] {
        match self {
            Dataset::Sales => SALES_FIELDS,
            Dataset::Products => PRODUCTS_FIELDS,
            Dataset::Orders => ORDERS_FIELDS,
            Dataset::Customers => CUSTOMERS_FIELDS,
            Dataset::Countries => COUNTRIES_FIELDS,
        }
    }

    pub fn field_names(&self) -> Vec<&'static str> {
        self.fields().iter().map(|f| f.name).collect()
    }

    /// Schema fields followed by the curation timestamp
    pub fn curated_columns(&self) -> Vec<String> {
        self.fields()
            .iter()
            .map(|f| f.name.to_string())
            .chain(std::iter::once(CREATED_TIMESTAMP_COLUMN.to_string()))
            .collect()
    }

    /// Singular, capitalized prefix used when columns of all datasets are joined
    pub fn column_prefix(&self) -> &'static str {
        match self {
            Dataset::Sales => "Sale",
            Dataset::Products => "Product",
            Dataset::Orders => "Order",
            Dataset::Customers => "Customer",
            Dataset::Countries => "Country",
        }
    }
}

impl fmt::Display for Dataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Dataset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Dataset::ALL
            .iter()
            .copied()
            .find(|d| d.name() == s.trim().to_lowercase())
            .ok_or_else(|| {
                format!(
                    "Unknown dataset: {}. Valid options: sales, products, orders, customers, countries",
                    s
                )
            })
    }
}
