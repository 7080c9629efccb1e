//! Ledger and stock catalog models.
//!
//! Master data arrives grouped by parent category; the catalog adapter in
//! `services::catalog` flattens it into the snapshot types below.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Tax class under the GST regime. Each class maps to its own ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaxClass {
    Cgst,
    Sgst,
    Igst,
}

impl TaxClass {
    pub const ALL: [TaxClass; 3] = [TaxClass::Cgst, TaxClass::Sgst, TaxClass::Igst];

    pub fn as_str(&self) -> &'static str {
        match self {
            TaxClass::Cgst => "cgst",
            TaxClass::Sgst => "sgst",
            TaxClass::Igst => "igst",
        }
    }
}

impl std::fmt::Display for TaxClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Kind of catalog a master-data request targets. Catalogs load independently
/// of each other; a failure in one never blocks matching against another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CatalogKind {
    Vendor,
    Tax(TaxClass),
    ChartOfAccounts,
    Stock,
}

impl CatalogKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CatalogKind::Vendor => "vendor",
            CatalogKind::Tax(class) => class.as_str(),
            CatalogKind::ChartOfAccounts => "chart_of_accounts",
            CatalogKind::Stock => "stock",
        }
    }
}

impl std::fmt::Display for CatalogKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Raw ledger record as it appears inside a grouped master-data response.
#[derive(Debug, Clone, Deserialize)]
pub struct RawLedgerRecord {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub gst_number: Option<String>,
    #[serde(default)]
    pub master_id: Option<i64>,
    #[serde(default)]
    pub alter_id: Option<i64>,
    #[serde(default)]
    pub opening_balance: Option<Decimal>,
    #[serde(default)]
    pub company: Option<String>,
}

/// One parent-category group of ledger records.
#[derive(Debug, Clone, Deserialize)]
pub struct CatalogGroup {
    pub parent_group_name: String,
    #[serde(default)]
    pub ledgers: Vec<RawLedgerRecord>,
}

/// Master-data response for one ledger catalog, grouped by parent category.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GroupedCatalogResponse {
    #[serde(default)]
    pub groups: Vec<CatalogGroup>,
}

/// Flat, searchable ledger entry. Immutable snapshot keyed by `id`;
/// `name` need not be unique across groups.
#[derive(Debug, Clone, Serialize)]
pub struct LedgerEntry {
    pub id: Uuid,
    pub name: String,
    pub gst_number: Option<String>,
    pub master_id: Option<i64>,
    pub alter_id: Option<i64>,
    pub opening_balance: Option<Decimal>,
    pub company: Option<String>,
    pub parent_group_name: String,
}

/// Raw stock record as it appears inside a grouped master-data response.
#[derive(Debug, Clone, Deserialize)]
pub struct RawStockRecord {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub alias: Option<String>,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub parent: Option<String>,
    #[serde(default)]
    pub gst_applicable: Option<bool>,
}

/// One parent-category group of stock records.
#[derive(Debug, Clone, Deserialize)]
pub struct StockGroup {
    pub parent_group_name: String,
    #[serde(default)]
    pub items: Vec<RawStockRecord>,
}

/// Master-data response for the stock catalog.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GroupedStockResponse {
    #[serde(default)]
    pub groups: Vec<StockGroup>,
}

/// Flat stock item snapshot.
#[derive(Debug, Clone, Serialize)]
pub struct StockItem {
    pub id: Uuid,
    pub name: String,
    pub alias: Option<String>,
    pub unit: Option<String>,
    pub category: Option<String>,
    pub parent: Option<String>,
    pub gst_applicable: Option<bool>,
    pub parent_group_name: String,
}
