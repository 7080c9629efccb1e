//! Ledger catalog adapter.
//!
//! Flattens grouped master-data responses into searchable option lists and
//! loads all catalogs concurrently. Each catalog resolves or fails on its
//! own schedule; a failure is recorded and matching degrades instead of
//! blocking.

use async_trait::async_trait;
use futures::join;
use thiserror::Error;
use tracing::{instrument, warn};
use uuid::Uuid;

use crate::models::catalog::{
    CatalogKind, GroupedCatalogResponse, GroupedStockResponse, LedgerEntry, StockItem, TaxClass,
};

/// Isolated per-catalog load failure.
#[derive(Debug, Error)]
#[error("Failed to load {kind} catalog: {source}")]
pub struct CatalogError {
    pub kind: CatalogKind,
    #[source]
    pub source: anyhow::Error,
}

/// Provider of grouped master-data responses, one request per catalog kind.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    async fn load_ledgers(&self, kind: CatalogKind)
        -> Result<GroupedCatalogResponse, CatalogError>;

    async fn load_stock(&self) -> Result<GroupedStockResponse, CatalogError>;
}

/// Flatten a grouped ledger response into catalog order: group iteration
/// order, then list order. Empty or missing groups yield an empty list.
pub fn flatten_ledger_groups(response: &GroupedCatalogResponse) -> Vec<LedgerEntry> {
    let mut entries = Vec::new();
    for group in &response.groups {
        for record in &group.ledgers {
            entries.push(LedgerEntry {
                id: record.id,
                name: record.name.clone(),
                gst_number: record.gst_number.clone(),
                master_id: record.master_id,
                alter_id: record.alter_id,
                opening_balance: record.opening_balance,
                company: record.company.clone(),
                parent_group_name: group.parent_group_name.clone(),
            });
        }
    }
    entries
}

/// Stock analog of [`flatten_ledger_groups`].
pub fn flatten_stock_groups(response: &GroupedStockResponse) -> Vec<StockItem> {
    let mut items = Vec::new();
    for group in &response.groups {
        for record in &group.items {
            items.push(StockItem {
                id: record.id,
                name: record.name.clone(),
                alias: record.alias.clone(),
                unit: record.unit.clone(),
                category: record.category.clone(),
                parent: record.parent.clone(),
                gst_applicable: record.gst_applicable,
                parent_group_name: group.parent_group_name.clone(),
            });
        }
    }
    items
}

/// The catalogs available to one reconciliation run. `None` slots mark
/// catalogs that failed to load or were not requested.
#[derive(Debug, Default)]
pub struct CatalogSet {
    pub vendors: Option<Vec<LedgerEntry>>,
    pub cgst: Option<Vec<LedgerEntry>>,
    pub sgst: Option<Vec<LedgerEntry>>,
    pub igst: Option<Vec<LedgerEntry>>,
    pub chart_of_accounts: Option<Vec<LedgerEntry>>,
    pub stock: Option<Vec<StockItem>>,
    pub failures: Vec<CatalogError>,
}

impl CatalogSet {
    /// Request every catalog concurrently and independently. Failures are
    /// isolated per catalog; the returned set always covers whatever loaded.
    #[instrument(skip(source))]
    pub async fn load(source: &dyn CatalogSource, include_stock: bool) -> CatalogSet {
        let (vendors, cgst, sgst, igst, chart_of_accounts) = join!(
            source.load_ledgers(CatalogKind::Vendor),
            source.load_ledgers(CatalogKind::Tax(TaxClass::Cgst)),
            source.load_ledgers(CatalogKind::Tax(TaxClass::Sgst)),
            source.load_ledgers(CatalogKind::Tax(TaxClass::Igst)),
            source.load_ledgers(CatalogKind::ChartOfAccounts),
        );

        let mut failures = Vec::new();
        let mut set = CatalogSet {
            vendors: record_ledgers(vendors, &mut failures),
            cgst: record_ledgers(cgst, &mut failures),
            sgst: record_ledgers(sgst, &mut failures),
            igst: record_ledgers(igst, &mut failures),
            chart_of_accounts: record_ledgers(chart_of_accounts, &mut failures),
            stock: None,
            failures,
        };

        if include_stock {
            match source.load_stock().await {
                Ok(response) => set.stock = Some(flatten_stock_groups(&response)),
                Err(err) => {
                    warn!(catalog = %err.kind, error = %err, "Catalog load failed, matching degraded");
                    set.failures.push(err);
                }
            }
        }

        set
    }

    pub fn tax(&self, class: TaxClass) -> Option<&[LedgerEntry]> {
        match class {
            TaxClass::Cgst => self.cgst.as_deref(),
            TaxClass::Sgst => self.sgst.as_deref(),
            TaxClass::Igst => self.igst.as_deref(),
        }
    }

    /// Look up a tax ledger's display name by id, when that catalog loaded.
    pub fn tax_ledger_name(&self, class: TaxClass, ledger_id: Uuid) -> Option<&str> {
        self.tax(class)?
            .iter()
            .find(|entry| entry.id == ledger_id)
            .map(|entry| entry.name.as_str())
    }

    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }
}

fn record_ledgers(
    result: Result<GroupedCatalogResponse, CatalogError>,
    failures: &mut Vec<CatalogError>,
) -> Option<Vec<LedgerEntry>> {
    match result {
        Ok(response) => Some(flatten_ledger_groups(&response)),
        Err(err) => {
            warn!(catalog = %err.kind, error = %err, "Catalog load failed, matching degraded");
            failures.push(err);
            None
        }
    }
}
