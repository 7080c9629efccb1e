//! Domain models for bill-service.

pub mod bill;
pub mod catalog;
pub mod draft;

pub use bill::{
    AnalysedBill, AnalysedLineItem, AnalysedTaxSummary, BillHeader, BillStatus, Direction,
    DocumentKind, LineItem, TaxSummary, TaxType, VendorRef,
};
pub use catalog::{
    CatalogGroup, CatalogKind, GroupedCatalogResponse, GroupedStockResponse, LedgerEntry,
    RawLedgerRecord, RawStockRecord, StockGroup, StockItem, TaxClass,
};
pub use draft::{Draft, FieldKey, FieldState, LineTaxTotals};
