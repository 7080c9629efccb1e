//! Bill domain models.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::catalog::{LedgerEntry, TaxClass};

/// Bill lifecycle status. Monotone forward except for explicit re-analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BillStatus {
    Draft,
    Analysed,
    Verified,
    Synced,
    Posted,
}

impl BillStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BillStatus::Draft => "draft",
            BillStatus::Analysed => "analysed",
            BillStatus::Verified => "verified",
            BillStatus::Synced => "synced",
            BillStatus::Posted => "posted",
        }
    }

    pub fn from_string(s: &str) -> Self {
        match s {
            "analysed" => BillStatus::Analysed,
            "verified" => BillStatus::Verified,
            "synced" => BillStatus::Synced,
            "posted" => BillStatus::Posted,
            _ => BillStatus::Draft,
        }
    }

    /// Draft fields may only be edited before verification.
    pub fn is_editable(&self) -> bool {
        matches!(self, BillStatus::Draft | BillStatus::Analysed)
    }

    pub fn is_verified_or_beyond(&self) -> bool {
        matches!(
            self,
            BillStatus::Verified | BillStatus::Synced | BillStatus::Posted
        )
    }
}

impl std::fmt::Display for BillStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Withholding regime of the bill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaxType {
    Tds,
    Tcs,
}

impl TaxType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaxType::Tds => "tds",
            TaxType::Tcs => "tcs",
        }
    }
}

/// Double-entry polarity of a line item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Debit,
    Credit,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Debit => "debit",
            Direction::Credit => "credit",
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Document style: a vendor/expense bill or a double-entry journal.
/// Journal entries additionally require an exact debit/credit balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    VendorBill,
    JournalEntry,
}

impl DocumentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentKind::VendorBill => "vendor_bill",
            DocumentKind::JournalEntry => "journal_entry",
        }
    }
}

/// Cached display fields of a matched vendor ledger. A reference by id into
/// the catalog, never a full copy of the entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VendorRef {
    pub ledger_id: Uuid,
    pub name: String,
    pub gst_number: Option<String>,
}

impl From<&LedgerEntry> for VendorRef {
    fn from(entry: &LedgerEntry) -> Self {
        Self {
            ledger_id: entry.id,
            name: entry.name.clone(),
            gst_number: entry.gst_number.clone(),
        }
    }
}

/// Bill header fields.
#[derive(Debug, Clone)]
pub struct BillHeader {
    pub bill_id: Uuid,
    pub bill_number: String,
    pub bill_date: NaiveDate,
    pub due_date: Option<NaiveDate>,
    /// Vendor name as extracted by the analysis stage.
    pub vendor_name: String,
    pub vendor_gst_number: Option<String>,
    pub selected_vendor: Option<VendorRef>,
    pub tax_type: TaxType,
}

/// One bill line. Ordered by insertion; `line_item_id` is process-unique and
/// never reused, so it stays a stable key across removals.
#[derive(Debug, Clone)]
pub struct LineItem {
    pub line_item_id: Uuid,
    pub item_id: Option<Uuid>,
    pub item_name: Option<String>,
    pub description: String,
    /// Account name suggested by the analysis stage, used as a matching hint.
    pub account_name: Option<String>,
    pub chart_of_accounts_id: Option<Uuid>,
    pub amount: Decimal,
    pub direction: Direction,
    pub tax_rate: Option<Decimal>,
    pub igst: Option<Decimal>,
    pub cgst: Option<Decimal>,
    pub sgst: Option<Decimal>,
}

/// Header-level tax amounts and their ledger assignments.
#[derive(Debug, Clone, Default)]
pub struct TaxSummary {
    pub cgst: Decimal,
    pub sgst: Decimal,
    pub igst: Decimal,
    pub cgst_ledger_id: Option<Uuid>,
    pub sgst_ledger_id: Option<Uuid>,
    pub igst_ledger_id: Option<Uuid>,
    pub total: Decimal,
}

impl TaxSummary {
    pub fn amount(&self, class: TaxClass) -> Decimal {
        match class {
            TaxClass::Cgst => self.cgst,
            TaxClass::Sgst => self.sgst,
            TaxClass::Igst => self.igst,
        }
    }

    pub fn ledger_id(&self, class: TaxClass) -> Option<Uuid> {
        match class {
            TaxClass::Cgst => self.cgst_ledger_id,
            TaxClass::Sgst => self.sgst_ledger_id,
            TaxClass::Igst => self.igst_ledger_id,
        }
    }

    pub fn set_ledger_id(&mut self, class: TaxClass, ledger_id: Option<Uuid>) {
        match class {
            TaxClass::Cgst => self.cgst_ledger_id = ledger_id,
            TaxClass::Sgst => self.sgst_ledger_id = ledger_id,
            TaxClass::Igst => self.igst_ledger_id = ledger_id,
        }
    }
}

/// Analysed-bill snapshot produced by the external OCR/analysis stage.
/// Read-only input contract; fetched once per bill open.
#[derive(Debug, Clone, Deserialize)]
pub struct AnalysedBill {
    pub bill_id: Uuid,
    pub bill_number: String,
    pub bill_date: NaiveDate,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    pub vendor_name: String,
    #[serde(default)]
    pub vendor_gst_number: Option<String>,
    /// Catalog id when the source payload already carries one.
    #[serde(default)]
    pub vendor_ledger_id: Option<Uuid>,
    pub tax_type: TaxType,
    pub document_kind: DocumentKind,
    #[serde(default)]
    pub line_items: Vec<AnalysedLineItem>,
    #[serde(default)]
    pub tax_summary: AnalysedTaxSummary,
    #[serde(default)]
    pub notes: String,
    pub status: BillStatus,
}

/// One analysed line, prior to human verification.
#[derive(Debug, Clone, Deserialize)]
pub struct AnalysedLineItem {
    #[serde(default)]
    pub item_id: Option<Uuid>,
    #[serde(default)]
    pub item_name: Option<String>,
    pub description: String,
    #[serde(default)]
    pub account_name: Option<String>,
    #[serde(default)]
    pub chart_of_accounts_id: Option<Uuid>,
    pub amount: Decimal,
    pub direction: Direction,
    #[serde(default)]
    pub tax_rate: Option<Decimal>,
    #[serde(default)]
    pub igst: Option<Decimal>,
    #[serde(default)]
    pub cgst: Option<Decimal>,
    #[serde(default)]
    pub sgst: Option<Decimal>,
}

/// Analysed tax summary, including per-class ledger hints from the source.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AnalysedTaxSummary {
    #[serde(default)]
    pub cgst: Decimal,
    #[serde(default)]
    pub sgst: Decimal,
    #[serde(default)]
    pub igst: Decimal,
    #[serde(default)]
    pub total: Decimal,
    #[serde(default)]
    pub cgst_ledger_id: Option<Uuid>,
    #[serde(default)]
    pub sgst_ledger_id: Option<Uuid>,
    #[serde(default)]
    pub igst_ledger_id: Option<Uuid>,
    #[serde(default)]
    pub cgst_ledger_name: Option<String>,
    #[serde(default)]
    pub sgst_ledger_name: Option<String>,
    #[serde(default)]
    pub igst_ledger_name: Option<String>,
}

impl AnalysedTaxSummary {
    pub fn ledger_id(&self, class: TaxClass) -> Option<Uuid> {
        match class {
            TaxClass::Cgst => self.cgst_ledger_id,
            TaxClass::Sgst => self.sgst_ledger_id,
            TaxClass::Igst => self.igst_ledger_id,
        }
    }

    pub fn ledger_name(&self, class: TaxClass) -> Option<&str> {
        match class {
            TaxClass::Cgst => self.cgst_ledger_name.as_deref(),
            TaxClass::Sgst => self.sgst_ledger_name.as_deref(),
            TaxClass::Igst => self.igst_ledger_name.as_deref(),
        }
    }
}
