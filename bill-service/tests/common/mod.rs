//! Common test utilities for bill-service integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, Once};

use async_trait::async_trait;
use bill_service::models::bill::{
    AnalysedBill, AnalysedLineItem, AnalysedTaxSummary, BillStatus, Direction, DocumentKind,
    TaxType,
};
use bill_service::models::catalog::{LedgerEntry, StockItem};
use bill_service::models::draft::Draft;
use bill_service::services::catalog::CatalogSet;
use bill_service::services::gateway::{
    AccountingGateway, Confirmation, GatewayError, VerifySubmission,
};
use bill_service::services::validator::ImbalanceDetail;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use uuid::Uuid;

static INIT: Once = Once::new();

/// Initialize tracing for tests (only once).
pub fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter("info,bill_service=debug")
            .with_test_writer()
            .try_init()
            .ok();
    });
}

/// Parse a decimal literal.
pub fn dec(s: &str) -> Decimal {
    s.parse().expect("valid decimal literal")
}

pub fn ledger(name: &str) -> LedgerEntry {
    LedgerEntry {
        id: Uuid::new_v4(),
        name: name.to_string(),
        gst_number: None,
        master_id: None,
        alter_id: None,
        opening_balance: None,
        company: None,
        parent_group_name: "Sundry Creditors".to_string(),
    }
}

pub fn ledger_with_gst(name: &str, gst_number: &str) -> LedgerEntry {
    LedgerEntry {
        gst_number: Some(gst_number.to_string()),
        ..ledger(name)
    }
}

pub fn stock_item(name: &str) -> StockItem {
    StockItem {
        id: Uuid::new_v4(),
        name: name.to_string(),
        alias: None,
        unit: Some("pcs".to_string()),
        category: None,
        parent: None,
        gst_applicable: Some(true),
        parent_group_name: "Raw Materials".to_string(),
    }
}

pub fn stock_item_with_alias(name: &str, alias: &str) -> StockItem {
    StockItem {
        alias: Some(alias.to_string()),
        ..stock_item(name)
    }
}

pub fn analysed_line(description: &str, amount: &str, direction: Direction) -> AnalysedLineItem {
    AnalysedLineItem {
        item_id: None,
        item_name: None,
        description: description.to_string(),
        account_name: None,
        chart_of_accounts_id: None,
        amount: dec(amount),
        direction,
        tax_rate: None,
        igst: None,
        cgst: None,
        sgst: None,
    }
}

/// A minimal analysed vendor-bill snapshot with one debit line.
pub fn analysed_bill(vendor_name: &str) -> AnalysedBill {
    AnalysedBill {
        bill_id: Uuid::new_v4(),
        bill_number: "BILL-2026-001".to_string(),
        bill_date: NaiveDate::from_ymd_opt(2026, 4, 1).expect("valid date"),
        due_date: None,
        vendor_name: vendor_name.to_string(),
        vendor_gst_number: None,
        vendor_ledger_id: None,
        tax_type: TaxType::Tds,
        document_kind: DocumentKind::VendorBill,
        line_items: vec![analysed_line("Office supplies", "100.00", Direction::Debit)],
        tax_summary: AnalysedTaxSummary::default(),
        notes: String::new(),
        status: BillStatus::Analysed,
    }
}

/// Journal-entry snapshot with explicit debit and credit lines.
pub fn analysed_journal(lines: Vec<AnalysedLineItem>) -> AnalysedBill {
    AnalysedBill {
        document_kind: DocumentKind::JournalEntry,
        line_items: lines,
        ..analysed_bill("Acme Traders")
    }
}

/// Catalog set where every ledger catalog loaded (possibly empty) and stock
/// did not.
pub fn loaded_catalogs() -> CatalogSet {
    CatalogSet {
        vendors: Some(vec![]),
        cgst: Some(vec![]),
        sgst: Some(vec![]),
        igst: Some(vec![]),
        chart_of_accounts: Some(vec![]),
        stock: None,
        failures: vec![],
    }
}

pub fn catalogs_with_vendors(vendors: Vec<LedgerEntry>) -> CatalogSet {
    CatalogSet {
        vendors: Some(vendors),
        ..loaded_catalogs()
    }
}

/// Catalog set whose vendor and chart-of-accounts catalogs contain the
/// given entries, as a verification run expects.
pub fn verification_catalogs(vendor: &LedgerEntry, account: &LedgerEntry) -> CatalogSet {
    CatalogSet {
        vendors: Some(vec![vendor.clone()]),
        chart_of_accounts: Some(vec![account.clone()]),
        ..loaded_catalogs()
    }
}

/// A Draft that passes verification readiness: vendor assigned, every line
/// mapped to an account.
pub fn verifiable_draft(vendor: &LedgerEntry, account: &LedgerEntry) -> Draft {
    let mut draft = Draft::hydrate(analysed_bill(&vendor.name));
    draft.assign_vendor(vendor).expect("assign vendor");
    let line_ids: Vec<Uuid> = draft
        .line_items
        .iter()
        .map(|line| line.line_item_id)
        .collect();
    for line_item_id in line_ids {
        draft
            .assign_line_account(line_item_id, account)
            .expect("assign line account");
    }
    draft
}

/// Scripted response of the mock accounting gateway.
#[derive(Debug, Clone)]
pub enum MockResponse {
    Accept {
        posted: bool,
    },
    Reject {
        message: String,
        imbalance: Option<ImbalanceDetail>,
    },
    TransportDown,
}

/// In-memory accounting gateway that records every call it receives.
pub struct MockGateway {
    pub response: MockResponse,
    pub verify_calls: AtomicUsize,
    pub sync_calls: AtomicUsize,
    pub last_submission: Mutex<Option<VerifySubmission>>,
}

impl MockGateway {
    pub fn new(response: MockResponse) -> Self {
        Self {
            response,
            verify_calls: AtomicUsize::new(0),
            sync_calls: AtomicUsize::new(0),
            last_submission: Mutex::new(None),
        }
    }

    pub fn accepting() -> Self {
        Self::new(MockResponse::Accept { posted: false })
    }

    pub fn verify_call_count(&self) -> usize {
        self.verify_calls.load(Ordering::SeqCst)
    }

    pub fn sync_call_count(&self) -> usize {
        self.sync_calls.load(Ordering::SeqCst)
    }

    pub fn last_submission(&self) -> Option<VerifySubmission> {
        self.last_submission.lock().expect("lock").clone()
    }

    fn respond(&self, bill_id: Uuid) -> Result<Confirmation, GatewayError> {
        match &self.response {
            MockResponse::Accept { posted } => Ok(Confirmation {
                bill_id,
                reference: Some("ACC-42".to_string()),
                posted: *posted,
            }),
            MockResponse::Reject { message, imbalance } => Err(GatewayError::RemoteRejection {
                message: message.clone(),
                imbalance: imbalance.clone(),
            }),
            MockResponse::TransportDown => Err(GatewayError::Transport(anyhow::anyhow!(
                "connection refused"
            ))),
        }
    }
}

#[async_trait]
impl<'a> AccountingGateway for &'a MockGateway {
    async fn verify(&self, submission: &VerifySubmission) -> Result<Confirmation, GatewayError> {
        self.verify_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_submission.lock().expect("lock") = Some(submission.clone());
        self.respond(submission.bill_id)
    }

    async fn sync(&self, bill_id: Uuid) -> Result<Confirmation, GatewayError> {
        self.sync_calls.fetch_add(1, Ordering::SeqCst);
        self.respond(bill_id)
    }
}
