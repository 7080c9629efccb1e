//! Verification readiness checks. Computes a report without mutating the
//! Draft; verification is blocked while the report carries errors.

use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use crate::models::bill::Direction;
use crate::models::catalog::TaxClass;
use crate::models::draft::Draft;
use crate::models::DocumentKind;
use crate::services::catalog::CatalogSet;

/// Structured debit/credit mismatch detail.
#[derive(Debug, Clone, Serialize)]
pub struct ImbalanceDetail {
    pub debit_total: Decimal,
    pub credit_total: Decimal,
    pub difference: Decimal,
}

/// A tax-summary ledger assigned to the wrong tax class, or unknown to the
/// loaded catalog of its class.
#[derive(Debug, Clone, Serialize)]
pub struct TaxLedgerIssue {
    pub class: TaxClass,
    pub ledger_id: Uuid,
}

/// Debit/credit totals for journal-style documents. Accounting entries must
/// balance exactly to the currency's minor unit; there is no tolerance.
#[derive(Debug, Clone, Serialize)]
pub struct BalanceCheck {
    pub debit_total: Decimal,
    pub credit_total: Decimal,
    pub balanced: bool,
}

impl BalanceCheck {
    pub fn imbalance(&self) -> Option<ImbalanceDetail> {
        if self.balanced {
            None
        } else {
            Some(ImbalanceDetail {
                debit_total: self.debit_total,
                credit_total: self.credit_total,
                difference: self.debit_total - self.credit_total,
            })
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ValidationReport {
    pub vendor_missing: bool,
    /// Selected vendor id not present in the loaded vendor catalog. Only
    /// populated when that catalog loaded.
    pub vendor_unknown: bool,
    pub unmapped_line_items: Vec<Uuid>,
    pub no_line_items: bool,
    /// Line accounts that do not exist in the loaded chart-of-accounts
    /// catalog. Only populated when that catalog loaded.
    pub unknown_account_ids: Vec<Uuid>,
    pub tax_ledger_issues: Vec<TaxLedgerIssue>,
    /// Present for journal-style documents only.
    pub balance: Option<BalanceCheck>,
}

impl ValidationReport {
    pub fn has_validation_errors(&self) -> bool {
        self.vendor_missing
            || self.vendor_unknown
            || !self.unmapped_line_items.is_empty()
            || self.no_line_items
            || !self.unknown_account_ids.is_empty()
            || !self.tax_ledger_issues.is_empty()
    }

    /// Verification is blocked by validation errors and, for journal
    /// entries, by an unbalanced entry.
    pub fn blocks_verification(&self) -> bool {
        self.has_validation_errors()
            || self
                .balance
                .as_ref()
                .map_or(false, |balance| !balance.balanced)
    }
}

/// Compute verification readiness for a Draft against whatever catalogs
/// have loaded. Never mutates the Draft.
pub fn validate(draft: &Draft, catalogs: &CatalogSet) -> ValidationReport {
    let mut report = ValidationReport {
        vendor_missing: draft.header.selected_vendor.is_none(),
        no_line_items: draft.line_items.is_empty(),
        ..ValidationReport::default()
    };

    // A hydrated snapshot may carry a vendor id the engine never confirmed;
    // it must still exist in the catalog before submission.
    if let Some(vendor) = draft.header.selected_vendor.as_ref() {
        if let Some(vendors) = catalogs.vendors.as_deref() {
            if !vendors.iter().any(|entry| entry.id == vendor.ledger_id) {
                report.vendor_unknown = true;
            }
        }
    }

    for line in &draft.line_items {
        match line.chart_of_accounts_id {
            None => report.unmapped_line_items.push(line.line_item_id),
            Some(account_id) => {
                if let Some(accounts) = catalogs.chart_of_accounts.as_deref() {
                    if !accounts.iter().any(|entry| entry.id == account_id) {
                        report.unknown_account_ids.push(line.line_item_id);
                    }
                }
            }
        }
    }

    for class in TaxClass::ALL {
        if let Some(ledger_id) = draft.tax_summary.ledger_id(class) {
            if let Some(candidates) = catalogs.tax(class) {
                if !candidates.iter().any(|entry| entry.id == ledger_id) {
                    report.tax_ledger_issues.push(TaxLedgerIssue { class, ledger_id });
                }
            }
        }
    }

    if draft.document_kind == DocumentKind::JournalEntry {
        let debit_total: Decimal = draft
            .line_items
            .iter()
            .filter(|line| line.direction == Direction::Debit)
            .map(|line| line.amount)
            .sum();
        let credit_total: Decimal = draft
            .line_items
            .iter()
            .filter(|line| line.direction == Direction::Credit)
            .map(|line| line.amount)
            .sum();
        report.balance = Some(BalanceCheck {
            debit_total,
            credit_total,
            balanced: debit_total == credit_total,
        });
    }

    report
}
