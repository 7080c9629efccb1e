//! The in-memory working copy of a bill under review.
//!
//! A `Draft` is hydrated from an analysed snapshot when a bill is opened,
//! mutated by user edits and by the reconciliation engine, and discarded
//! unless an explicit verify action submits it. The system of record for
//! the bill itself lives externally.

use std::collections::HashMap;

use anyhow::anyhow;
use rust_decimal::Decimal;
use service_core::error::AppError;
use tracing::debug;
use uuid::Uuid;

use super::bill::{
    AnalysedBill, BillHeader, BillStatus, Direction, DocumentKind, LineItem, TaxSummary, TaxType,
    VendorRef,
};
use super::catalog::{LedgerEntry, StockItem, TaxClass};

/// Resolution state of a reconcilable slot.
///
/// `ManuallyCleared` is sticky: once a user clears a slot, automatic
/// matching skips it for the lifetime of the Draft. Only a fresh hydration
/// resets it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FieldState {
    #[default]
    Unresolved,
    Resolved,
    ManuallyCleared,
}

/// Key of a reconcilable slot on the Draft.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKey {
    Vendor,
    TaxLedger(TaxClass),
    LineAccount(Uuid),
    LineStock(Uuid),
}

/// Per-class rollup of tax amounts carried on individual lines.
///
/// Line-level tax is never summed into the header `TaxSummary`; this type
/// exists so callers can surface the discrepancy explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineTaxTotals {
    pub cgst: Decimal,
    pub sgst: Decimal,
    pub igst: Decimal,
}

/// Mutable working copy of a bill: header, lines, tax summary and the
/// resolution state of every reconcilable slot.
#[derive(Debug, Clone)]
pub struct Draft {
    pub header: BillHeader,
    pub line_items: Vec<LineItem>,
    pub tax_summary: TaxSummary,
    pub notes: String,
    pub status: BillStatus,
    pub document_kind: DocumentKind,
    tax_ledger_hints: HashMap<TaxClass, String>,
    field_states: HashMap<FieldKey, FieldState>,
}

impl Draft {
    /// Build a Draft from an analysed snapshot.
    ///
    /// Ids carried by the snapshot (vendor ledger, tax ledgers, line
    /// accounts, stock items) are copied in as values but every slot starts
    /// `Unresolved`: the reconciliation engine confirms each id against the
    /// loaded catalog before marking it resolved, so stale ids fall back to
    /// name matching instead of being trusted blindly.
    pub fn hydrate(snapshot: AnalysedBill) -> Self {
        let selected_vendor = snapshot.vendor_ledger_id.map(|ledger_id| VendorRef {
            ledger_id,
            name: snapshot.vendor_name.clone(),
            gst_number: snapshot.vendor_gst_number.clone(),
        });

        let header = BillHeader {
            bill_id: snapshot.bill_id,
            bill_number: snapshot.bill_number,
            bill_date: snapshot.bill_date,
            due_date: snapshot.due_date,
            vendor_name: snapshot.vendor_name,
            vendor_gst_number: snapshot.vendor_gst_number,
            selected_vendor,
            tax_type: snapshot.tax_type,
        };

        let line_items = snapshot
            .line_items
            .into_iter()
            .map(|line| LineItem {
                line_item_id: Uuid::new_v4(),
                item_id: line.item_id,
                item_name: line.item_name,
                description: line.description,
                account_name: line.account_name,
                chart_of_accounts_id: line.chart_of_accounts_id,
                amount: line.amount,
                direction: line.direction,
                tax_rate: line.tax_rate,
                igst: line.igst,
                cgst: line.cgst,
                sgst: line.sgst,
            })
            .collect();

        let mut tax_ledger_hints = HashMap::new();
        let mut tax_summary = TaxSummary {
            cgst: snapshot.tax_summary.cgst,
            sgst: snapshot.tax_summary.sgst,
            igst: snapshot.tax_summary.igst,
            total: snapshot.tax_summary.total,
            ..TaxSummary::default()
        };
        for class in TaxClass::ALL {
            tax_summary.set_ledger_id(class, snapshot.tax_summary.ledger_id(class));
            if let Some(name) = snapshot.tax_summary.ledger_name(class) {
                tax_ledger_hints.insert(class, name.to_string());
            }
        }

        Self {
            header,
            line_items,
            tax_summary,
            notes: snapshot.notes,
            status: snapshot.status,
            document_kind: snapshot.document_kind,
            tax_ledger_hints,
            field_states: HashMap::new(),
        }
    }

    pub fn field_state(&self, key: FieldKey) -> FieldState {
        self.field_states.get(&key).copied().unwrap_or_default()
    }

    fn set_state(&mut self, key: FieldKey, state: FieldState) {
        self.field_states.insert(key, state);
    }

    pub(crate) fn tax_ledger_hint(&self, class: TaxClass) -> Option<&str> {
        self.tax_ledger_hints.get(&class).map(String::as_str)
    }

    fn ensure_editable(&self) -> Result<(), AppError> {
        if self.status.is_editable() {
            Ok(())
        } else {
            Err(AppError::BadRequest(anyhow!(
                "Bill is read-only in status '{}'",
                self.status
            )))
        }
    }

    fn line_mut(&mut self, line_item_id: Uuid) -> Result<&mut LineItem, AppError> {
        self.line_items
            .iter_mut()
            .find(|line| line.line_item_id == line_item_id)
            .ok_or_else(|| AppError::NotFound(anyhow!("Line item {} not found", line_item_id)))
    }

    pub fn line_item(&self, line_item_id: Uuid) -> Option<&LineItem> {
        self.line_items
            .iter()
            .find(|line| line.line_item_id == line_item_id)
    }

    // -------------------------------------------------------------------------
    // Header and tax-summary setters (replace-on-write)
    // -------------------------------------------------------------------------

    pub fn set_bill_number(&mut self, bill_number: String) -> Result<(), AppError> {
        self.ensure_editable()?;
        self.header.bill_number = bill_number;
        Ok(())
    }

    pub fn set_bill_date(&mut self, bill_date: chrono::NaiveDate) -> Result<(), AppError> {
        self.ensure_editable()?;
        self.header.bill_date = bill_date;
        Ok(())
    }

    pub fn set_due_date(&mut self, due_date: Option<chrono::NaiveDate>) -> Result<(), AppError> {
        self.ensure_editable()?;
        self.header.due_date = due_date;
        Ok(())
    }

    pub fn set_vendor_name(&mut self, vendor_name: String) -> Result<(), AppError> {
        self.ensure_editable()?;
        self.header.vendor_name = vendor_name;
        Ok(())
    }

    pub fn set_tax_type(&mut self, tax_type: TaxType) -> Result<(), AppError> {
        self.ensure_editable()?;
        self.header.tax_type = tax_type;
        Ok(())
    }

    pub fn set_notes(&mut self, notes: String) -> Result<(), AppError> {
        self.ensure_editable()?;
        self.notes = notes;
        Ok(())
    }

    pub fn set_tax_amount(&mut self, class: TaxClass, amount: Decimal) -> Result<(), AppError> {
        self.ensure_editable()?;
        ensure_non_negative(amount)?;
        match class {
            TaxClass::Cgst => self.tax_summary.cgst = amount,
            TaxClass::Sgst => self.tax_summary.sgst = amount,
            TaxClass::Igst => self.tax_summary.igst = amount,
        }
        Ok(())
    }

    pub fn set_tax_total(&mut self, total: Decimal) -> Result<(), AppError> {
        self.ensure_editable()?;
        ensure_non_negative(total)?;
        self.tax_summary.total = total;
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Line item collection
    // -------------------------------------------------------------------------

    /// Append a line item and return its freshly assigned id. Ids are never
    /// reused, even after removal.
    pub fn add_line_item(
        &mut self,
        description: String,
        amount: Decimal,
        direction: Direction,
    ) -> Result<Uuid, AppError> {
        self.ensure_editable()?;
        ensure_non_negative(amount)?;
        let line_item_id = Uuid::new_v4();
        self.line_items.push(LineItem {
            line_item_id,
            item_id: None,
            item_name: None,
            description,
            account_name: None,
            chart_of_accounts_id: None,
            amount,
            direction,
            tax_rate: None,
            igst: None,
            cgst: None,
            sgst: None,
        });
        Ok(line_item_id)
    }

    /// Remove a line item. A no-op returning `false` when the item does not
    /// exist or when removal would leave zero lines.
    pub fn remove_line_item(&mut self, line_item_id: Uuid) -> Result<bool, AppError> {
        self.ensure_editable()?;
        if self.line_items.len() <= 1 {
            debug!(%line_item_id, "Refusing to remove the last line item");
            return Ok(false);
        }
        let before = self.line_items.len();
        self.line_items
            .retain(|line| line.line_item_id != line_item_id);
        if self.line_items.len() == before {
            return Ok(false);
        }
        self.field_states.remove(&FieldKey::LineAccount(line_item_id));
        self.field_states.remove(&FieldKey::LineStock(line_item_id));
        Ok(true)
    }

    pub fn set_line_description(
        &mut self,
        line_item_id: Uuid,
        description: String,
    ) -> Result<(), AppError> {
        self.ensure_editable()?;
        self.line_mut(line_item_id)?.description = description;
        Ok(())
    }

    pub fn set_line_amount(&mut self, line_item_id: Uuid, amount: Decimal) -> Result<(), AppError> {
        self.ensure_editable()?;
        ensure_non_negative(amount)?;
        self.line_mut(line_item_id)?.amount = amount;
        Ok(())
    }

    pub fn set_line_direction(
        &mut self,
        line_item_id: Uuid,
        direction: Direction,
    ) -> Result<(), AppError> {
        self.ensure_editable()?;
        self.line_mut(line_item_id)?.direction = direction;
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Manual ledger assignment and clearing
    // -------------------------------------------------------------------------

    pub fn assign_vendor(&mut self, entry: &LedgerEntry) -> Result<(), AppError> {
        self.ensure_editable()?;
        self.header.selected_vendor = Some(VendorRef::from(entry));
        self.set_state(FieldKey::Vendor, FieldState::Resolved);
        Ok(())
    }

    /// Clear the vendor assignment. Sticky: automatic matching will not
    /// restore it on later catalog loads.
    pub fn clear_vendor(&mut self) -> Result<(), AppError> {
        self.ensure_editable()?;
        self.header.selected_vendor = None;
        self.set_state(FieldKey::Vendor, FieldState::ManuallyCleared);
        Ok(())
    }

    pub fn assign_tax_ledger(
        &mut self,
        class: TaxClass,
        entry: &LedgerEntry,
    ) -> Result<(), AppError> {
        self.ensure_editable()?;
        self.tax_summary.set_ledger_id(class, Some(entry.id));
        self.set_state(FieldKey::TaxLedger(class), FieldState::Resolved);
        Ok(())
    }

    pub fn clear_tax_ledger(&mut self, class: TaxClass) -> Result<(), AppError> {
        self.ensure_editable()?;
        self.tax_summary.set_ledger_id(class, None);
        self.set_state(FieldKey::TaxLedger(class), FieldState::ManuallyCleared);
        Ok(())
    }

    pub fn assign_line_account(
        &mut self,
        line_item_id: Uuid,
        entry: &LedgerEntry,
    ) -> Result<(), AppError> {
        self.ensure_editable()?;
        self.line_mut(line_item_id)?.chart_of_accounts_id = Some(entry.id);
        self.set_state(FieldKey::LineAccount(line_item_id), FieldState::Resolved);
        Ok(())
    }

    pub fn clear_line_account(&mut self, line_item_id: Uuid) -> Result<(), AppError> {
        self.ensure_editable()?;
        self.line_mut(line_item_id)?.chart_of_accounts_id = None;
        self.set_state(
            FieldKey::LineAccount(line_item_id),
            FieldState::ManuallyCleared,
        );
        Ok(())
    }

    pub fn assign_line_stock(
        &mut self,
        line_item_id: Uuid,
        item: &StockItem,
    ) -> Result<(), AppError> {
        self.ensure_editable()?;
        let line = self.line_mut(line_item_id)?;
        line.item_id = Some(item.id);
        line.item_name = Some(item.name.clone());
        self.set_state(FieldKey::LineStock(line_item_id), FieldState::Resolved);
        Ok(())
    }

    pub fn clear_line_stock(&mut self, line_item_id: Uuid) -> Result<(), AppError> {
        self.ensure_editable()?;
        let line = self.line_mut(line_item_id)?;
        line.item_id = None;
        self.set_state(
            FieldKey::LineStock(line_item_id),
            FieldState::ManuallyCleared,
        );
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Engine-side resolution (bypasses manual semantics, same stickiness)
    // -------------------------------------------------------------------------

    pub(crate) fn resolve_vendor(&mut self, vendor: VendorRef) {
        self.header.selected_vendor = Some(vendor);
        self.set_state(FieldKey::Vendor, FieldState::Resolved);
    }

    pub(crate) fn resolve_tax_ledger(&mut self, class: TaxClass, ledger_id: Uuid) {
        self.tax_summary.set_ledger_id(class, Some(ledger_id));
        self.set_state(FieldKey::TaxLedger(class), FieldState::Resolved);
    }

    pub(crate) fn resolve_line_account(&mut self, line_item_id: Uuid, ledger_id: Uuid) {
        if let Ok(line) = self.line_mut(line_item_id) {
            line.chart_of_accounts_id = Some(ledger_id);
            self.set_state(FieldKey::LineAccount(line_item_id), FieldState::Resolved);
        }
    }

    pub(crate) fn resolve_line_stock(&mut self, line_item_id: Uuid, item_id: Uuid, name: String) {
        if let Ok(line) = self.line_mut(line_item_id) {
            line.item_id = Some(item_id);
            line.item_name = Some(name);
            self.set_state(FieldKey::LineStock(line_item_id), FieldState::Resolved);
        }
    }

    // -------------------------------------------------------------------------
    // Queries
    // -------------------------------------------------------------------------

    /// Per-class rollup of tax amounts carried on individual lines, if any
    /// line carries one. Not reconciled against the header `TaxSummary`.
    pub fn line_tax_totals(&self) -> Option<LineTaxTotals> {
        let mut totals = LineTaxTotals {
            cgst: Decimal::ZERO,
            sgst: Decimal::ZERO,
            igst: Decimal::ZERO,
        };
        let mut any = false;
        for line in &self.line_items {
            if let Some(v) = line.cgst {
                totals.cgst += v;
                any = true;
            }
            if let Some(v) = line.sgst {
                totals.sgst += v;
                any = true;
            }
            if let Some(v) = line.igst {
                totals.igst += v;
                any = true;
            }
        }
        any.then_some(totals)
    }
}

fn ensure_non_negative(amount: Decimal) -> Result<(), AppError> {
    if amount.is_sign_negative() {
        Err(AppError::BadRequest(anyhow!(
            "Amounts must be non-negative, got {}",
            amount
        )))
    } else {
        Ok(())
    }
}
