//! Reconciliation engine.
//!
//! Runs the entity matcher against every reconcilable slot of a Draft:
//! vendor, the three tax-class ledgers, each line's chart-of-accounts
//! account and, when the organization tracks stock, each line's stock item.
//!
//! Slots are sticky. A slot that is already `Resolved` or `ManuallyCleared`
//! is never touched again, so catalog reloads cannot overwrite a manual
//! correction or restore a cleared value. Every step is individually
//! idempotent and order-independent: running with partial catalogs and
//! again when the rest arrive converges to the same Draft regardless of
//! completion order.

use tracing::{info, instrument};
use uuid::Uuid;

use crate::config::BillConfig;
use crate::models::bill::VendorRef;
use crate::models::catalog::TaxClass;
use crate::models::draft::{Draft, FieldKey, FieldState};
use crate::services::catalog::CatalogSet;
use crate::services::matcher::{
    match_ledger, match_stock, MatchOptions, MatchTarget, TieBreak,
};
use crate::services::metrics::{MATCHES_TOTAL, RECONCILE_DURATION};

/// What one engine run did. A second run over an already-resolved Draft is
/// a no-op, letting callers skip change notification entirely.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileOutcome {
    pub fields_resolved: u32,
    /// Slots skipped because they were already resolved or manually cleared.
    pub fields_skipped: u32,
    /// Slots that could not be attempted because their catalog is missing.
    pub catalogs_missing: u32,
}

impl ReconcileOutcome {
    pub fn is_noop(&self) -> bool {
        self.fields_resolved == 0
    }
}

pub struct ReconciliationEngine {
    tie_break: TieBreak,
    stock_tracking_enabled: bool,
}

impl ReconciliationEngine {
    pub fn new(tie_break: TieBreak, stock_tracking_enabled: bool) -> Self {
        Self {
            tie_break,
            stock_tracking_enabled,
        }
    }

    pub fn from_config(config: &BillConfig) -> Self {
        Self::new(config.tie_break, config.stock_tracking_enabled)
    }

    fn options(&self, match_gst: bool) -> MatchOptions {
        MatchOptions {
            match_gst,
            tie_break: self.tie_break,
        }
    }

    /// Run matching over every unresolved slot. Call on hydration and again
    /// whenever a catalog finishes loading; interleaving is safe.
    #[instrument(skip(self, draft, catalogs), fields(bill_id = %draft.header.bill_id))]
    pub fn run(&self, draft: &mut Draft, catalogs: &CatalogSet) -> ReconcileOutcome {
        let timer = RECONCILE_DURATION
            .with_label_values(&["run"])
            .start_timer();

        let mut outcome = ReconcileOutcome::default();
        self.match_vendor(draft, catalogs, &mut outcome);
        for class in TaxClass::ALL {
            self.match_tax_ledger(class, draft, catalogs, &mut outcome);
        }
        self.match_line_accounts(draft, catalogs, &mut outcome);
        if self.stock_tracking_enabled {
            self.match_line_stock(draft, catalogs, &mut outcome);
        }

        timer.observe_duration();

        if !outcome.is_noop() {
            info!(
                fields_resolved = outcome.fields_resolved,
                catalogs_missing = outcome.catalogs_missing,
                "Reconciliation resolved fields"
            );
        }
        outcome
    }

    fn match_vendor(&self, draft: &mut Draft, catalogs: &CatalogSet, outcome: &mut ReconcileOutcome) {
        if draft.field_state(FieldKey::Vendor) != FieldState::Unresolved {
            outcome.fields_skipped += 1;
            return;
        }
        let Some(vendors) = catalogs.vendors.as_deref() else {
            outcome.catalogs_missing += 1;
            return;
        };

        let target = MatchTarget {
            external_id: draft
                .header
                .selected_vendor
                .as_ref()
                .map(|vendor| vendor.ledger_id),
            name: Some(draft.header.vendor_name.clone()),
            gst_number: draft.header.vendor_gst_number.clone(),
        };
        if let Some(hit) = match_ledger(&target, vendors, self.options(true)) {
            MATCHES_TOTAL
                .with_label_values(&["vendor", hit.strategy.as_str()])
                .inc();
            draft.resolve_vendor(VendorRef::from(hit.entry));
            outcome.fields_resolved += 1;
        }
    }

    fn match_tax_ledger(
        &self,
        class: TaxClass,
        draft: &mut Draft,
        catalogs: &CatalogSet,
        outcome: &mut ReconcileOutcome,
    ) {
        if draft.field_state(FieldKey::TaxLedger(class)) != FieldState::Unresolved {
            outcome.fields_skipped += 1;
            return;
        }
        let hint_id = draft.tax_summary.ledger_id(class);
        let hint_name = draft.tax_ledger_hint(class).map(str::to_string);
        // Nothing to match against: no amount and no hint from the source.
        if draft.tax_summary.amount(class).is_zero() && hint_id.is_none() && hint_name.is_none() {
            return;
        }
        let Some(candidates) = catalogs.tax(class) else {
            outcome.catalogs_missing += 1;
            return;
        };

        let target = MatchTarget {
            external_id: hint_id,
            name: hint_name,
            gst_number: None,
        };
        if let Some(hit) = match_ledger(&target, candidates, self.options(false)) {
            MATCHES_TOTAL
                .with_label_values(&[class.as_str(), hit.strategy.as_str()])
                .inc();
            draft.resolve_tax_ledger(class, hit.entry.id);
            outcome.fields_resolved += 1;
        }
    }

    fn match_line_accounts(
        &self,
        draft: &mut Draft,
        catalogs: &CatalogSet,
        outcome: &mut ReconcileOutcome,
    ) {
        let pending = self.pending_line_targets(draft, outcome, |line| {
            (
                FieldKey::LineAccount(line.line_item_id),
                MatchTarget {
                    external_id: line.chart_of_accounts_id,
                    name: line.account_name.clone(),
                    gst_number: None,
                },
            )
        });
        if pending.is_empty() {
            return;
        }
        let Some(accounts) = catalogs.chart_of_accounts.as_deref() else {
            outcome.catalogs_missing += 1;
            return;
        };

        for (line_item_id, target) in pending {
            if let Some(hit) = match_ledger(&target, accounts, self.options(false)) {
                MATCHES_TOTAL
                    .with_label_values(&["chart_of_accounts", hit.strategy.as_str()])
                    .inc();
                draft.resolve_line_account(line_item_id, hit.entry.id);
                outcome.fields_resolved += 1;
            }
        }
    }

    fn match_line_stock(
        &self,
        draft: &mut Draft,
        catalogs: &CatalogSet,
        outcome: &mut ReconcileOutcome,
    ) {
        let pending = self.pending_line_targets(draft, outcome, |line| {
            (
                FieldKey::LineStock(line.line_item_id),
                MatchTarget {
                    external_id: line.item_id,
                    name: line.item_name.clone(),
                    gst_number: None,
                },
            )
        });
        if pending.is_empty() {
            return;
        }
        let Some(stock) = catalogs.stock.as_deref() else {
            outcome.catalogs_missing += 1;
            return;
        };

        for (line_item_id, target) in pending {
            if let Some(hit) = match_stock(&target, stock, self.options(false)) {
                MATCHES_TOTAL
                    .with_label_values(&["stock", hit.strategy.as_str()])
                    .inc();
                draft.resolve_line_stock(line_item_id, hit.entry.id, hit.entry.name.clone());
                outcome.fields_resolved += 1;
            }
        }
    }

    fn pending_line_targets(
        &self,
        draft: &Draft,
        outcome: &mut ReconcileOutcome,
        to_target: impl Fn(&crate::models::bill::LineItem) -> (FieldKey, MatchTarget),
    ) -> Vec<(Uuid, MatchTarget)> {
        let mut pending = Vec::new();
        for line in &draft.line_items {
            let (key, target) = to_target(line);
            if draft.field_state(key) == FieldState::Unresolved {
                pending.push((line.line_item_id, target));
            } else {
                outcome.fields_skipped += 1;
            }
        }
        pending
    }
}
