//! Reconciliation engine tests: resolution, idempotency, stickiness and
//! order independence across catalog arrivals.

mod common;

use bill_service::models::catalog::TaxClass;
use bill_service::models::draft::{Draft, FieldKey, FieldState};
use bill_service::services::matcher::TieBreak;
use bill_service::services::reconciliation::ReconciliationEngine;
use common::{
    analysed_bill, catalogs_with_vendors, dec, init_tracing, ledger, loaded_catalogs, stock_item,
};
use uuid::Uuid;

fn engine() -> ReconciliationEngine {
    ReconciliationEngine::new(TieBreak::FirstInCatalog, false)
}

#[test]
fn vendor_resolves_by_exact_name() {
    init_tracing();
    let acme = ledger("Acme Traders");
    let catalogs = catalogs_with_vendors(vec![ledger("Bharat Supplies"), acme.clone()]);
    let mut draft = Draft::hydrate(analysed_bill("Acme Traders"));

    let outcome = engine().run(&mut draft, &catalogs);

    assert_eq!(outcome.fields_resolved, 1);
    let vendor = draft.header.selected_vendor.as_ref().expect("vendor set");
    assert_eq!(vendor.ledger_id, acme.id);
    assert_eq!(vendor.name, "Acme Traders");
    assert_eq!(draft.field_state(FieldKey::Vendor), FieldState::Resolved);
}

#[test]
fn stale_vendor_id_falls_back_to_name_match() {
    init_tracing();
    let acme = ledger("Acme Traders");
    let catalogs = catalogs_with_vendors(vec![acme.clone()]);

    let mut snapshot = analysed_bill("Acme Traders");
    snapshot.vendor_ledger_id = Some(Uuid::new_v4());
    let mut draft = Draft::hydrate(snapshot);

    engine().run(&mut draft, &catalogs);

    let vendor = draft.header.selected_vendor.as_ref().expect("vendor set");
    assert_eq!(vendor.ledger_id, acme.id, "stale id must not survive");
}

#[test]
fn second_run_is_a_noop() {
    init_tracing();
    let catalogs = catalogs_with_vendors(vec![ledger("Acme Traders")]);
    let mut draft = Draft::hydrate(analysed_bill("Acme Traders"));
    let engine = engine();

    let first = engine.run(&mut draft, &catalogs);
    assert_eq!(first.fields_resolved, 1);

    let second = engine.run(&mut draft, &catalogs);
    assert!(second.is_noop());
    assert_eq!(second.fields_resolved, 0);
    assert!(second.fields_skipped >= 1);
}

#[test]
fn manual_clear_is_sticky_across_reruns() {
    init_tracing();
    let catalogs = catalogs_with_vendors(vec![ledger("Acme Traders")]);
    let mut draft = Draft::hydrate(analysed_bill("Acme Traders"));
    let engine = engine();

    engine.run(&mut draft, &catalogs);
    assert!(draft.header.selected_vendor.is_some());

    draft.clear_vendor().expect("clear vendor");
    let rerun = engine.run(&mut draft, &catalogs);

    assert!(draft.header.selected_vendor.is_none(), "clear must hold");
    assert_eq!(
        draft.field_state(FieldKey::Vendor),
        FieldState::ManuallyCleared
    );
    assert_eq!(rerun.fields_resolved, 0);
}

#[test]
fn manual_assignment_survives_catalog_reload() {
    init_tracing();
    let auto_pick = ledger("Acme Traders");
    let manual_pick = ledger("Acme Traders (Mumbai)");
    let catalogs = catalogs_with_vendors(vec![auto_pick, manual_pick.clone()]);
    let mut draft = Draft::hydrate(analysed_bill("Acme Traders"));
    let engine = engine();

    engine.run(&mut draft, &catalogs);
    draft.assign_vendor(&manual_pick).expect("assign vendor");

    engine.run(&mut draft, &catalogs);

    let vendor = draft.header.selected_vendor.as_ref().expect("vendor set");
    assert_eq!(vendor.ledger_id, manual_pick.id);
}

#[test]
fn partial_then_full_catalog_arrival_converges() {
    init_tracing();
    let acme = ledger("Acme Traders");
    let cgst_ledger = ledger("CGST 9%");

    let mut snapshot = analysed_bill("Acme Traders");
    snapshot.tax_summary.cgst = dec("9.00");
    snapshot.tax_summary.cgst_ledger_name = Some("CGST 9%".to_string());

    let vendors_only = catalogs_with_vendors(vec![acme.clone()]);
    let mut full = catalogs_with_vendors(vec![acme.clone()]);
    full.cgst = Some(vec![cgst_ledger.clone()]);

    let engine = engine();

    // Interleaved: vendors first, taxes later.
    let mut staged = Draft::hydrate(snapshot.clone());
    let first = engine.run(&mut staged, &vendors_only);
    assert_eq!(first.fields_resolved, 1);
    assert_eq!(first.catalogs_missing, 0, "loaded-but-empty is not missing");
    engine.run(&mut staged, &full);

    // One shot: everything at once.
    let mut oneshot = Draft::hydrate(snapshot);
    engine.run(&mut oneshot, &full);

    assert_eq!(
        staged.header.selected_vendor,
        oneshot.header.selected_vendor
    );
    assert_eq!(
        staged.tax_summary.cgst_ledger_id,
        Some(cgst_ledger.id)
    );
    assert_eq!(
        staged.tax_summary.cgst_ledger_id,
        oneshot.tax_summary.cgst_ledger_id
    );
}

#[test]
fn missing_catalog_is_counted_not_fatal() {
    init_tracing();
    // Nothing loaded at all.
    let empty = bill_service::services::catalog::CatalogSet::default();
    let mut draft = Draft::hydrate(analysed_bill("Acme Traders"));

    let outcome = engine().run(&mut draft, &empty);

    assert_eq!(outcome.fields_resolved, 0);
    assert!(outcome.catalogs_missing >= 2, "vendor and line account");
    assert_eq!(draft.field_state(FieldKey::Vendor), FieldState::Unresolved);
}

#[test]
fn tax_ledger_resolves_from_source_id() {
    init_tracing();
    let cgst_ledger = ledger("CGST 9%");
    let mut catalogs = loaded_catalogs();
    catalogs.cgst = Some(vec![ledger("CGST 18%"), cgst_ledger.clone()]);

    let mut snapshot = analysed_bill("Acme Traders");
    snapshot.tax_summary.cgst = dec("9.00");
    snapshot.tax_summary.cgst_ledger_id = Some(cgst_ledger.id);
    let mut draft = Draft::hydrate(snapshot);

    engine().run(&mut draft, &catalogs);

    assert_eq!(draft.tax_summary.cgst_ledger_id, Some(cgst_ledger.id));
    assert_eq!(
        draft.field_state(FieldKey::TaxLedger(TaxClass::Cgst)),
        FieldState::Resolved
    );
    // Untouched classes carry no amount and no hint.
    assert_eq!(
        draft.field_state(FieldKey::TaxLedger(TaxClass::Igst)),
        FieldState::Unresolved
    );
}

#[test]
fn line_account_resolves_from_account_name_hint() {
    init_tracing();
    let expense = ledger("Office Expenses");
    let mut catalogs = loaded_catalogs();
    catalogs.chart_of_accounts = Some(vec![expense.clone()]);

    let mut snapshot = analysed_bill("Acme Traders");
    snapshot.line_items[0].account_name = Some("Office Expenses".to_string());
    let mut draft = Draft::hydrate(snapshot);

    engine().run(&mut draft, &catalogs);

    assert_eq!(draft.line_items[0].chart_of_accounts_id, Some(expense.id));
    let key = FieldKey::LineAccount(draft.line_items[0].line_item_id);
    assert_eq!(draft.field_state(key), FieldState::Resolved);
}

#[test]
fn stock_matching_is_gated_by_configuration() {
    init_tracing();
    let cement = stock_item("Cement");
    let mut catalogs = loaded_catalogs();
    catalogs.stock = Some(vec![cement.clone()]);

    let mut snapshot = analysed_bill("Acme Traders");
    snapshot.line_items[0].item_name = Some("Cement".to_string());

    let mut without_stock = Draft::hydrate(snapshot.clone());
    ReconciliationEngine::new(TieBreak::FirstInCatalog, false).run(&mut without_stock, &catalogs);
    assert_eq!(without_stock.line_items[0].item_id, None);

    let mut with_stock = Draft::hydrate(snapshot);
    ReconciliationEngine::new(TieBreak::FirstInCatalog, true).run(&mut with_stock, &catalogs);
    assert_eq!(with_stock.line_items[0].item_id, Some(cement.id));
}
