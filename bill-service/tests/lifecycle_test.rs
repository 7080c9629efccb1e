//! Bill lifecycle tests: allowed transitions, verify idempotency and the
//! sync precondition.

mod common;

use bill_service::models::bill::BillStatus;
use bill_service::services::lifecycle::{
    after_sync, after_verify, begin_sync, begin_verify, can_transition, LifecycleError,
    VerifyDisposition,
};
use common::init_tracing;

#[test]
fn forward_transitions_are_allowed() {
    init_tracing();
    use BillStatus::*;
    assert!(can_transition(Draft, Analysed));
    assert!(can_transition(Draft, Verified));
    assert!(can_transition(Analysed, Verified));
    assert!(can_transition(Verified, Synced));
    assert!(can_transition(Verified, Posted));
}

#[test]
fn backward_and_skipping_transitions_are_rejected() {
    init_tracing();
    use BillStatus::*;
    assert!(!can_transition(Verified, Draft));
    assert!(!can_transition(Analysed, Draft));
    assert!(!can_transition(Draft, Synced));
    assert!(!can_transition(Analysed, Posted));
    assert!(!can_transition(Synced, Posted));
    assert!(!can_transition(Posted, Synced));
}

#[test]
fn verify_proceeds_before_verified_and_noops_after() {
    init_tracing();
    assert_eq!(begin_verify(BillStatus::Draft), VerifyDisposition::Proceed);
    assert_eq!(
        begin_verify(BillStatus::Analysed),
        VerifyDisposition::Proceed
    );
    for status in [BillStatus::Verified, BillStatus::Synced, BillStatus::Posted] {
        assert_eq!(begin_verify(status), VerifyDisposition::AlreadyVerified);
    }
}

#[test]
fn sync_requires_verified_status() {
    init_tracing();
    assert!(begin_sync(BillStatus::Verified).is_ok());

    for status in [
        BillStatus::Draft,
        BillStatus::Analysed,
        BillStatus::Synced,
        BillStatus::Posted,
    ] {
        let err = begin_sync(status).expect_err("sync must be rejected");
        let LifecycleError::InvalidTransition { from, action } = err;
        assert_eq!(from, status);
        assert_eq!(action, "sync");
    }
}

#[test]
fn sync_outcome_maps_to_synced_or_posted() {
    init_tracing();
    assert_eq!(after_verify(), BillStatus::Verified);
    assert_eq!(after_sync(false), BillStatus::Synced);
    assert_eq!(after_sync(true), BillStatus::Posted);
}

#[test]
fn status_round_trips_through_strings() {
    init_tracing();
    for status in [
        BillStatus::Draft,
        BillStatus::Analysed,
        BillStatus::Verified,
        BillStatus::Synced,
        BillStatus::Posted,
    ] {
        assert_eq!(BillStatus::from_string(status.as_str()), status);
    }
    assert_eq!(BillStatus::from_string("garbage"), BillStatus::Draft);
}
