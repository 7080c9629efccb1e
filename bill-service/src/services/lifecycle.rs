//! Bill lifecycle state machine.
//!
//! `Draft → Analysed → Verified → Synced | Posted`. Transitions are
//! monotone; the only backward path is a fresh hydration from source.

use thiserror::Error;

use crate::models::bill::BillStatus;
use service_core::error::AppError;

#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("Cannot {action} a bill in status '{from}'")]
    InvalidTransition {
        from: BillStatus,
        action: &'static str,
    },
}

impl From<LifecycleError> for AppError {
    fn from(err: LifecycleError) -> Self {
        AppError::BadRequest(anyhow::Error::new(err))
    }
}

/// Whether a direct transition between two statuses is allowed.
pub fn can_transition(from: BillStatus, to: BillStatus) -> bool {
    use BillStatus::*;
    matches!(
        (from, to),
        (Draft, Analysed)
            | (Draft, Verified)
            | (Analysed, Verified)
            | (Verified, Synced)
            | (Verified, Posted)
    )
}

/// Outcome of requesting a verify action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerifyDisposition {
    Proceed,
    /// Verify at or beyond `Verified` is a client-side no-op, not an error.
    AlreadyVerified,
}

pub fn begin_verify(status: BillStatus) -> VerifyDisposition {
    if status.is_verified_or_beyond() {
        VerifyDisposition::AlreadyVerified
    } else {
        VerifyDisposition::Proceed
    }
}

/// Sync is available only from `Verified`; anywhere else is rejected before
/// any external call is made.
pub fn begin_sync(status: BillStatus) -> Result<(), LifecycleError> {
    if status == BillStatus::Verified {
        Ok(())
    } else {
        Err(LifecycleError::InvalidTransition {
            from: status,
            action: "sync",
        })
    }
}

pub fn after_verify() -> BillStatus {
    BillStatus::Verified
}

/// The external system reports whether the record was finally posted.
pub fn after_sync(posted: bool) -> BillStatus {
    if posted {
        BillStatus::Posted
    } else {
        BillStatus::Synced
    }
}
