//! Verify/sync gateway.
//!
//! Serializes a Draft into the external accounting system's submission
//! shape and owns the status transition around each call. The gateway makes
//! at most one attempt per invocation; failed calls leave the Draft and its
//! status untouched and the user must re-trigger.

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::models::bill::{BillStatus, Direction, DocumentKind, TaxType};
use crate::models::catalog::TaxClass;
use crate::models::draft::Draft;
use crate::services::catalog::CatalogSet;
use crate::services::lifecycle::{self, VerifyDisposition};
use crate::services::metrics::{
    ERRORS_TOTAL, GATEWAY_CALL_DURATION, SYNCS_TOTAL, VERIFICATIONS_TOTAL,
};
use crate::services::validator::{validate, ImbalanceDetail, ValidationReport};

/// Resolved vendor ledger in the submission. Carries the catalog name, not
/// the raw OCR text.
#[derive(Debug, Clone, Serialize)]
pub struct ResolvedVendor {
    pub ledger_id: Uuid,
    pub ledger_name: String,
    pub gst_number: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SubmissionTaxLine {
    pub class: TaxClass,
    pub ledger_id: Uuid,
    pub ledger_name: Option<String>,
    pub amount: Decimal,
}

#[derive(Debug, Clone, Serialize)]
pub struct SubmissionLineItem {
    pub ledger_id: Uuid,
    pub description: String,
    pub amount: Decimal,
    pub direction: Direction,
    pub item_id: Option<Uuid>,
}

/// External submission shape for a verify call.
#[derive(Debug, Clone, Serialize)]
pub struct VerifySubmission {
    pub bill_id: Uuid,
    pub bill_number: String,
    pub bill_date: NaiveDate,
    pub due_date: Option<NaiveDate>,
    pub tax_type: TaxType,
    pub document_kind: DocumentKind,
    pub vendor: ResolvedVendor,
    pub tax_lines: Vec<SubmissionTaxLine>,
    pub line_items: Vec<SubmissionLineItem>,
    pub notes: String,
}

impl VerifySubmission {
    /// Wire payload for transport implementations.
    pub fn to_payload(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::to_value(self)
    }
}

/// Acknowledgement from the external system.
#[derive(Debug, Clone)]
pub struct Confirmation {
    pub bill_id: Uuid,
    pub reference: Option<String>,
    /// True when the external system reports final posting.
    pub posted: bool,
}

#[derive(Debug, Error)]
pub enum GatewayError {
    /// Local validation failed; no network call was made.
    #[error("Verification blocked by local validation")]
    Validation(ValidationReport),

    #[error(transparent)]
    Lifecycle(#[from] lifecycle::LifecycleError),

    /// Server-side re-validation failure, surfaced verbatim.
    #[error("Rejected by accounting system: {message}")]
    RemoteRejection {
        message: String,
        imbalance: Option<ImbalanceDetail>,
    },

    /// Network failure on a single attempt. Retry is user-triggered only.
    #[error("Transport failure: {0}")]
    Transport(#[source] anyhow::Error),
}

impl GatewayError {
    pub fn error_type(&self) -> &'static str {
        match self {
            GatewayError::Validation(_) => "validation",
            GatewayError::Lifecycle(_) => "lifecycle",
            GatewayError::RemoteRejection { .. } => "remote_rejection",
            GatewayError::Transport(_) => "transport",
        }
    }
}

/// Boundary to the external accounting system. One attempt per invocation;
/// no internal retry loop. Sync is idempotent remotely by bill id.
#[async_trait]
pub trait AccountingGateway: Send + Sync {
    async fn verify(&self, submission: &VerifySubmission) -> Result<Confirmation, GatewayError>;

    async fn sync(&self, bill_id: Uuid) -> Result<Confirmation, GatewayError>;
}

/// Serialize a Draft for submission. Rejects locally, without any network
/// call, while the validation report blocks verification.
pub fn build_submission(
    draft: &Draft,
    catalogs: &CatalogSet,
) -> Result<VerifySubmission, GatewayError> {
    let report = validate(draft, catalogs);
    if report.blocks_verification() {
        return Err(GatewayError::Validation(report));
    }

    let vendor_ref = draft
        .header
        .selected_vendor
        .as_ref()
        .ok_or_else(|| GatewayError::Validation(report.clone()))?;
    let vendor = ResolvedVendor {
        ledger_id: vendor_ref.ledger_id,
        ledger_name: vendor_ref.name.clone(),
        gst_number: vendor_ref.gst_number.clone(),
    };

    let mut tax_lines = Vec::new();
    for class in TaxClass::ALL {
        if let Some(ledger_id) = draft.tax_summary.ledger_id(class) {
            tax_lines.push(SubmissionTaxLine {
                class,
                ledger_id,
                ledger_name: catalogs
                    .tax_ledger_name(class, ledger_id)
                    .map(str::to_string),
                amount: draft.tax_summary.amount(class),
            });
        }
    }

    let line_items = draft
        .line_items
        .iter()
        .map(|line| {
            line.chart_of_accounts_id
                .map(|ledger_id| SubmissionLineItem {
                    ledger_id,
                    description: line.description.clone(),
                    amount: line.amount,
                    direction: line.direction,
                    item_id: line.item_id,
                })
                .ok_or_else(|| GatewayError::Validation(report.clone()))
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(VerifySubmission {
        bill_id: draft.header.bill_id,
        bill_number: draft.header.bill_number.clone(),
        bill_date: draft.header.bill_date,
        due_date: draft.header.due_date,
        tax_type: draft.header.tax_type,
        document_kind: draft.document_kind,
        vendor,
        tax_lines,
        line_items,
        notes: draft.notes.clone(),
    })
}

/// Orchestrates validation, lifecycle and gateway calls for one bill.
pub struct VerificationService<G> {
    gateway: G,
}

impl<G: AccountingGateway> VerificationService<G> {
    pub fn new(gateway: G) -> Self {
        Self { gateway }
    }

    /// Verify the Draft. Returns `Ok(None)` when the bill is already at or
    /// beyond `Verified` (idempotent client-side no-op). On failure the
    /// Draft and its status are left exactly as they were.
    #[instrument(skip(self, draft, catalogs), fields(bill_id = %draft.header.bill_id, status = %draft.status))]
    pub async fn verify(
        &self,
        draft: &mut Draft,
        catalogs: &CatalogSet,
    ) -> Result<Option<Confirmation>, GatewayError> {
        if begin_is_noop(draft.status) {
            debug!("Bill already verified, skipping");
            VERIFICATIONS_TOTAL.with_label_values(&["noop"]).inc();
            return Ok(None);
        }

        let submission = build_submission(draft, catalogs).map_err(|err| {
            ERRORS_TOTAL.with_label_values(&[err.error_type()]).inc();
            err
        })?;

        let timer = GATEWAY_CALL_DURATION
            .with_label_values(&["verify"])
            .start_timer();
        let result = self.gateway.verify(&submission).await;
        timer.observe_duration();

        match result {
            Ok(confirmation) => {
                draft.status = lifecycle::after_verify();
                VERIFICATIONS_TOTAL.with_label_values(&["success"]).inc();
                info!(bill_number = %submission.bill_number, "Bill verified");
                Ok(Some(confirmation))
            }
            Err(err) => {
                VERIFICATIONS_TOTAL.with_label_values(&["failure"]).inc();
                ERRORS_TOTAL.with_label_values(&[err.error_type()]).inc();
                warn!(error = %err, "Verification failed, draft unchanged");
                Err(err)
            }
        }
    }

    /// Push a verified bill into the external accounting system. Rejected
    /// without any external call unless the status is `Verified`.
    #[instrument(skip(self, draft), fields(bill_id = %draft.header.bill_id, status = %draft.status))]
    pub async fn sync(&self, draft: &mut Draft) -> Result<Confirmation, GatewayError> {
        lifecycle::begin_sync(draft.status).map_err(|err| {
            ERRORS_TOTAL.with_label_values(&["lifecycle"]).inc();
            GatewayError::from(err)
        })?;

        let timer = GATEWAY_CALL_DURATION
            .with_label_values(&["sync"])
            .start_timer();
        let result = self.gateway.sync(draft.header.bill_id).await;
        timer.observe_duration();

        match result {
            Ok(confirmation) => {
                draft.status = lifecycle::after_sync(confirmation.posted);
                SYNCS_TOTAL.with_label_values(&["success"]).inc();
                info!(status = %draft.status, "Bill synced");
                Ok(confirmation)
            }
            Err(err) => {
                SYNCS_TOTAL.with_label_values(&["failure"]).inc();
                ERRORS_TOTAL.with_label_values(&[err.error_type()]).inc();
                warn!(error = %err, "Sync failed, status unchanged");
                Err(err)
            }
        }
    }
}

fn begin_is_noop(status: BillStatus) -> bool {
    lifecycle::begin_verify(status) == VerifyDisposition::AlreadyVerified
}
