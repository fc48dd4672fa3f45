//! Lookups across the approval/entity links: a dismissal points at its
//! governing approval request via `approval_id`, and the request points
//! back via `dismissal_id`; appointments are referenced from the
//! request payload.

use std::sync::Arc;

use stafflow_core::domain::appointment::AppointmentId;
use stafflow_core::domain::approval::{ApprovalRequest, ApprovalRequestId};
use stafflow_core::domain::dismissal::{Dismissal, DismissalId};
use stafflow_core::errors::ApplicationError;
use stafflow_db::repositories::{ApprovalRepository, DismissalRepository, RepositoryError};

pub struct LinkedEntityBridge {
    approvals: Arc<dyn ApprovalRepository>,
    dismissals: Arc<dyn DismissalRepository>,
}

fn store_failure(error: RepositoryError) -> ApplicationError {
    ApplicationError::Persistence(error.to_string())
}

impl LinkedEntityBridge {
    pub fn new(
        approvals: Arc<dyn ApprovalRepository>,
        dismissals: Arc<dyn DismissalRepository>,
    ) -> Self {
        Self { approvals, dismissals }
    }

    pub async fn dismissal_for_approval(
        &self,
        approval_id: &ApprovalRequestId,
    ) -> Result<Dismissal, ApplicationError> {
        self.dismissals
            .find_by_approval_id(approval_id)
            .await
            .map_err(store_failure)?
            .ok_or_else(|| ApplicationError::NotFound {
                entity: "dismissal for approval",
                id: approval_id.0.clone(),
            })
    }

    pub async fn approval_for_dismissal(
        &self,
        dismissal_id: &DismissalId,
    ) -> Result<ApprovalRequest, ApplicationError> {
        self.approvals
            .find_by_dismissal_id(dismissal_id)
            .await
            .map_err(store_failure)?
            .ok_or_else(|| ApplicationError::NotFound {
                entity: "approval for dismissal",
                id: dismissal_id.0.clone(),
            })
    }

    pub async fn approval_for_appointment(
        &self,
        appointment_id: &AppointmentId,
    ) -> Result<ApprovalRequest, ApplicationError> {
        self.approvals
            .find_by_appointment_id(appointment_id)
            .await
            .map_err(store_failure)?
            .ok_or_else(|| ApplicationError::NotFound {
                entity: "approval for appointment",
                id: appointment_id.0.clone(),
            })
    }
}
