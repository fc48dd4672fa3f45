use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::actor::{ActorId, Role};
use crate::domain::appointment::{AppointmentId, HrAction};
use crate::domain::contract::{ContractId, ContractUpdate};
use crate::domain::dismissal::DismissalId;
use crate::domain::employee::{EmployeeId, EmployeeUpdate};
use crate::domain::resignation::ResignationId;
use crate::domain::salary::SalaryId;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ApprovalRequestId(pub String);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalStatus {
    Pending,
    WaitingAdmin,
    Approved,
    Rejected,
}

impl ApprovalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::WaitingAdmin => "waiting_admin",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "pending" => Some(Self::Pending),
            "waiting_admin" => Some(Self::WaitingAdmin),
            "approved" => Some(Self::Approved),
            "rejected" => Some(Self::Rejected),
            _ => None,
        }
    }

    /// Terminal states admit no further transition.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Approved | Self::Rejected)
    }
}

/// Storage discriminant for the request payload union.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestKind {
    CreateUser,
    UpdateUser,
    DeleteUser,
    UpdateContract,
    UpdateSalary,
    DismissEmployee,
    ApproveResignation,
    AppointmentApproval,
}

impl RequestKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CreateUser => "create_user",
            Self::UpdateUser => "update_user",
            Self::DeleteUser => "delete_user",
            Self::UpdateContract => "update_contract",
            Self::UpdateSalary => "update_salary",
            Self::DismissEmployee => "dismiss_employee",
            Self::ApproveResignation => "approve_resignation",
            Self::AppointmentApproval => "appointment_approval",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "create_user" => Some(Self::CreateUser),
            "update_user" => Some(Self::UpdateUser),
            "delete_user" => Some(Self::DeleteUser),
            "update_contract" => Some(Self::UpdateContract),
            "update_salary" => Some(Self::UpdateSalary),
            "dismiss_employee" => Some(Self::DismissEmployee),
            "approve_resignation" => Some(Self::ApproveResignation),
            "appointment_approval" => Some(Self::AppointmentApproval),
            _ => None,
        }
    }
}

/// Typed request payload, one variant per `request_type`. Unknown
/// discriminants fail at deserialization instead of passing through
/// unvalidated, and every consumer matches exhaustively so adding a
/// variant is a compile error until it is handled everywhere.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "request_type", rename_all = "snake_case")]
pub enum RequestPayload {
    CreateUser {
        email: String,
        full_name: String,
        position: String,
        department: String,
        starting_salary: Decimal,
    },
    UpdateUser {
        user_id: EmployeeId,
        update_data: EmployeeUpdate,
        old_data: EmployeeUpdate,
    },
    DeleteUser {
        user_id: EmployeeId,
        reason: String,
    },
    UpdateContract {
        contract_id: ContractId,
        update_data: ContractUpdate,
        old_data: ContractUpdate,
    },
    UpdateSalary {
        salary_id: SalaryId,
        amount: Decimal,
        old_amount: Decimal,
        reason: String,
    },
    DismissEmployee {
        user_id: EmployeeId,
        old_position: String,
        new_position: String,
        reason: String,
        effective_date: DateTime<Utc>,
    },
    ApproveResignation {
        resignation_id: ResignationId,
        user_id: EmployeeId,
    },
    AppointmentApproval {
        appointment_id: AppointmentId,
        user_id: EmployeeId,
        new_position: String,
    },
}

impl RequestPayload {
    pub fn kind(&self) -> RequestKind {
        match self {
            Self::CreateUser { .. } => RequestKind::CreateUser,
            Self::UpdateUser { .. } => RequestKind::UpdateUser,
            Self::DeleteUser { .. } => RequestKind::DeleteUser,
            Self::UpdateContract { .. } => RequestKind::UpdateContract,
            Self::UpdateSalary { .. } => RequestKind::UpdateSalary,
            Self::DismissEmployee { .. } => RequestKind::DismissEmployee,
            Self::ApproveResignation { .. } => RequestKind::ApproveResignation,
            Self::AppointmentApproval { .. } => RequestKind::AppointmentApproval,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalRequest {
    pub id: ApprovalRequestId,
    pub payload: RequestPayload,
    pub status: ApprovalStatus,
    pub requested_by: ActorId,
    pub requested_by_role: Role,
    pub processed_by: Option<ActorId>,
    pub admin_response: Option<String>,
    pub processed_at: Option<DateTime<Utc>>,
    pub hr_action: Option<HrAction>,
    pub hr_feedback: Option<String>,
    pub hr_processed_by: Option<ActorId>,
    pub hr_feedback_at: Option<DateTime<Utc>>,
    pub dismissal_id: Option<DismissalId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ApprovalRequest {
    /// HR-raised appointment approvals must pass through the
    /// `waiting_admin` escalation before an Admin can resolve them.
    pub fn requires_escalation(&self) -> bool {
        self.payload.kind() == RequestKind::AppointmentApproval
            && self.requested_by_role == Role::Hr
    }
}
