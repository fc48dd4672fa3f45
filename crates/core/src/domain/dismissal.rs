use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::actor::ActorId;
use crate::domain::approval::ApprovalRequestId;
use crate::domain::employee::EmployeeId;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DismissalId(pub String);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DismissalStatus {
    Pending,
    Approved,
    Rejected,
}

impl DismissalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "pending" => Some(Self::Pending),
            "approved" => Some(Self::Approved),
            "rejected" => Some(Self::Rejected),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dismissal {
    pub id: DismissalId,
    pub user_id: EmployeeId,
    pub old_position: String,
    pub new_position: String,
    pub reason: String,
    pub effective_date: DateTime<Utc>,
    pub created_by: ActorId,
    pub status: DismissalStatus,
    pub admin_response: Option<String>,
    pub approval_id: Option<ApprovalRequestId>,
    pub processed_by: Option<ActorId>,
    pub processed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Dismissal {
    /// Move the dismissal out of `pending`, stamping the processing actor
    /// and timestamp on the first status change only.
    pub fn resolve(
        &mut self,
        status: DismissalStatus,
        processed_by: ActorId,
        admin_response: impl Into<String>,
        now: DateTime<Utc>,
    ) {
        self.status = status;
        self.admin_response = Some(admin_response.into());
        if self.processed_at.is_none() {
            self.processed_by = Some(processed_by);
            self.processed_at = Some(now);
        }
        self.updated_at = now;
    }
}
