use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::actor::{Actor, ActorId, Role};
use crate::domain::appointment::HrAction;
use crate::domain::approval::{ApprovalRequest, ApprovalStatus, RequestKind, RequestPayload};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Approve,
    Reject,
}

impl Verdict {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Approve => "approve",
            Self::Reject => "reject",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "approve" => Some(Self::Approve),
            "reject" => Some(Self::Reject),
            _ => None,
        }
    }

    pub fn target_status(&self) -> ApprovalStatus {
        match self {
            Self::Approve => ApprovalStatus::Approved,
            Self::Reject => ApprovalStatus::Rejected,
        }
    }
}

/// What a principal is attempting to do to a pending request.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum TransitionAction {
    /// HR's non-binding recommendation, escalating to `waiting_admin`.
    HrReview { hr_action: HrAction, feedback: String },
    /// Admin's binding decision into a terminal state.
    Decide { verdict: Verdict, admin_response: String },
}

/// Resolution fields stamped on every terminal transition.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    pub processed_by: ActorId,
    pub admin_response: String,
    pub processed_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HrReviewStamp {
    pub hr_action: HrAction,
    pub feedback: String,
    pub reviewed_by: ActorId,
    pub reviewed_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionOutcome {
    pub from: ApprovalStatus,
    pub to: ApprovalStatus,
    pub resolution: Option<Resolution>,
    pub hr_review: Option<HrReviewStamp>,
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum TransitionError {
    #[error("request is already resolved as {status:?} and cannot transition")]
    AlreadyResolved { status: ApprovalStatus },
    #[error("no legal transition from {status:?} for a {kind:?} request")]
    InvalidTransition { status: ApprovalStatus, kind: RequestKind },
    #[error("terminal transitions require an admin principal, got role {role:?}")]
    TerminalRequiresAdmin { role: Role },
    #[error("hr review steps require an hr principal, got role {role:?}")]
    HrReviewRequiresHr { role: Role },
    #[error("{kind:?} requests raised by hr must pass hr review before an admin decision")]
    EscalationRequired { kind: RequestKind },
    #[error("{kind:?} requests do not use the hr review step")]
    EscalationNotApplicable { kind: RequestKind },
    #[error("admin_response is required for a terminal transition")]
    MissingAdminResponse,
    #[error("feedback is required for an hr review")]
    MissingFeedback,
    #[error("effective_date {effective_date} is earlier than the request creation time {created_at}")]
    EffectiveDateBeforeCreation {
        effective_date: DateTime<Utc>,
        created_at: DateTime<Utc>,
    },
}

/// Decide whether `actor` may apply `action` to `request`, and what the
/// resulting record state would be. Pure: callers persist the outcome.
/// Any error leaves the record untouched by construction.
pub fn plan_transition(
    request: &ApprovalRequest,
    actor: &Actor,
    action: &TransitionAction,
    now: DateTime<Utc>,
) -> Result<TransitionOutcome, TransitionError> {
    if request.status.is_terminal() {
        return Err(TransitionError::AlreadyResolved { status: request.status });
    }

    match action {
        TransitionAction::HrReview { hr_action, feedback } => {
            plan_hr_review(request, actor, *hr_action, feedback, now)
        }
        TransitionAction::Decide { verdict, admin_response } => {
            plan_decision(request, actor, *verdict, admin_response, now)
        }
    }
}

fn plan_hr_review(
    request: &ApprovalRequest,
    actor: &Actor,
    hr_action: HrAction,
    feedback: &str,
    now: DateTime<Utc>,
) -> Result<TransitionOutcome, TransitionError> {
    if !request.requires_escalation() {
        return Err(TransitionError::EscalationNotApplicable { kind: request.payload.kind() });
    }
    if actor.role != Role::Hr {
        return Err(TransitionError::HrReviewRequiresHr { role: actor.role });
    }
    if request.status != ApprovalStatus::Pending {
        return Err(TransitionError::InvalidTransition {
            status: request.status,
            kind: request.payload.kind(),
        });
    }
    if feedback.trim().is_empty() {
        return Err(TransitionError::MissingFeedback);
    }

    Ok(TransitionOutcome {
        from: request.status,
        to: ApprovalStatus::WaitingAdmin,
        resolution: None,
        hr_review: Some(HrReviewStamp {
            hr_action,
            feedback: feedback.to_string(),
            reviewed_by: actor.id.clone(),
            reviewed_at: now,
        }),
    })
}

fn plan_decision(
    request: &ApprovalRequest,
    actor: &Actor,
    verdict: Verdict,
    admin_response: &str,
    now: DateTime<Utc>,
) -> Result<TransitionOutcome, TransitionError> {
    if actor.role != Role::Admin {
        return Err(TransitionError::TerminalRequiresAdmin { role: actor.role });
    }
    if admin_response.trim().is_empty() {
        return Err(TransitionError::MissingAdminResponse);
    }

    if let RequestPayload::DismissEmployee { effective_date, .. } = &request.payload {
        if *effective_date < request.created_at {
            return Err(TransitionError::EffectiveDateBeforeCreation {
                effective_date: *effective_date,
                created_at: request.created_at,
            });
        }
    }

    let expected = if request.requires_escalation() {
        ApprovalStatus::WaitingAdmin
    } else {
        ApprovalStatus::Pending
    };

    if request.status != expected {
        if expected == ApprovalStatus::WaitingAdmin && request.status == ApprovalStatus::Pending {
            return Err(TransitionError::EscalationRequired { kind: request.payload.kind() });
        }
        return Err(TransitionError::InvalidTransition {
            status: request.status,
            kind: request.payload.kind(),
        });
    }

    Ok(TransitionOutcome {
        from: request.status,
        to: verdict.target_status(),
        resolution: Some(Resolution {
            processed_by: actor.id.clone(),
            admin_response: admin_response.to_string(),
            processed_at: now,
        }),
        hr_review: None,
    })
}
