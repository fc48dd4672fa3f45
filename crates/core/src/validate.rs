use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use thiserror::Error;

use crate::domain::approval::RequestPayload;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("required field `{field}` is missing or empty")]
    EmptyField { field: &'static str },
    #[error("`{field}` contains no fields to apply")]
    EmptyUpdate { field: &'static str },
    #[error("`{field}` must be a positive amount, got {amount}")]
    NonPositiveAmount { field: &'static str, amount: Decimal },
    #[error("effective_date {effective_date} is earlier than the submission time {now}")]
    EffectiveDateInPast { effective_date: DateTime<Utc>, now: DateTime<Utc> },
}

/// Shape-check a candidate payload before it is persisted. The tagged
/// union already guarantees the per-type field set; this enforces the
/// residual semantic rules, naming the offending field on failure.
pub fn validate_payload(payload: &RequestPayload, now: DateTime<Utc>) -> Result<(), ValidationError> {
    match payload {
        RequestPayload::CreateUser { email, full_name, position, department, starting_salary } => {
            require("email", email)?;
            require("full_name", full_name)?;
            require("position", position)?;
            require("department", department)?;
            require_positive("starting_salary", *starting_salary)
        }
        RequestPayload::UpdateUser { user_id, update_data, .. } => {
            require("user_id", &user_id.0)?;
            if update_data.is_empty() {
                return Err(ValidationError::EmptyUpdate { field: "update_data" });
            }
            Ok(())
        }
        RequestPayload::DeleteUser { user_id, reason } => {
            require("user_id", &user_id.0)?;
            require("reason", reason)
        }
        RequestPayload::UpdateContract { contract_id, update_data, .. } => {
            require("contract_id", &contract_id.0)?;
            if update_data.is_empty() {
                return Err(ValidationError::EmptyUpdate { field: "update_data" });
            }
            Ok(())
        }
        RequestPayload::UpdateSalary { salary_id, amount, reason, .. } => {
            require("salary_id", &salary_id.0)?;
            require("reason", reason)?;
            require_positive("amount", *amount)
        }
        RequestPayload::DismissEmployee {
            user_id,
            old_position,
            new_position,
            reason,
            effective_date,
        } => {
            require("user_id", &user_id.0)?;
            require("old_position", old_position)?;
            require("new_position", new_position)?;
            require("reason", reason)?;
            if *effective_date < now {
                return Err(ValidationError::EffectiveDateInPast {
                    effective_date: *effective_date,
                    now,
                });
            }
            Ok(())
        }
        RequestPayload::ApproveResignation { resignation_id, user_id } => {
            require("resignation_id", &resignation_id.0)?;
            require("user_id", &user_id.0)
        }
        RequestPayload::AppointmentApproval { appointment_id, user_id, new_position } => {
            require("appointment_id", &appointment_id.0)?;
            require("user_id", &user_id.0)?;
            require("new_position", new_position)
        }
    }
}

fn require(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::EmptyField { field });
    }
    Ok(())
}

fn require_positive(field: &'static str, amount: Decimal) -> Result<(), ValidationError> {
    if amount <= Decimal::ZERO {
        return Err(ValidationError::NonPositiveAmount { field, amount });
    }
    Ok(())
}
