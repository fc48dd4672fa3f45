//! JSON API for the approval workflow.
//!
//! - `POST /approvals`                      — submit a request
//! - `GET  /approvals/{id}`                 — fetch one request
//! - `GET  /approvals?status=&limit=`       — list by status
//! - `POST /approvals/{id}/review`          — HR escalation step
//! - `POST /approvals/{id}/decision`        — Admin terminal step
//! - `GET  /approvals/{id}/dismissal`       — linked dismissal record
//! - `GET  /dismissals/{id}/approval`       — governing approval request
//! - `GET  /appointments/{id}/approval`     — governing approval request
//!
//! Identity arrives from the authenticating gateway as `x-actor-id` and
//! `x-actor-role` headers; when `auth.gateway_secret` is configured the
//! gateway must also present it in `x-gateway-secret`.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use stafflow_core::config::AuthConfig;
use stafflow_core::domain::actor::{Actor, Role};
use stafflow_core::domain::appointment::{AppointmentId, HrAction};
use stafflow_core::domain::approval::{
    ApprovalRequest, ApprovalRequestId, ApprovalStatus, RequestPayload,
};
use stafflow_core::domain::dismissal::{Dismissal, DismissalId};
use stafflow_core::errors::{ApplicationError, InterfaceError};
use stafflow_core::transitions::Verdict;
use stafflow_workflow::ApprovalService;
use tracing::info;
use uuid::Uuid;

const DEFAULT_LIST_LIMIT: u32 = 50;
const MAX_LIST_LIMIT: u32 = 200;

#[derive(Clone)]
pub struct ApiState {
    service: Arc<ApprovalService>,
    gateway_secret: Option<SecretString>,
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: String,
    pub message: String,
    pub correlation_id: String,
}

#[derive(Debug, Deserialize)]
pub struct ReviewBody {
    pub action: String,
    pub feedback: String,
}

#[derive(Debug, Deserialize)]
pub struct DecisionBody {
    pub verdict: String,
    pub admin_response: String,
}

#[derive(Debug, Deserialize, Default)]
pub struct ListQuery {
    pub status: Option<String>,
    pub limit: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct ListResponse {
    pub requests: Vec<ApprovalRequest>,
    pub status: String,
}

pub fn router(service: Arc<ApprovalService>, auth: &AuthConfig) -> Router {
    Router::new()
        .route("/approvals", post(submit_approval).get(list_approvals))
        .route("/approvals/{id}", get(get_approval))
        .route("/approvals/{id}/review", post(review_approval))
        .route("/approvals/{id}/decision", post(decide_approval))
        .route("/approvals/{id}/dismissal", get(dismissal_for_approval))
        .route("/dismissals/{id}/approval", get(approval_for_dismissal))
        .route("/appointments/{id}/approval", get(approval_for_appointment))
        .with_state(ApiState { service, gateway_secret: auth.gateway_secret.clone() })
}

type HandlerError = (StatusCode, Json<ApiError>);

fn respond(error: ApplicationError, correlation_id: &str) -> HandlerError {
    let interface = error.into_interface(correlation_id);
    let status = match &interface {
        InterfaceError::BadRequest { .. } => StatusCode::BAD_REQUEST,
        InterfaceError::Forbidden { .. } => StatusCode::FORBIDDEN,
        InterfaceError::NotFound { .. } => StatusCode::NOT_FOUND,
        InterfaceError::Conflict { .. } => StatusCode::CONFLICT,
        InterfaceError::ServiceUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
        InterfaceError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (
        status,
        Json(ApiError {
            error: interface.user_message().to_string(),
            message: interface.to_string(),
            correlation_id: correlation_id.to_string(),
        }),
    )
}

fn bad_request(message: impl Into<String>, correlation_id: &str) -> HandlerError {
    (
        StatusCode::BAD_REQUEST,
        Json(ApiError {
            error: "The request could not be processed. Check inputs and try again.".to_string(),
            message: message.into(),
            correlation_id: correlation_id.to_string(),
        }),
    )
}

fn forbidden(message: impl Into<String>, correlation_id: &str) -> HandlerError {
    (
        StatusCode::FORBIDDEN,
        Json(ApiError {
            error: "You are not permitted to perform this action.".to_string(),
            message: message.into(),
            correlation_id: correlation_id.to_string(),
        }),
    )
}

fn header_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|value| value.to_str().ok()).map(str::trim)
}

/// Resolve the calling principal from the gateway-injected headers.
fn authenticate(
    state: &ApiState,
    headers: &HeaderMap,
    correlation_id: &str,
) -> Result<Actor, HandlerError> {
    if let Some(expected) = &state.gateway_secret {
        let presented = header_value(headers, "x-gateway-secret").unwrap_or("");
        if presented != expected.expose_secret() {
            return Err(forbidden("gateway secret missing or invalid", correlation_id));
        }
    }

    let actor_id = header_value(headers, "x-actor-id")
        .filter(|value| !value.is_empty())
        .ok_or_else(|| bad_request("x-actor-id header is required", correlation_id))?;

    let role = header_value(headers, "x-actor-role")
        .and_then(Role::parse)
        .ok_or_else(|| {
            bad_request("x-actor-role header must be admin, hr, or employee", correlation_id)
        })?;

    Ok(Actor::new(actor_id, role))
}

async fn submit_approval(
    State(state): State<ApiState>,
    headers: HeaderMap,
    Json(payload): Json<RequestPayload>,
) -> Result<(StatusCode, Json<ApprovalRequest>), HandlerError> {
    let correlation_id = Uuid::new_v4().to_string();
    let actor = authenticate(&state, &headers, &correlation_id)?;

    let request = state
        .service
        .submit(&actor, payload, &correlation_id)
        .await
        .map_err(|error| respond(error, &correlation_id))?;

    info!(
        event_name = "api.approval.submitted",
        correlation_id = %correlation_id,
        request_id = %request.id.0,
        request_type = request.payload.kind().as_str(),
        "approval request accepted"
    );

    Ok((StatusCode::CREATED, Json(request)))
}

async fn get_approval(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> Result<Json<ApprovalRequest>, HandlerError> {
    let correlation_id = Uuid::new_v4().to_string();
    let id = ApprovalRequestId(id);

    let request = state
        .service
        .find(&id)
        .await
        .map_err(|error| respond(error, &correlation_id))?
        .ok_or_else(|| {
            respond(
                ApplicationError::NotFound { entity: "approval request", id: id.0.clone() },
                &correlation_id,
            )
        })?;

    Ok(Json(request))
}

async fn list_approvals(
    State(state): State<ApiState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<ListResponse>, HandlerError> {
    let correlation_id = Uuid::new_v4().to_string();

    let status = match query.status.as_deref() {
        None => ApprovalStatus::Pending,
        Some(raw) => ApprovalStatus::parse(raw).ok_or_else(|| {
            bad_request(format!("unknown status filter `{raw}`"), &correlation_id)
        })?,
    };
    let limit = query.limit.unwrap_or(DEFAULT_LIST_LIMIT).min(MAX_LIST_LIMIT);

    let requests = state
        .service
        .list_by_status(status, limit)
        .await
        .map_err(|error| respond(error, &correlation_id))?;

    Ok(Json(ListResponse { requests, status: status.as_str().to_string() }))
}

async fn review_approval(
    State(state): State<ApiState>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(body): Json<ReviewBody>,
) -> Result<Json<ApprovalRequest>, HandlerError> {
    let correlation_id = Uuid::new_v4().to_string();
    let actor = authenticate(&state, &headers, &correlation_id)?;

    let hr_action = HrAction::parse(&body.action).ok_or_else(|| {
        bad_request("action must be `approve` or `reject`", &correlation_id)
    })?;

    let request = state
        .service
        .hr_review(&actor, &ApprovalRequestId(id), hr_action, &body.feedback, &correlation_id)
        .await
        .map_err(|error| respond(error, &correlation_id))?;

    Ok(Json(request))
}

async fn decide_approval(
    State(state): State<ApiState>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(body): Json<DecisionBody>,
) -> Result<Json<ApprovalRequest>, HandlerError> {
    let correlation_id = Uuid::new_v4().to_string();
    let actor = authenticate(&state, &headers, &correlation_id)?;

    let verdict = Verdict::parse(&body.verdict).ok_or_else(|| {
        bad_request("verdict must be `approve` or `reject`", &correlation_id)
    })?;

    let request = state
        .service
        .decide(&actor, &ApprovalRequestId(id), verdict, &body.admin_response, &correlation_id)
        .await
        .map_err(|error| respond(error, &correlation_id))?;

    info!(
        event_name = "api.approval.decided",
        correlation_id = %correlation_id,
        request_id = %request.id.0,
        status = request.status.as_str(),
        "approval request resolved"
    );

    Ok(Json(request))
}

async fn dismissal_for_approval(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> Result<Json<Dismissal>, HandlerError> {
    let correlation_id = Uuid::new_v4().to_string();
    let dismissal = state
        .service
        .dismissal_for_approval(&ApprovalRequestId(id))
        .await
        .map_err(|error| respond(error, &correlation_id))?;
    Ok(Json(dismissal))
}

async fn approval_for_dismissal(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> Result<Json<ApprovalRequest>, HandlerError> {
    let correlation_id = Uuid::new_v4().to_string();
    let request = state
        .service
        .approval_for_dismissal(&DismissalId(id))
        .await
        .map_err(|error| respond(error, &correlation_id))?;
    Ok(Json(request))
}

async fn approval_for_appointment(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> Result<Json<ApprovalRequest>, HandlerError> {
    let correlation_id = Uuid::new_v4().to_string();
    let request = state
        .service
        .approval_for_appointment(&AppointmentId(id))
        .await
        .map_err(|error| respond(error, &correlation_id))?;
    Ok(Json(request))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::extract::{Path, Query, State};
    use axum::http::{HeaderMap, HeaderValue, StatusCode};
    use axum::Json;
    use chrono::Utc;
    use secrecy::SecretString;

    use stafflow_core::audit::InMemoryAuditSink;
    use stafflow_core::domain::approval::{ApprovalStatus, RequestPayload};
    use stafflow_core::domain::employee::{Employee, EmployeeId, EmployeeStatus};
    use stafflow_db::repositories::{
        EmployeeRepository, InMemoryAppointmentRepository, InMemoryApprovalRepository,
        InMemoryContractRepository, InMemoryDismissalRepository, InMemoryEmployeeRepository,
        InMemoryResignationRepository, InMemorySalaryRepository,
    };
    use stafflow_workflow::{ApprovalService, WorkflowStores};

    use super::{
        decide_approval, get_approval, list_approvals, submit_approval, ApiState, DecisionBody,
        ListQuery,
    };

    fn service() -> (Arc<ApprovalService>, Arc<InMemoryEmployeeRepository>) {
        let employees = Arc::new(InMemoryEmployeeRepository::default());
        let service = ApprovalService::new(
            WorkflowStores {
                approvals: Arc::new(InMemoryApprovalRepository::default()),
                employees: employees.clone(),
                contracts: Arc::new(InMemoryContractRepository::default()),
                salaries: Arc::new(InMemorySalaryRepository::default()),
                resignations: Arc::new(InMemoryResignationRepository::default()),
                dismissals: Arc::new(InMemoryDismissalRepository::default()),
                appointments: Arc::new(InMemoryAppointmentRepository::default()),
            },
            Arc::new(InMemoryAuditSink::default()),
        );
        (Arc::new(service), employees)
    }

    fn state(service: Arc<ApprovalService>, secret: Option<&str>) -> State<ApiState> {
        State(ApiState {
            service,
            gateway_secret: secret.map(|value| SecretString::from(value.to_string())),
        })
    }

    fn actor_headers(id: &str, role: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert("x-actor-id", HeaderValue::from_str(id).expect("header"));
        headers.insert("x-actor-role", HeaderValue::from_str(role).expect("header"));
        headers
    }

    fn delete_user_payload() -> RequestPayload {
        RequestPayload::DeleteUser {
            user_id: EmployeeId("emp-1".to_string()),
            reason: "duplicate account".to_string(),
        }
    }

    async fn seed_employee(employees: &InMemoryEmployeeRepository) {
        let now = Utc::now();
        employees
            .save(Employee {
                id: EmployeeId("emp-1".to_string()),
                email: "emp-1@corp.example".to_string(),
                full_name: "Test Employee".to_string(),
                position: "engineer".to_string(),
                department: "platform".to_string(),
                status: EmployeeStatus::Active,
                created_at: now,
                updated_at: now,
            })
            .await
            .expect("seed employee");
    }

    #[tokio::test]
    async fn submit_returns_created_with_pending_request() {
        let (service, _) = service();

        let (status, Json(request)) = submit_approval(
            state(service, None),
            actor_headers("hr-1", "hr"),
            Json(delete_user_payload()),
        )
        .await
        .expect("submission should succeed");

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(request.status, ApprovalStatus::Pending);
        assert_eq!(request.requested_by.0, "hr-1");
    }

    #[tokio::test]
    async fn submit_without_actor_headers_is_a_bad_request() {
        let (service, _) = service();

        let result =
            submit_approval(state(service, None), HeaderMap::new(), Json(delete_user_payload()))
                .await;

        let (status, Json(body)) = result.expect_err("missing identity must fail");
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.message.contains("x-actor-id"));
    }

    #[tokio::test]
    async fn submit_with_unknown_role_is_a_bad_request() {
        let (service, _) = service();

        let result = submit_approval(
            state(service, None),
            actor_headers("ops-1", "superuser"),
            Json(delete_user_payload()),
        )
        .await;

        let (status, _) = result.expect_err("unknown role must fail");
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn gateway_secret_mismatch_is_forbidden() {
        let (service, _) = service();

        let result = submit_approval(
            state(service, Some("shared-secret")),
            actor_headers("hr-1", "hr"),
            Json(delete_user_payload()),
        )
        .await;

        let (status, Json(body)) = result.expect_err("missing secret must be denied");
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert!(body.message.contains("gateway secret"));
    }

    #[tokio::test]
    async fn hr_decision_attempt_maps_to_forbidden() {
        let (service, employees) = service();
        seed_employee(&employees).await;

        let (_, Json(request)) = submit_approval(
            state(service.clone(), None),
            actor_headers("hr-1", "hr"),
            Json(delete_user_payload()),
        )
        .await
        .expect("submission");

        let result = decide_approval(
            state(service, None),
            Path(request.id.0.clone()),
            actor_headers("hr-1", "hr"),
            Json(DecisionBody {
                verdict: "approve".to_string(),
                admin_response: "self-approval".to_string(),
            }),
        )
        .await;

        let (status, _) = result.expect_err("hr may not decide");
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn terminal_request_maps_to_conflict_on_second_decision() {
        let (service, employees) = service();
        seed_employee(&employees).await;

        let (_, Json(request)) = submit_approval(
            state(service.clone(), None),
            actor_headers("hr-1", "hr"),
            Json(delete_user_payload()),
        )
        .await
        .expect("submission");

        decide_approval(
            state(service.clone(), None),
            Path(request.id.0.clone()),
            actor_headers("admin-1", "admin"),
            Json(DecisionBody {
                verdict: "approve".to_string(),
                admin_response: "confirmed".to_string(),
            }),
        )
        .await
        .expect("first decision succeeds");

        let result = decide_approval(
            state(service, None),
            Path(request.id.0.clone()),
            actor_headers("admin-1", "admin"),
            Json(DecisionBody {
                verdict: "approve".to_string(),
                admin_response: "again".to_string(),
            }),
        )
        .await;

        let (status, _) = result.expect_err("terminal request cannot be re-decided");
        assert_eq!(status, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn missing_approval_returns_not_found() {
        let (service, _) = service();

        let result = get_approval(state(service, None), Path("apr-ghost".to_string())).await;

        let (status, Json(body)) = result.expect_err("unknown id must be a 404");
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body.message.contains("apr-ghost"));
    }

    #[tokio::test]
    async fn list_rejects_unknown_status_filter() {
        let (service, _) = service();

        let result = list_approvals(
            state(service, None),
            Query(ListQuery { status: Some("escalated".to_string()), limit: None }),
        )
        .await;

        let (status, _) = result.expect_err("unknown status must fail");
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn list_defaults_to_pending() {
        let (service, _) = service();
        submit_approval(
            state(service.clone(), None),
            actor_headers("hr-1", "hr"),
            Json(delete_user_payload()),
        )
        .await
        .expect("submission");

        let Json(listed) =
            list_approvals(state(service, None), Query(ListQuery::default()))
                .await
                .expect("listing");

        assert_eq!(listed.status, "pending");
        assert_eq!(listed.requests.len(), 1);
    }
}
