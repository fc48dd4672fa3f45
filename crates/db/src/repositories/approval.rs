use chrono::{DateTime, Utc};
use sqlx::Row;

use stafflow_core::domain::actor::{ActorId, Role};
use stafflow_core::domain::appointment::{AppointmentId, HrAction};
use stafflow_core::domain::approval::{
    ApprovalRequest, ApprovalRequestId, ApprovalStatus, RequestPayload,
};
use stafflow_core::domain::dismissal::DismissalId;

use super::{ApprovalRepository, RepositoryError};
use crate::DbPool;

pub struct SqlApprovalRepository {
    pool: DbPool,
}

impl SqlApprovalRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

const SELECT_COLUMNS: &str = "id, request_type, payload, status, requested_by, requested_by_role,
            processed_by, admin_response, processed_at, hr_action, hr_feedback,
            hr_processed_by, hr_feedback_at, dismissal_id, created_at, updated_at";

fn parse_required_ts(value: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

fn parse_optional_ts(value: Option<String>) -> Option<DateTime<Utc>> {
    value.and_then(|s| DateTime::parse_from_rfc3339(&s).ok()).map(|dt| dt.with_timezone(&Utc))
}

fn row_to_request(row: &sqlx::sqlite::SqliteRow) -> Result<ApprovalRequest, RepositoryError> {
    let id: String = row.try_get("id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let payload_json: String =
        row.try_get("payload").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let status_str: String =
        row.try_get("status").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let requested_by: String =
        row.try_get("requested_by").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let requested_by_role: String =
        row.try_get("requested_by_role").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let processed_by: Option<String> =
        row.try_get("processed_by").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let admin_response: Option<String> =
        row.try_get("admin_response").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let processed_at: Option<String> =
        row.try_get("processed_at").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let hr_action: Option<String> =
        row.try_get("hr_action").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let hr_feedback: Option<String> =
        row.try_get("hr_feedback").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let hr_processed_by: Option<String> =
        row.try_get("hr_processed_by").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let hr_feedback_at: Option<String> =
        row.try_get("hr_feedback_at").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let dismissal_id: Option<String> =
        row.try_get("dismissal_id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let created_at: String =
        row.try_get("created_at").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let updated_at: String =
        row.try_get("updated_at").map_err(|e| RepositoryError::Decode(e.to_string()))?;

    // The payload column embeds the discriminant; the separate
    // request_type column exists for indexing only.
    let payload: RequestPayload = serde_json::from_str(&payload_json)
        .map_err(|e| RepositoryError::Decode(format!("payload for `{id}`: {e}")))?;
    let status = ApprovalStatus::parse(&status_str)
        .ok_or_else(|| RepositoryError::Decode(format!("unknown status `{status_str}`")))?;
    let requested_by_role = Role::parse(&requested_by_role).ok_or_else(|| {
        RepositoryError::Decode(format!("unknown requester role `{requested_by_role}`"))
    })?;
    let hr_action = match hr_action {
        Some(raw) => Some(
            HrAction::parse(&raw)
                .ok_or_else(|| RepositoryError::Decode(format!("unknown hr_action `{raw}`")))?,
        ),
        None => None,
    };

    Ok(ApprovalRequest {
        id: ApprovalRequestId(id),
        payload,
        status,
        requested_by: ActorId(requested_by),
        requested_by_role,
        processed_by: processed_by.map(ActorId),
        admin_response,
        processed_at: parse_optional_ts(processed_at),
        hr_action,
        hr_feedback,
        hr_processed_by: hr_processed_by.map(ActorId),
        hr_feedback_at: parse_optional_ts(hr_feedback_at),
        dismissal_id: dismissal_id.map(DismissalId),
        created_at: parse_required_ts(&created_at),
        updated_at: parse_required_ts(&updated_at),
    })
}

fn bind_request<'q>(
    query: sqlx::query::Query<'q, sqlx::Sqlite, sqlx::sqlite::SqliteArguments<'q>>,
    request: &'q ApprovalRequest,
    payload_json: &'q str,
) -> sqlx::query::Query<'q, sqlx::Sqlite, sqlx::sqlite::SqliteArguments<'q>> {
    query
        .bind(&request.id.0)
        .bind(request.payload.kind().as_str())
        .bind(payload_json)
        .bind(request.status.as_str())
        .bind(&request.requested_by.0)
        .bind(request.requested_by_role.as_str())
        .bind(request.processed_by.as_ref().map(|actor| actor.0.as_str()))
        .bind(request.admin_response.as_deref())
        .bind(request.processed_at.map(|dt| dt.to_rfc3339()))
        .bind(request.hr_action.map(|action| action.as_str()))
        .bind(request.hr_feedback.as_deref())
        .bind(request.hr_processed_by.as_ref().map(|actor| actor.0.as_str()))
        .bind(request.hr_feedback_at.map(|dt| dt.to_rfc3339()))
        .bind(request.dismissal_id.as_ref().map(|id| id.0.as_str()))
        .bind(request.created_at.to_rfc3339())
        .bind(request.updated_at.to_rfc3339())
}

#[async_trait::async_trait]
impl ApprovalRepository for SqlApprovalRepository {
    async fn find_by_id(
        &self,
        id: &ApprovalRequestId,
    ) -> Result<Option<ApprovalRequest>, RepositoryError> {
        let row = sqlx::query(&format!(
            "SELECT {SELECT_COLUMNS} FROM approval_request WHERE id = ?"
        ))
        .bind(&id.0)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(ref r) => Ok(Some(row_to_request(r)?)),
            None => Ok(None),
        }
    }

    async fn save(&self, request: ApprovalRequest) -> Result<(), RepositoryError> {
        let payload_json = serde_json::to_string(&request.payload)
            .map_err(|e| RepositoryError::Decode(e.to_string()))?;

        let query = sqlx::query(
            "INSERT INTO approval_request (id, request_type, payload, status, requested_by,
                                           requested_by_role, processed_by, admin_response,
                                           processed_at, hr_action, hr_feedback, hr_processed_by,
                                           hr_feedback_at, dismissal_id, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
                 request_type = excluded.request_type,
                 payload = excluded.payload,
                 status = excluded.status,
                 processed_by = excluded.processed_by,
                 admin_response = excluded.admin_response,
                 processed_at = excluded.processed_at,
                 hr_action = excluded.hr_action,
                 hr_feedback = excluded.hr_feedback,
                 hr_processed_by = excluded.hr_processed_by,
                 hr_feedback_at = excluded.hr_feedback_at,
                 dismissal_id = excluded.dismissal_id,
                 updated_at = excluded.updated_at",
        );
        bind_request(query, &request, &payload_json).execute(&self.pool).await?;

        Ok(())
    }

    async fn save_if_status(
        &self,
        request: ApprovalRequest,
        expected: ApprovalStatus,
    ) -> Result<bool, RepositoryError> {
        let payload_json = serde_json::to_string(&request.payload)
            .map_err(|e| RepositoryError::Decode(e.to_string()))?;

        // The status guard makes the write atomic under concurrent
        // reviewers; zero affected rows means someone else won.
        let result = sqlx::query(
            "UPDATE approval_request SET
                 status = ?,
                 processed_by = ?,
                 admin_response = ?,
                 processed_at = ?,
                 hr_action = ?,
                 hr_feedback = ?,
                 hr_processed_by = ?,
                 hr_feedback_at = ?,
                 dismissal_id = ?,
                 payload = ?,
                 updated_at = ?
             WHERE id = ? AND status = ?",
        )
        .bind(request.status.as_str())
        .bind(request.processed_by.as_ref().map(|actor| actor.0.as_str()))
        .bind(request.admin_response.as_deref())
        .bind(request.processed_at.map(|dt| dt.to_rfc3339()))
        .bind(request.hr_action.map(|action| action.as_str()))
        .bind(request.hr_feedback.as_deref())
        .bind(request.hr_processed_by.as_ref().map(|actor| actor.0.as_str()))
        .bind(request.hr_feedback_at.map(|dt| dt.to_rfc3339()))
        .bind(request.dismissal_id.as_ref().map(|id| id.0.as_str()))
        .bind(&payload_json)
        .bind(request.updated_at.to_rfc3339())
        .bind(&request.id.0)
        .bind(expected.as_str())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn list_by_status(
        &self,
        status: ApprovalStatus,
        limit: u32,
    ) -> Result<Vec<ApprovalRequest>, RepositoryError> {
        let rows: Vec<sqlx::sqlite::SqliteRow> = sqlx::query(&format!(
            "SELECT {SELECT_COLUMNS} FROM approval_request
             WHERE status = ? ORDER BY created_at ASC LIMIT ?"
        ))
        .bind(status.as_str())
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_request).collect::<Result<Vec<_>, _>>()
    }

    async fn find_by_dismissal_id(
        &self,
        dismissal_id: &DismissalId,
    ) -> Result<Option<ApprovalRequest>, RepositoryError> {
        let row = sqlx::query(&format!(
            "SELECT {SELECT_COLUMNS} FROM approval_request WHERE dismissal_id = ?"
        ))
        .bind(&dismissal_id.0)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(ref r) => Ok(Some(row_to_request(r)?)),
            None => Ok(None),
        }
    }

    async fn find_by_appointment_id(
        &self,
        appointment_id: &AppointmentId,
    ) -> Result<Option<ApprovalRequest>, RepositoryError> {
        // The appointment link lives inside the payload JSON.
        let row = sqlx::query(&format!(
            "SELECT {SELECT_COLUMNS} FROM approval_request
             WHERE request_type = 'appointment_approval'
               AND json_extract(payload, '$.appointment_id') = ?"
        ))
        .bind(&appointment_id.0)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(ref r) => Ok(Some(row_to_request(r)?)),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use stafflow_core::domain::actor::{ActorId, Role};
    use stafflow_core::domain::approval::{
        ApprovalRequest, ApprovalRequestId, ApprovalStatus, RequestPayload,
    };
    use stafflow_core::domain::dismissal::DismissalId;
    use stafflow_core::domain::employee::EmployeeId;

    use super::SqlApprovalRepository;
    use crate::repositories::ApprovalRepository;
    use crate::{connect_with_settings, migrations};

    async fn setup() -> sqlx::SqlitePool {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrations");
        pool
    }

    fn sample_request(id: &str) -> ApprovalRequest {
        let now = Utc::now();
        ApprovalRequest {
            id: ApprovalRequestId(id.to_string()),
            payload: RequestPayload::DeleteUser {
                user_id: EmployeeId("emp-1".to_string()),
                reason: "duplicate account".to_string(),
            },
            status: ApprovalStatus::Pending,
            requested_by: ActorId("hr-1".to_string()),
            requested_by_role: Role::Hr,
            processed_by: None,
            admin_response: None,
            processed_at: None,
            hr_action: None,
            hr_feedback: None,
            hr_processed_by: None,
            hr_feedback_at: None,
            dismissal_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn save_and_find_round_trips_typed_payload() {
        let pool = setup().await;
        let repo = SqlApprovalRepository::new(pool);

        repo.save(sample_request("apr-1")).await.expect("save");
        let found = repo
            .find_by_id(&ApprovalRequestId("apr-1".to_string()))
            .await
            .expect("find")
            .expect("should exist");

        assert_eq!(found.status, ApprovalStatus::Pending);
        assert!(matches!(found.payload, RequestPayload::DeleteUser { .. }));
        assert_eq!(found.requested_by_role, Role::Hr);
    }

    #[tokio::test]
    async fn save_if_status_applies_exactly_once() {
        let pool = setup().await;
        let repo = SqlApprovalRepository::new(pool);

        let request = sample_request("apr-1");
        repo.save(request.clone()).await.expect("save");

        let mut resolved = request.clone();
        resolved.status = ApprovalStatus::Approved;
        resolved.processed_by = Some(ActorId("admin-1".to_string()));
        resolved.admin_response = Some("ok".to_string());
        resolved.processed_at = Some(Utc::now());

        let first = repo
            .save_if_status(resolved.clone(), ApprovalStatus::Pending)
            .await
            .expect("first flip");
        assert!(first, "first conditional write should apply");

        let mut racing = request;
        racing.status = ApprovalStatus::Rejected;
        let second =
            repo.save_if_status(racing, ApprovalStatus::Pending).await.expect("second flip");
        assert!(!second, "second conditional write must lose the race");

        let found = repo
            .find_by_id(&ApprovalRequestId("apr-1".to_string()))
            .await
            .expect("find")
            .expect("should exist");
        assert_eq!(found.status, ApprovalStatus::Approved);
        assert_eq!(found.admin_response.as_deref(), Some("ok"));
    }

    #[tokio::test]
    async fn list_by_status_filters_and_orders() {
        let pool = setup().await;
        let repo = SqlApprovalRepository::new(pool);

        repo.save(sample_request("apr-1")).await.expect("save 1");
        repo.save(sample_request("apr-2")).await.expect("save 2");

        let mut resolved = sample_request("apr-3");
        resolved.status = ApprovalStatus::Approved;
        repo.save(resolved).await.expect("save 3");

        let pending = repo.list_by_status(ApprovalStatus::Pending, 100).await.expect("list");
        assert_eq!(pending.len(), 2);

        let approved = repo.list_by_status(ApprovalStatus::Approved, 100).await.expect("list");
        assert_eq!(approved.len(), 1);
        assert_eq!(approved[0].id.0, "apr-3");
    }

    #[tokio::test]
    async fn find_by_dismissal_id_resolves_the_bridge() {
        let pool = setup().await;
        let repo = SqlApprovalRepository::new(pool);

        let mut request = sample_request("apr-1");
        request.dismissal_id = Some(DismissalId("dis-7".to_string()));
        repo.save(request).await.expect("save");

        let found = repo
            .find_by_dismissal_id(&DismissalId("dis-7".to_string()))
            .await
            .expect("find")
            .expect("should exist");
        assert_eq!(found.id.0, "apr-1");

        let missing =
            repo.find_by_dismissal_id(&DismissalId("dis-8".to_string())).await.expect("find");
        assert!(missing.is_none());
    }
}
