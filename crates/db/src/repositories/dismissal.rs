use chrono::{DateTime, Utc};
use sqlx::Row;

use stafflow_core::domain::actor::ActorId;
use stafflow_core::domain::approval::ApprovalRequestId;
use stafflow_core::domain::dismissal::{Dismissal, DismissalId, DismissalStatus};
use stafflow_core::domain::employee::EmployeeId;

use super::{DismissalRepository, RepositoryError};
use crate::DbPool;

pub struct SqlDismissalRepository {
    pool: DbPool,
}

impl SqlDismissalRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

const SELECT_COLUMNS: &str = "id, user_id, old_position, new_position, reason, effective_date,
            created_by, status, admin_response, approval_id, processed_by, processed_at,
            created_at, updated_at";

fn row_to_dismissal(row: &sqlx::sqlite::SqliteRow) -> Result<Dismissal, RepositoryError> {
    let id: String = row.try_get("id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let user_id: String =
        row.try_get("user_id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let old_position: String =
        row.try_get("old_position").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let new_position: String =
        row.try_get("new_position").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let reason: String =
        row.try_get("reason").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let effective_date: String =
        row.try_get("effective_date").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let created_by: String =
        row.try_get("created_by").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let status_str: String =
        row.try_get("status").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let admin_response: Option<String> =
        row.try_get("admin_response").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let approval_id: Option<String> =
        row.try_get("approval_id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let processed_by: Option<String> =
        row.try_get("processed_by").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let processed_at: Option<String> =
        row.try_get("processed_at").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let created_at: String =
        row.try_get("created_at").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let updated_at: String =
        row.try_get("updated_at").map_err(|e| RepositoryError::Decode(e.to_string()))?;

    let status = DismissalStatus::parse(&status_str)
        .ok_or_else(|| RepositoryError::Decode(format!("unknown status `{status_str}`")))?;
    let effective_date = DateTime::parse_from_rfc3339(&effective_date)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| RepositoryError::Decode(format!("effective_date for `{id}`: {e}")))?;

    Ok(Dismissal {
        id: DismissalId(id),
        user_id: EmployeeId(user_id),
        old_position,
        new_position,
        reason,
        effective_date,
        created_by: ActorId(created_by),
        status,
        admin_response,
        approval_id: approval_id.map(ApprovalRequestId),
        processed_by: processed_by.map(ActorId),
        processed_at: processed_at
            .and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
            .map(|dt| dt.with_timezone(&Utc)),
        created_at: DateTime::parse_from_rfc3339(&created_at)
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now()),
        updated_at: DateTime::parse_from_rfc3339(&updated_at)
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now()),
    })
}

#[async_trait::async_trait]
impl DismissalRepository for SqlDismissalRepository {
    async fn find_by_id(&self, id: &DismissalId) -> Result<Option<Dismissal>, RepositoryError> {
        let row =
            sqlx::query(&format!("SELECT {SELECT_COLUMNS} FROM dismissal WHERE id = ?"))
                .bind(&id.0)
                .fetch_optional(&self.pool)
                .await?;

        match row {
            Some(ref r) => Ok(Some(row_to_dismissal(r)?)),
            None => Ok(None),
        }
    }

    async fn find_by_approval_id(
        &self,
        approval_id: &ApprovalRequestId,
    ) -> Result<Option<Dismissal>, RepositoryError> {
        let row = sqlx::query(&format!(
            "SELECT {SELECT_COLUMNS} FROM dismissal WHERE approval_id = ?"
        ))
        .bind(&approval_id.0)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(ref r) => Ok(Some(row_to_dismissal(r)?)),
            None => Ok(None),
        }
    }

    async fn save(&self, dismissal: Dismissal) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO dismissal (id, user_id, old_position, new_position, reason,
                                    effective_date, created_by, status, admin_response,
                                    approval_id, processed_by, processed_at, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
                 old_position = excluded.old_position,
                 new_position = excluded.new_position,
                 reason = excluded.reason,
                 effective_date = excluded.effective_date,
                 status = excluded.status,
                 admin_response = excluded.admin_response,
                 approval_id = excluded.approval_id,
                 processed_by = excluded.processed_by,
                 processed_at = excluded.processed_at,
                 updated_at = excluded.updated_at",
        )
        .bind(&dismissal.id.0)
        .bind(&dismissal.user_id.0)
        .bind(&dismissal.old_position)
        .bind(&dismissal.new_position)
        .bind(&dismissal.reason)
        .bind(dismissal.effective_date.to_rfc3339())
        .bind(&dismissal.created_by.0)
        .bind(dismissal.status.as_str())
        .bind(dismissal.admin_response.as_deref())
        .bind(dismissal.approval_id.as_ref().map(|id| id.0.as_str()))
        .bind(dismissal.processed_by.as_ref().map(|actor| actor.0.as_str()))
        .bind(dismissal.processed_at.map(|dt| dt.to_rfc3339()))
        .bind(dismissal.created_at.to_rfc3339())
        .bind(dismissal.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use stafflow_core::domain::actor::ActorId;
    use stafflow_core::domain::approval::ApprovalRequestId;
    use stafflow_core::domain::dismissal::{Dismissal, DismissalId, DismissalStatus};
    use stafflow_core::domain::employee::EmployeeId;

    use super::SqlDismissalRepository;
    use crate::repositories::DismissalRepository;
    use crate::{connect_with_settings, migrations};

    async fn setup() -> sqlx::SqlitePool {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrations");
        pool
    }

    fn sample_dismissal(id: &str) -> Dismissal {
        let now = Utc::now();
        Dismissal {
            id: DismissalId(id.to_string()),
            user_id: EmployeeId("emp-1".to_string()),
            old_position: "engineer".to_string(),
            new_position: "none".to_string(),
            reason: "restructuring".to_string(),
            effective_date: now + chrono::Duration::days(14),
            created_by: ActorId("hr-1".to_string()),
            status: DismissalStatus::Pending,
            admin_response: None,
            approval_id: None,
            processed_by: None,
            processed_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn save_and_find_by_id() {
        let pool = setup().await;
        let repo = SqlDismissalRepository::new(pool);

        repo.save(sample_dismissal("dis-1")).await.expect("save");
        let found = repo
            .find_by_id(&DismissalId("dis-1".to_string()))
            .await
            .expect("find")
            .expect("should exist");

        assert_eq!(found.status, DismissalStatus::Pending);
        assert_eq!(found.user_id.0, "emp-1");
    }

    #[tokio::test]
    async fn find_by_approval_id_resolves_the_link() {
        let pool = setup().await;
        let repo = SqlDismissalRepository::new(pool);

        let mut dismissal = sample_dismissal("dis-1");
        dismissal.approval_id = Some(ApprovalRequestId("apr-3".to_string()));
        repo.save(dismissal).await.expect("save");

        let found = repo
            .find_by_approval_id(&ApprovalRequestId("apr-3".to_string()))
            .await
            .expect("find")
            .expect("should exist");
        assert_eq!(found.id.0, "dis-1");
    }

    #[tokio::test]
    async fn save_upserts_resolution_fields() {
        let pool = setup().await;
        let repo = SqlDismissalRepository::new(pool);

        let mut dismissal = sample_dismissal("dis-1");
        repo.save(dismissal.clone()).await.expect("save");

        dismissal.resolve(
            DismissalStatus::Approved,
            ActorId("admin-1".to_string()),
            "approved after review",
            Utc::now(),
        );
        repo.save(dismissal).await.expect("upsert");

        let found = repo
            .find_by_id(&DismissalId("dis-1".to_string()))
            .await
            .expect("find")
            .expect("should exist");
        assert_eq!(found.status, DismissalStatus::Approved);
        assert_eq!(found.processed_by, Some(ActorId("admin-1".to_string())));
        assert!(found.processed_at.is_some());
    }
}
