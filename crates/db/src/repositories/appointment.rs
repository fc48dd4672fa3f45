use chrono::{DateTime, Utc};
use sqlx::Row;

use stafflow_core::domain::actor::ActorId;
use stafflow_core::domain::appointment::{Appointment, AppointmentId, AppointmentStatus, HrAction};
use stafflow_core::domain::employee::EmployeeId;

use super::{AppointmentRepository, RepositoryError};
use crate::DbPool;

pub struct SqlAppointmentRepository {
    pool: DbPool,
}

impl SqlAppointmentRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn parse_optional_ts(value: Option<String>) -> Option<DateTime<Utc>> {
    value.and_then(|s| DateTime::parse_from_rfc3339(&s).ok()).map(|dt| dt.with_timezone(&Utc))
}

fn row_to_appointment(row: &sqlx::sqlite::SqliteRow) -> Result<Appointment, RepositoryError> {
    let id: String = row.try_get("id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let user_id: String =
        row.try_get("user_id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let old_position: String =
        row.try_get("old_position").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let new_position: String =
        row.try_get("new_position").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let reason: String =
        row.try_get("reason").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let status_str: String =
        row.try_get("status").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let hr_feedback: Option<String> =
        row.try_get("hr_feedback").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let hr_feedback_at: Option<String> =
        row.try_get("hr_feedback_at").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let hr_action: Option<String> =
        row.try_get("hr_action").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let hr_processed_by: Option<String> =
        row.try_get("hr_processed_by").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let approved_at: Option<String> =
        row.try_get("approved_at").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let rejected_at: Option<String> =
        row.try_get("rejected_at").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let created_at: String =
        row.try_get("created_at").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let updated_at: String =
        row.try_get("updated_at").map_err(|e| RepositoryError::Decode(e.to_string()))?;

    let status = AppointmentStatus::parse(&status_str)
        .ok_or_else(|| RepositoryError::Decode(format!("unknown status `{status_str}`")))?;
    let hr_action = match hr_action {
        Some(raw) => Some(
            HrAction::parse(&raw)
                .ok_or_else(|| RepositoryError::Decode(format!("unknown hr_action `{raw}`")))?,
        ),
        None => None,
    };

    Ok(Appointment {
        id: AppointmentId(id),
        user_id: EmployeeId(user_id),
        old_position,
        new_position,
        reason,
        status,
        hr_feedback,
        hr_feedback_at: parse_optional_ts(hr_feedback_at),
        hr_action,
        hr_processed_by: hr_processed_by.map(ActorId),
        approved_at: parse_optional_ts(approved_at),
        rejected_at: parse_optional_ts(rejected_at),
        created_at: DateTime::parse_from_rfc3339(&created_at)
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now()),
        updated_at: DateTime::parse_from_rfc3339(&updated_at)
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now()),
    })
}

#[async_trait::async_trait]
impl AppointmentRepository for SqlAppointmentRepository {
    async fn find_by_id(
        &self,
        id: &AppointmentId,
    ) -> Result<Option<Appointment>, RepositoryError> {
        let row = sqlx::query(
            "SELECT id, user_id, old_position, new_position, reason, status, hr_feedback,
                    hr_feedback_at, hr_action, hr_processed_by, approved_at, rejected_at,
                    created_at, updated_at
             FROM appointment WHERE id = ?",
        )
        .bind(&id.0)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(ref r) => Ok(Some(row_to_appointment(r)?)),
            None => Ok(None),
        }
    }

    async fn save(&self, appointment: Appointment) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO appointment (id, user_id, old_position, new_position, reason, status,
                                      hr_feedback, hr_feedback_at, hr_action, hr_processed_by,
                                      approved_at, rejected_at, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
                 old_position = excluded.old_position,
                 new_position = excluded.new_position,
                 reason = excluded.reason,
                 status = excluded.status,
                 hr_feedback = excluded.hr_feedback,
                 hr_feedback_at = excluded.hr_feedback_at,
                 hr_action = excluded.hr_action,
                 hr_processed_by = excluded.hr_processed_by,
                 approved_at = excluded.approved_at,
                 rejected_at = excluded.rejected_at,
                 updated_at = excluded.updated_at",
        )
        .bind(&appointment.id.0)
        .bind(&appointment.user_id.0)
        .bind(&appointment.old_position)
        .bind(&appointment.new_position)
        .bind(&appointment.reason)
        .bind(appointment.status.as_str())
        .bind(appointment.hr_feedback.as_deref())
        .bind(appointment.hr_feedback_at.map(|dt| dt.to_rfc3339()))
        .bind(appointment.hr_action.map(|action| action.as_str()))
        .bind(appointment.hr_processed_by.as_ref().map(|actor| actor.0.as_str()))
        .bind(appointment.approved_at.map(|dt| dt.to_rfc3339()))
        .bind(appointment.rejected_at.map(|dt| dt.to_rfc3339()))
        .bind(appointment.created_at.to_rfc3339())
        .bind(appointment.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use stafflow_core::domain::actor::ActorId;
    use stafflow_core::domain::appointment::{
        Appointment, AppointmentId, AppointmentStatus, HrAction,
    };
    use stafflow_core::domain::employee::EmployeeId;

    use super::SqlAppointmentRepository;
    use crate::repositories::AppointmentRepository;
    use crate::{connect_with_settings, migrations};

    async fn setup() -> sqlx::SqlitePool {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrations");
        pool
    }

    fn sample_appointment(id: &str) -> Appointment {
        let now = Utc::now();
        Appointment {
            id: AppointmentId(id.to_string()),
            user_id: EmployeeId("emp-1".to_string()),
            old_position: "engineer".to_string(),
            new_position: "lead engineer".to_string(),
            reason: "team expansion".to_string(),
            status: AppointmentStatus::Pending,
            hr_feedback: None,
            hr_feedback_at: None,
            hr_action: None,
            hr_processed_by: None,
            approved_at: None,
            rejected_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn save_and_find_by_id() {
        let pool = setup().await;
        let repo = SqlAppointmentRepository::new(pool);

        repo.save(sample_appointment("apt-1")).await.expect("save");
        let found = repo
            .find_by_id(&AppointmentId("apt-1".to_string()))
            .await
            .expect("find")
            .expect("should exist");

        assert_eq!(found.status, AppointmentStatus::Pending);
        assert_eq!(found.new_position, "lead engineer");
    }

    #[tokio::test]
    async fn save_upserts_hr_review_fields() {
        let pool = setup().await;
        let repo = SqlAppointmentRepository::new(pool);

        let mut appointment = sample_appointment("apt-1");
        repo.save(appointment.clone()).await.expect("save");

        appointment.status = AppointmentStatus::WaitingAdmin;
        appointment.hr_action = Some(HrAction::Approve);
        appointment.hr_feedback = Some("solid track record".to_string());
        appointment.hr_feedback_at = Some(Utc::now());
        appointment.hr_processed_by = Some(ActorId("hr-1".to_string()));
        repo.save(appointment).await.expect("upsert");

        let found = repo
            .find_by_id(&AppointmentId("apt-1".to_string()))
            .await
            .expect("find")
            .expect("should exist");
        assert_eq!(found.status, AppointmentStatus::WaitingAdmin);
        assert_eq!(found.hr_action, Some(HrAction::Approve));
        assert_eq!(found.hr_feedback.as_deref(), Some("solid track record"));
    }
}
