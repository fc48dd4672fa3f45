use chrono::{DateTime, Utc};
use sqlx::Row;

use stafflow_core::domain::employee::{Employee, EmployeeId, EmployeeStatus};

use super::{EmployeeRepository, RepositoryError};
use crate::DbPool;

pub struct SqlEmployeeRepository {
    pool: DbPool,
}

impl SqlEmployeeRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn row_to_employee(row: &sqlx::sqlite::SqliteRow) -> Result<Employee, RepositoryError> {
    let id: String = row.try_get("id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let email: String =
        row.try_get("email").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let full_name: String =
        row.try_get("full_name").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let position: String =
        row.try_get("position").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let department: String =
        row.try_get("department").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let status_str: String =
        row.try_get("status").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let created_at: String =
        row.try_get("created_at").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let updated_at: String =
        row.try_get("updated_at").map_err(|e| RepositoryError::Decode(e.to_string()))?;

    let status = EmployeeStatus::parse(&status_str)
        .ok_or_else(|| RepositoryError::Decode(format!("unknown status `{status_str}`")))?;

    Ok(Employee {
        id: EmployeeId(id),
        email,
        full_name,
        position,
        department,
        status,
        created_at: DateTime::parse_from_rfc3339(&created_at)
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now()),
        updated_at: DateTime::parse_from_rfc3339(&updated_at)
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now()),
    })
}

#[async_trait::async_trait]
impl EmployeeRepository for SqlEmployeeRepository {
    async fn find_by_id(&self, id: &EmployeeId) -> Result<Option<Employee>, RepositoryError> {
        let row = sqlx::query(
            "SELECT id, email, full_name, position, department, status, created_at, updated_at
             FROM employee WHERE id = ?",
        )
        .bind(&id.0)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(ref r) => Ok(Some(row_to_employee(r)?)),
            None => Ok(None),
        }
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Employee>, RepositoryError> {
        let row = sqlx::query(
            "SELECT id, email, full_name, position, department, status, created_at, updated_at
             FROM employee WHERE email = ?",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(ref r) => Ok(Some(row_to_employee(r)?)),
            None => Ok(None),
        }
    }

    async fn save(&self, employee: Employee) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO employee (id, email, full_name, position, department, status,
                                   created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
                 email = excluded.email,
                 full_name = excluded.full_name,
                 position = excluded.position,
                 department = excluded.department,
                 status = excluded.status,
                 updated_at = excluded.updated_at",
        )
        .bind(&employee.id.0)
        .bind(&employee.email)
        .bind(&employee.full_name)
        .bind(&employee.position)
        .bind(&employee.department)
        .bind(employee.status.as_str())
        .bind(employee.created_at.to_rfc3339())
        .bind(employee.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use stafflow_core::domain::employee::{Employee, EmployeeId, EmployeeStatus};

    use super::SqlEmployeeRepository;
    use crate::repositories::EmployeeRepository;
    use crate::{connect_with_settings, migrations};

    async fn setup() -> sqlx::SqlitePool {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrations");
        pool
    }

    fn sample_employee(id: &str, email: &str) -> Employee {
        let now = Utc::now();
        Employee {
            id: EmployeeId(id.to_string()),
            email: email.to_string(),
            full_name: "Jane Doe".to_string(),
            position: "engineer".to_string(),
            department: "platform".to_string(),
            status: EmployeeStatus::Active,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn save_and_find_by_id_and_email() {
        let pool = setup().await;
        let repo = SqlEmployeeRepository::new(pool);

        repo.save(sample_employee("emp-1", "jane@corp.example")).await.expect("save");

        let by_id = repo
            .find_by_id(&EmployeeId("emp-1".to_string()))
            .await
            .expect("find")
            .expect("should exist");
        assert_eq!(by_id.email, "jane@corp.example");

        let by_email = repo
            .find_by_email("jane@corp.example")
            .await
            .expect("find")
            .expect("should exist");
        assert_eq!(by_email.id.0, "emp-1");
    }

    #[tokio::test]
    async fn save_upserts_status_changes() {
        let pool = setup().await;
        let repo = SqlEmployeeRepository::new(pool);

        let mut employee = sample_employee("emp-1", "jane@corp.example");
        repo.save(employee.clone()).await.expect("save");

        employee.status = EmployeeStatus::Dismissed;
        repo.save(employee).await.expect("upsert");

        let found = repo
            .find_by_id(&EmployeeId("emp-1".to_string()))
            .await
            .expect("find")
            .expect("should exist");
        assert_eq!(found.status, EmployeeStatus::Dismissed);
    }
}
