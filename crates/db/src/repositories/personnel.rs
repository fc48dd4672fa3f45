//! Contract, salary, and resignation stores. These records change only
//! as the side effect of an approved request, so the repositories stay
//! plain find/save pairs.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::Row;

use stafflow_core::domain::contract::{Contract, ContractId};
use stafflow_core::domain::employee::EmployeeId;
use stafflow_core::domain::resignation::{Resignation, ResignationId, ResignationStatus};
use stafflow_core::domain::salary::{SalaryId, SalaryRecord};

use super::{ContractRepository, RepositoryError, ResignationRepository, SalaryRepository};
use crate::DbPool;

fn parse_required_ts(value: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

fn parse_amount(field: &str, value: &str) -> Result<Decimal, RepositoryError> {
    Decimal::from_str(value)
        .map_err(|e| RepositoryError::Decode(format!("{field} `{value}`: {e}")))
}

pub struct SqlContractRepository {
    pool: DbPool,
}

impl SqlContractRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn row_to_contract(row: &sqlx::sqlite::SqliteRow) -> Result<Contract, RepositoryError> {
    let id: String = row.try_get("id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let employee_id: String =
        row.try_get("employee_id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let position: String =
        row.try_get("position").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let salary: String =
        row.try_get("salary").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let start_date: String =
        row.try_get("start_date").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let end_date: Option<String> =
        row.try_get("end_date").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let created_at: String =
        row.try_get("created_at").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let updated_at: String =
        row.try_get("updated_at").map_err(|e| RepositoryError::Decode(e.to_string()))?;

    Ok(Contract {
        id: ContractId(id),
        employee_id: EmployeeId(employee_id),
        position,
        salary: parse_amount("salary", &salary)?,
        start_date: parse_required_ts(&start_date),
        end_date: end_date
            .and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
            .map(|dt| dt.with_timezone(&Utc)),
        created_at: parse_required_ts(&created_at),
        updated_at: parse_required_ts(&updated_at),
    })
}

#[async_trait::async_trait]
impl ContractRepository for SqlContractRepository {
    async fn find_by_id(&self, id: &ContractId) -> Result<Option<Contract>, RepositoryError> {
        let row = sqlx::query(
            "SELECT id, employee_id, position, salary, start_date, end_date,
                    created_at, updated_at
             FROM contract WHERE id = ?",
        )
        .bind(&id.0)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(ref r) => Ok(Some(row_to_contract(r)?)),
            None => Ok(None),
        }
    }

    async fn save(&self, contract: Contract) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO contract (id, employee_id, position, salary, start_date, end_date,
                                   created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
                 position = excluded.position,
                 salary = excluded.salary,
                 start_date = excluded.start_date,
                 end_date = excluded.end_date,
                 updated_at = excluded.updated_at",
        )
        .bind(&contract.id.0)
        .bind(&contract.employee_id.0)
        .bind(&contract.position)
        .bind(contract.salary.to_string())
        .bind(contract.start_date.to_rfc3339())
        .bind(contract.end_date.map(|dt| dt.to_rfc3339()))
        .bind(contract.created_at.to_rfc3339())
        .bind(contract.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

pub struct SqlSalaryRepository {
    pool: DbPool,
}

impl SqlSalaryRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn row_to_salary(row: &sqlx::sqlite::SqliteRow) -> Result<SalaryRecord, RepositoryError> {
    let id: String = row.try_get("id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let employee_id: String =
        row.try_get("employee_id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let amount: String =
        row.try_get("amount").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let effective_from: String =
        row.try_get("effective_from").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let created_at: String =
        row.try_get("created_at").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let updated_at: String =
        row.try_get("updated_at").map_err(|e| RepositoryError::Decode(e.to_string()))?;

    Ok(SalaryRecord {
        id: SalaryId(id),
        employee_id: EmployeeId(employee_id),
        amount: parse_amount("amount", &amount)?,
        effective_from: parse_required_ts(&effective_from),
        created_at: parse_required_ts(&created_at),
        updated_at: parse_required_ts(&updated_at),
    })
}

#[async_trait::async_trait]
impl SalaryRepository for SqlSalaryRepository {
    async fn find_by_id(&self, id: &SalaryId) -> Result<Option<SalaryRecord>, RepositoryError> {
        let row = sqlx::query(
            "SELECT id, employee_id, amount, effective_from, created_at, updated_at
             FROM salary WHERE id = ?",
        )
        .bind(&id.0)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(ref r) => Ok(Some(row_to_salary(r)?)),
            None => Ok(None),
        }
    }

    async fn save(&self, record: SalaryRecord) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO salary (id, employee_id, amount, effective_from, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
                 amount = excluded.amount,
                 effective_from = excluded.effective_from,
                 updated_at = excluded.updated_at",
        )
        .bind(&record.id.0)
        .bind(&record.employee_id.0)
        .bind(record.amount.to_string())
        .bind(record.effective_from.to_rfc3339())
        .bind(record.created_at.to_rfc3339())
        .bind(record.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

pub struct SqlResignationRepository {
    pool: DbPool,
}

impl SqlResignationRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn row_to_resignation(row: &sqlx::sqlite::SqliteRow) -> Result<Resignation, RepositoryError> {
    let id: String = row.try_get("id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let employee_id: String =
        row.try_get("employee_id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let reason: String =
        row.try_get("reason").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let status_str: String =
        row.try_get("status").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let created_at: String =
        row.try_get("created_at").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let updated_at: String =
        row.try_get("updated_at").map_err(|e| RepositoryError::Decode(e.to_string()))?;

    let status = ResignationStatus::parse(&status_str)
        .ok_or_else(|| RepositoryError::Decode(format!("unknown status `{status_str}`")))?;

    Ok(Resignation {
        id: ResignationId(id),
        employee_id: EmployeeId(employee_id),
        reason,
        status,
        created_at: parse_required_ts(&created_at),
        updated_at: parse_required_ts(&updated_at),
    })
}

#[async_trait::async_trait]
impl ResignationRepository for SqlResignationRepository {
    async fn find_by_id(
        &self,
        id: &ResignationId,
    ) -> Result<Option<Resignation>, RepositoryError> {
        let row = sqlx::query(
            "SELECT id, employee_id, reason, status, created_at, updated_at
             FROM resignation WHERE id = ?",
        )
        .bind(&id.0)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(ref r) => Ok(Some(row_to_resignation(r)?)),
            None => Ok(None),
        }
    }

    async fn save(&self, resignation: Resignation) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO resignation (id, employee_id, reason, status, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
                 reason = excluded.reason,
                 status = excluded.status,
                 updated_at = excluded.updated_at",
        )
        .bind(&resignation.id.0)
        .bind(&resignation.employee_id.0)
        .bind(&resignation.reason)
        .bind(resignation.status.as_str())
        .bind(resignation.created_at.to_rfc3339())
        .bind(resignation.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
