use sqlx::{Executor, Row};

use crate::connection::DbPool;
use crate::repositories::RepositoryError;

const SEED_EMPLOYEE_IDS: &[&str] = &["emp-seed-001", "emp-seed-002"];

const SEED_APPROVAL_IDS: &[&str] = &["apr-seed-001", "apr-seed-002", "apr-seed-003"];

/// Deterministic seed dataset covering the three workflow shapes:
/// a plain pending hire, a bridged dismissal, and an HR-raised
/// appointment escalation.
pub struct SeedDataset;

#[derive(Debug)]
pub struct SeedResult {
    pub employees: usize,
    pub approvals: usize,
}

#[derive(Debug)]
pub struct SeedCheck {
    pub name: &'static str,
    pub passed: bool,
    pub detail: String,
}

#[derive(Debug)]
pub struct SeedVerification {
    pub checks: Vec<SeedCheck>,
}

impl SeedVerification {
    pub fn passed(&self) -> bool {
        self.checks.iter().all(|check| check.passed)
    }
}

impl SeedDataset {
    pub const SQL: &str = include_str!("../../../config/fixtures/seed_data.sql");

    pub async fn load(pool: &DbPool) -> Result<SeedResult, RepositoryError> {
        let mut tx = pool.begin().await?;
        tx.execute(sqlx::query(Self::SQL)).await?;
        tx.commit().await?;

        Ok(SeedResult {
            employees: SEED_EMPLOYEE_IDS.len(),
            approvals: SEED_APPROVAL_IDS.len(),
        })
    }

    /// Check that the seed rows are present and internally consistent.
    pub async fn verify(pool: &DbPool) -> Result<SeedVerification, RepositoryError> {
        let mut checks = Vec::new();

        let employee_count: i64 = sqlx::query(
            "SELECT COUNT(*) AS count FROM employee WHERE id IN ('emp-seed-001', 'emp-seed-002')",
        )
        .fetch_one(pool)
        .await?
        .get("count");
        checks.push(SeedCheck {
            name: "seed_employees_present",
            passed: employee_count == SEED_EMPLOYEE_IDS.len() as i64,
            detail: format!("expected {} employees, found {employee_count}", SEED_EMPLOYEE_IDS.len()),
        });

        let pending_approvals: i64 = sqlx::query(
            "SELECT COUNT(*) AS count FROM approval_request
             WHERE id IN ('apr-seed-001', 'apr-seed-002', 'apr-seed-003') AND status = 'pending'",
        )
        .fetch_one(pool)
        .await?
        .get("count");
        checks.push(SeedCheck {
            name: "seed_approvals_pending",
            passed: pending_approvals == SEED_APPROVAL_IDS.len() as i64,
            detail: format!(
                "expected {} pending approvals, found {pending_approvals}",
                SEED_APPROVAL_IDS.len()
            ),
        });

        // Both ends of the dismissal bridge must point at each other.
        let bridge_links: i64 = sqlx::query(
            "SELECT COUNT(*) AS count
             FROM approval_request a
             JOIN dismissal d ON a.dismissal_id = d.id AND d.approval_id = a.id
             WHERE a.id = 'apr-seed-002'",
        )
        .fetch_one(pool)
        .await?
        .get("count");
        checks.push(SeedCheck {
            name: "dismissal_bridge_consistent",
            passed: bridge_links == 1,
            detail: format!("expected 1 linked dismissal pair, found {bridge_links}"),
        });

        let appointment_pending: i64 = sqlx::query(
            "SELECT COUNT(*) AS count FROM appointment
             WHERE id = 'apt-seed-001' AND status = 'pending'",
        )
        .fetch_one(pool)
        .await?
        .get("count");
        checks.push(SeedCheck {
            name: "seed_appointment_pending",
            passed: appointment_pending == 1,
            detail: format!("expected 1 pending appointment, found {appointment_pending}"),
        });

        Ok(SeedVerification { checks })
    }
}
