use async_trait::async_trait;
use thiserror::Error;

use stafflow_core::domain::appointment::{Appointment, AppointmentId};
use stafflow_core::domain::approval::{ApprovalRequest, ApprovalRequestId, ApprovalStatus};
use stafflow_core::domain::contract::{Contract, ContractId};
use stafflow_core::domain::dismissal::{Dismissal, DismissalId};
use stafflow_core::domain::employee::{Employee, EmployeeId};
use stafflow_core::domain::resignation::{Resignation, ResignationId};
use stafflow_core::domain::salary::{SalaryId, SalaryRecord};

pub mod appointment;
pub mod approval;
pub mod dismissal;
pub mod employee;
pub mod memory;
pub mod personnel;

pub use appointment::SqlAppointmentRepository;
pub use approval::SqlApprovalRepository;
pub use dismissal::SqlDismissalRepository;
pub use employee::SqlEmployeeRepository;
pub use memory::{
    InMemoryAppointmentRepository, InMemoryApprovalRepository, InMemoryContractRepository,
    InMemoryDismissalRepository, InMemoryEmployeeRepository, InMemoryResignationRepository,
    InMemorySalaryRepository,
};
pub use personnel::{SqlContractRepository, SqlResignationRepository, SqlSalaryRepository};

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
}

#[async_trait]
pub trait ApprovalRepository: Send + Sync {
    async fn find_by_id(
        &self,
        id: &ApprovalRequestId,
    ) -> Result<Option<ApprovalRequest>, RepositoryError>;

    async fn save(&self, request: ApprovalRequest) -> Result<(), RepositoryError>;

    /// Persist `request` only while the stored row still carries
    /// `expected` as its status. Returns `false` when a concurrent
    /// writer moved the record first; the caller treats that as a
    /// conflict, not an error.
    async fn save_if_status(
        &self,
        request: ApprovalRequest,
        expected: ApprovalStatus,
    ) -> Result<bool, RepositoryError>;

    async fn list_by_status(
        &self,
        status: ApprovalStatus,
        limit: u32,
    ) -> Result<Vec<ApprovalRequest>, RepositoryError>;

    async fn find_by_dismissal_id(
        &self,
        dismissal_id: &DismissalId,
    ) -> Result<Option<ApprovalRequest>, RepositoryError>;

    async fn find_by_appointment_id(
        &self,
        appointment_id: &AppointmentId,
    ) -> Result<Option<ApprovalRequest>, RepositoryError>;
}

#[async_trait]
pub trait EmployeeRepository: Send + Sync {
    async fn find_by_id(&self, id: &EmployeeId) -> Result<Option<Employee>, RepositoryError>;
    async fn find_by_email(&self, email: &str) -> Result<Option<Employee>, RepositoryError>;
    async fn save(&self, employee: Employee) -> Result<(), RepositoryError>;
}

#[async_trait]
pub trait ContractRepository: Send + Sync {
    async fn find_by_id(&self, id: &ContractId) -> Result<Option<Contract>, RepositoryError>;
    async fn save(&self, contract: Contract) -> Result<(), RepositoryError>;
}

#[async_trait]
pub trait SalaryRepository: Send + Sync {
    async fn find_by_id(&self, id: &SalaryId) -> Result<Option<SalaryRecord>, RepositoryError>;
    async fn save(&self, record: SalaryRecord) -> Result<(), RepositoryError>;
}

#[async_trait]
pub trait ResignationRepository: Send + Sync {
    async fn find_by_id(&self, id: &ResignationId)
        -> Result<Option<Resignation>, RepositoryError>;
    async fn save(&self, resignation: Resignation) -> Result<(), RepositoryError>;
}

#[async_trait]
pub trait DismissalRepository: Send + Sync {
    async fn find_by_id(&self, id: &DismissalId) -> Result<Option<Dismissal>, RepositoryError>;

    async fn find_by_approval_id(
        &self,
        approval_id: &ApprovalRequestId,
    ) -> Result<Option<Dismissal>, RepositoryError>;

    async fn save(&self, dismissal: Dismissal) -> Result<(), RepositoryError>;
}

#[async_trait]
pub trait AppointmentRepository: Send + Sync {
    async fn find_by_id(&self, id: &AppointmentId)
        -> Result<Option<Appointment>, RepositoryError>;
    async fn save(&self, appointment: Appointment) -> Result<(), RepositoryError>;
}
