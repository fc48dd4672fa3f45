use std::collections::HashMap;

use tokio::sync::RwLock;

use stafflow_core::domain::appointment::{Appointment, AppointmentId};
use stafflow_core::domain::approval::{
    ApprovalRequest, ApprovalRequestId, ApprovalStatus, RequestPayload,
};
use stafflow_core::domain::contract::{Contract, ContractId};
use stafflow_core::domain::dismissal::{Dismissal, DismissalId};
use stafflow_core::domain::employee::{Employee, EmployeeId};
use stafflow_core::domain::resignation::{Resignation, ResignationId};
use stafflow_core::domain::salary::{SalaryId, SalaryRecord};

use super::{
    AppointmentRepository, ApprovalRepository, ContractRepository, DismissalRepository,
    EmployeeRepository, RepositoryError, ResignationRepository, SalaryRepository,
};

#[derive(Default)]
pub struct InMemoryApprovalRepository {
    requests: RwLock<HashMap<String, ApprovalRequest>>,
}

#[async_trait::async_trait]
impl ApprovalRepository for InMemoryApprovalRepository {
    async fn find_by_id(
        &self,
        id: &ApprovalRequestId,
    ) -> Result<Option<ApprovalRequest>, RepositoryError> {
        let requests = self.requests.read().await;
        Ok(requests.get(&id.0).cloned())
    }

    async fn save(&self, request: ApprovalRequest) -> Result<(), RepositoryError> {
        let mut requests = self.requests.write().await;
        requests.insert(request.id.0.clone(), request);
        Ok(())
    }

    async fn save_if_status(
        &self,
        request: ApprovalRequest,
        expected: ApprovalStatus,
    ) -> Result<bool, RepositoryError> {
        // Same compare-and-swap contract as the SQL store: the write
        // lock makes the status check and insert one atomic step.
        let mut requests = self.requests.write().await;
        match requests.get(&request.id.0) {
            Some(stored) if stored.status == expected => {
                requests.insert(request.id.0.clone(), request);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn list_by_status(
        &self,
        status: ApprovalStatus,
        limit: u32,
    ) -> Result<Vec<ApprovalRequest>, RepositoryError> {
        let requests = self.requests.read().await;
        let mut matching: Vec<ApprovalRequest> =
            requests.values().filter(|request| request.status == status).cloned().collect();
        matching.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        matching.truncate(limit as usize);
        Ok(matching)
    }

    async fn find_by_dismissal_id(
        &self,
        dismissal_id: &DismissalId,
    ) -> Result<Option<ApprovalRequest>, RepositoryError> {
        let requests = self.requests.read().await;
        Ok(requests
            .values()
            .find(|request| request.dismissal_id.as_ref() == Some(dismissal_id))
            .cloned())
    }

    async fn find_by_appointment_id(
        &self,
        appointment_id: &AppointmentId,
    ) -> Result<Option<ApprovalRequest>, RepositoryError> {
        let requests = self.requests.read().await;
        Ok(requests
            .values()
            .find(|request| {
                matches!(
                    &request.payload,
                    RequestPayload::AppointmentApproval { appointment_id: linked, .. }
                        if linked == appointment_id
                )
            })
            .cloned())
    }
}

#[derive(Default)]
pub struct InMemoryEmployeeRepository {
    employees: RwLock<HashMap<String, Employee>>,
}

#[async_trait::async_trait]
impl EmployeeRepository for InMemoryEmployeeRepository {
    async fn find_by_id(&self, id: &EmployeeId) -> Result<Option<Employee>, RepositoryError> {
        let employees = self.employees.read().await;
        Ok(employees.get(&id.0).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Employee>, RepositoryError> {
        let employees = self.employees.read().await;
        Ok(employees.values().find(|employee| employee.email == email).cloned())
    }

    async fn save(&self, employee: Employee) -> Result<(), RepositoryError> {
        let mut employees = self.employees.write().await;
        employees.insert(employee.id.0.clone(), employee);
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryContractRepository {
    contracts: RwLock<HashMap<String, Contract>>,
}

#[async_trait::async_trait]
impl ContractRepository for InMemoryContractRepository {
    async fn find_by_id(&self, id: &ContractId) -> Result<Option<Contract>, RepositoryError> {
        let contracts = self.contracts.read().await;
        Ok(contracts.get(&id.0).cloned())
    }

    async fn save(&self, contract: Contract) -> Result<(), RepositoryError> {
        let mut contracts = self.contracts.write().await;
        contracts.insert(contract.id.0.clone(), contract);
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemorySalaryRepository {
    records: RwLock<HashMap<String, SalaryRecord>>,
}

#[async_trait::async_trait]
impl SalaryRepository for InMemorySalaryRepository {
    async fn find_by_id(&self, id: &SalaryId) -> Result<Option<SalaryRecord>, RepositoryError> {
        let records = self.records.read().await;
        Ok(records.get(&id.0).cloned())
    }

    async fn save(&self, record: SalaryRecord) -> Result<(), RepositoryError> {
        let mut records = self.records.write().await;
        records.insert(record.id.0.clone(), record);
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryResignationRepository {
    resignations: RwLock<HashMap<String, Resignation>>,
}

#[async_trait::async_trait]
impl ResignationRepository for InMemoryResignationRepository {
    async fn find_by_id(
        &self,
        id: &ResignationId,
    ) -> Result<Option<Resignation>, RepositoryError> {
        let resignations = self.resignations.read().await;
        Ok(resignations.get(&id.0).cloned())
    }

    async fn save(&self, resignation: Resignation) -> Result<(), RepositoryError> {
        let mut resignations = self.resignations.write().await;
        resignations.insert(resignation.id.0.clone(), resignation);
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryDismissalRepository {
    dismissals: RwLock<HashMap<String, Dismissal>>,
}

#[async_trait::async_trait]
impl DismissalRepository for InMemoryDismissalRepository {
    async fn find_by_id(&self, id: &DismissalId) -> Result<Option<Dismissal>, RepositoryError> {
        let dismissals = self.dismissals.read().await;
        Ok(dismissals.get(&id.0).cloned())
    }

    async fn find_by_approval_id(
        &self,
        approval_id: &ApprovalRequestId,
    ) -> Result<Option<Dismissal>, RepositoryError> {
        let dismissals = self.dismissals.read().await;
        Ok(dismissals
            .values()
            .find(|dismissal| dismissal.approval_id.as_ref() == Some(approval_id))
            .cloned())
    }

    async fn save(&self, dismissal: Dismissal) -> Result<(), RepositoryError> {
        let mut dismissals = self.dismissals.write().await;
        dismissals.insert(dismissal.id.0.clone(), dismissal);
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryAppointmentRepository {
    appointments: RwLock<HashMap<String, Appointment>>,
}

#[async_trait::async_trait]
impl AppointmentRepository for InMemoryAppointmentRepository {
    async fn find_by_id(
        &self,
        id: &AppointmentId,
    ) -> Result<Option<Appointment>, RepositoryError> {
        let appointments = self.appointments.read().await;
        Ok(appointments.get(&id.0).cloned())
    }

    async fn save(&self, appointment: Appointment) -> Result<(), RepositoryError> {
        let mut appointments = self.appointments.write().await;
        appointments.insert(appointment.id.0.clone(), appointment);
        Ok(())
    }
}
