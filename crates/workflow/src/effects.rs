//! Applies the entity mutation an approved request stands for. Runs
//! before the status flip so a failure here leaves the request
//! unresolved rather than approved-but-unapplied.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use stafflow_core::domain::appointment::AppointmentStatus;
use stafflow_core::domain::approval::{ApprovalRequest, RequestPayload};
use stafflow_core::domain::contract::{Contract, ContractId};
use stafflow_core::domain::dismissal::DismissalStatus;
use stafflow_core::domain::employee::{Employee, EmployeeId, EmployeeStatus};
use stafflow_core::domain::resignation::ResignationStatus;
use stafflow_core::domain::salary::{SalaryId, SalaryRecord};
use stafflow_core::errors::ApplicationError;
use stafflow_core::transitions::{HrReviewStamp, Resolution, Verdict};
use stafflow_db::repositories::{
    AppointmentRepository, ContractRepository, DismissalRepository, EmployeeRepository,
    RepositoryError, ResignationRepository, SalaryRepository,
};

pub struct SideEffectExecutor {
    employees: Arc<dyn EmployeeRepository>,
    contracts: Arc<dyn ContractRepository>,
    salaries: Arc<dyn SalaryRepository>,
    resignations: Arc<dyn ResignationRepository>,
    dismissals: Arc<dyn DismissalRepository>,
    appointments: Arc<dyn AppointmentRepository>,
}

fn store_failure(error: RepositoryError) -> ApplicationError {
    ApplicationError::SideEffect(error.to_string())
}

impl SideEffectExecutor {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        employees: Arc<dyn EmployeeRepository>,
        contracts: Arc<dyn ContractRepository>,
        salaries: Arc<dyn SalaryRepository>,
        resignations: Arc<dyn ResignationRepository>,
        dismissals: Arc<dyn DismissalRepository>,
        appointments: Arc<dyn AppointmentRepository>,
    ) -> Self {
        Self { employees, contracts, salaries, resignations, dismissals, appointments }
    }

    /// Mirror an HR escalation onto the linked appointment record.
    pub async fn apply_hr_review(
        &self,
        request: &ApprovalRequest,
        stamp: &HrReviewStamp,
    ) -> Result<(), ApplicationError> {
        let RequestPayload::AppointmentApproval { appointment_id, .. } = &request.payload else {
            return Ok(());
        };

        let mut appointment = self
            .appointments
            .find_by_id(appointment_id)
            .await
            .map_err(store_failure)?
            .ok_or_else(|| ApplicationError::NotFound {
                entity: "appointment",
                id: appointment_id.0.clone(),
            })?;

        appointment.status = AppointmentStatus::WaitingAdmin;
        appointment.hr_action = Some(stamp.hr_action);
        appointment.hr_feedback = Some(stamp.feedback.clone());
        appointment.hr_processed_by = Some(stamp.reviewed_by.clone());
        appointment.hr_feedback_at = Some(stamp.reviewed_at);
        appointment.updated_at = stamp.reviewed_at;
        self.appointments.save(appointment).await.map_err(store_failure)
    }

    /// Apply the single entity mutation for a terminal decision.
    /// Approvals mutate the target entity; rejections only mirror the
    /// outcome onto linked workflow records.
    pub async fn apply_decision(
        &self,
        request: &ApprovalRequest,
        verdict: Verdict,
        resolution: &Resolution,
    ) -> Result<(), ApplicationError> {
        let now = resolution.processed_at;

        match &request.payload {
            RequestPayload::CreateUser {
                email,
                full_name,
                position,
                department,
                starting_salary,
            } => {
                if verdict == Verdict::Reject {
                    return Ok(());
                }
                let employee_id = EmployeeId(Uuid::new_v4().to_string());
                self.employees
                    .save(Employee {
                        id: employee_id.clone(),
                        email: email.clone(),
                        full_name: full_name.clone(),
                        position: position.clone(),
                        department: department.clone(),
                        status: EmployeeStatus::Active,
                        created_at: now,
                        updated_at: now,
                    })
                    .await
                    .map_err(store_failure)?;
                self.contracts
                    .save(Contract {
                        id: ContractId(Uuid::new_v4().to_string()),
                        employee_id: employee_id.clone(),
                        position: position.clone(),
                        salary: *starting_salary,
                        start_date: now,
                        end_date: None,
                        created_at: now,
                        updated_at: now,
                    })
                    .await
                    .map_err(store_failure)?;
                self.salaries
                    .save(SalaryRecord {
                        id: SalaryId(Uuid::new_v4().to_string()),
                        employee_id,
                        amount: *starting_salary,
                        effective_from: now,
                        created_at: now,
                        updated_at: now,
                    })
                    .await
                    .map_err(store_failure)
            }

            RequestPayload::UpdateUser { user_id, update_data, .. } => {
                if verdict == Verdict::Reject {
                    return Ok(());
                }
                let mut employee = self.load_employee(user_id).await?;
                update_data.apply(&mut employee);
                employee.updated_at = now;
                self.employees.save(employee).await.map_err(store_failure)
            }

            RequestPayload::DeleteUser { user_id, .. } => {
                if verdict == Verdict::Reject {
                    return Ok(());
                }
                // Deactivation, not a row delete: downstream records
                // keep a valid employee reference.
                let mut employee = self.load_employee(user_id).await?;
                employee.status = EmployeeStatus::Dismissed;
                employee.updated_at = now;
                self.employees.save(employee).await.map_err(store_failure)
            }

            RequestPayload::UpdateContract { contract_id, update_data, .. } => {
                if verdict == Verdict::Reject {
                    return Ok(());
                }
                let mut contract = self
                    .contracts
                    .find_by_id(contract_id)
                    .await
                    .map_err(store_failure)?
                    .ok_or_else(|| ApplicationError::NotFound {
                        entity: "contract",
                        id: contract_id.0.clone(),
                    })?;
                update_data.apply(&mut contract);
                contract.updated_at = now;
                self.contracts.save(contract).await.map_err(store_failure)
            }

            RequestPayload::UpdateSalary { salary_id, amount, .. } => {
                if verdict == Verdict::Reject {
                    return Ok(());
                }
                let mut record = self
                    .salaries
                    .find_by_id(salary_id)
                    .await
                    .map_err(store_failure)?
                    .ok_or_else(|| ApplicationError::NotFound {
                        entity: "salary record",
                        id: salary_id.0.clone(),
                    })?;
                record.amount = *amount;
                record.updated_at = now;
                self.salaries.save(record).await.map_err(store_failure)
            }

            RequestPayload::DismissEmployee { user_id, new_position, .. } => {
                self.resolve_linked_dismissal(request, verdict, resolution, now).await?;
                if verdict == Verdict::Reject {
                    return Ok(());
                }
                let mut employee = self.load_employee(user_id).await?;
                employee.status = EmployeeStatus::Dismissed;
                employee.position = new_position.clone();
                employee.updated_at = now;
                self.employees.save(employee).await.map_err(store_failure)
            }

            RequestPayload::ApproveResignation { resignation_id, user_id } => {
                let mut resignation = self
                    .resignations
                    .find_by_id(resignation_id)
                    .await
                    .map_err(store_failure)?
                    .ok_or_else(|| ApplicationError::NotFound {
                        entity: "resignation",
                        id: resignation_id.0.clone(),
                    })?;
                resignation.status = match verdict {
                    Verdict::Approve => ResignationStatus::Approved,
                    Verdict::Reject => ResignationStatus::Rejected,
                };
                resignation.updated_at = now;
                self.resignations.save(resignation).await.map_err(store_failure)?;

                if verdict == Verdict::Reject {
                    return Ok(());
                }
                let mut employee = self.load_employee(user_id).await?;
                employee.status = EmployeeStatus::Resigned;
                employee.updated_at = now;
                self.employees.save(employee).await.map_err(store_failure)
            }

            RequestPayload::AppointmentApproval { appointment_id, user_id, new_position } => {
                let mut appointment = self
                    .appointments
                    .find_by_id(appointment_id)
                    .await
                    .map_err(store_failure)?
                    .ok_or_else(|| ApplicationError::NotFound {
                        entity: "appointment",
                        id: appointment_id.0.clone(),
                    })?;
                match verdict {
                    Verdict::Approve => {
                        appointment.status = AppointmentStatus::Approved;
                        appointment.approved_at = Some(now);
                    }
                    Verdict::Reject => {
                        appointment.status = AppointmentStatus::Rejected;
                        appointment.rejected_at = Some(now);
                    }
                }
                appointment.updated_at = now;
                self.appointments.save(appointment).await.map_err(store_failure)?;

                if verdict == Verdict::Reject {
                    return Ok(());
                }
                let mut employee = self.load_employee(user_id).await?;
                employee.position = new_position.clone();
                employee.updated_at = now;
                self.employees.save(employee).await.map_err(store_failure)
            }
        }
    }

    async fn load_employee(&self, id: &EmployeeId) -> Result<Employee, ApplicationError> {
        self.employees
            .find_by_id(id)
            .await
            .map_err(store_failure)?
            .ok_or_else(|| ApplicationError::NotFound { entity: "employee", id: id.0.clone() })
    }

    async fn resolve_linked_dismissal(
        &self,
        request: &ApprovalRequest,
        verdict: Verdict,
        resolution: &Resolution,
        now: DateTime<Utc>,
    ) -> Result<(), ApplicationError> {
        let Some(dismissal_id) = &request.dismissal_id else {
            return Ok(());
        };

        let mut dismissal = self
            .dismissals
            .find_by_id(dismissal_id)
            .await
            .map_err(store_failure)?
            .ok_or_else(|| ApplicationError::NotFound {
                entity: "dismissal",
                id: dismissal_id.0.clone(),
            })?;

        let status = match verdict {
            Verdict::Approve => DismissalStatus::Approved,
            Verdict::Reject => DismissalStatus::Rejected,
        };
        dismissal.resolve(
            status,
            resolution.processed_by.clone(),
            resolution.admin_response.clone(),
            now,
        );
        self.dismissals.save(dismissal).await.map_err(store_failure)
    }
}
