use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use stafflow_core::audit::{AuditCategory, AuditEvent, AuditOutcome, AuditSink};
use stafflow_core::domain::actor::{Actor, Role};
use stafflow_core::domain::appointment::{AppointmentId, HrAction};
use stafflow_core::domain::approval::{
    ApprovalRequest, ApprovalRequestId, ApprovalStatus, RequestPayload,
};
use stafflow_core::domain::dismissal::{Dismissal, DismissalId, DismissalStatus};
use stafflow_core::errors::{ApplicationError, DomainError};
use stafflow_core::transitions::{plan_transition, TransitionAction, Verdict};
use stafflow_core::validate::validate_payload;
use stafflow_db::repositories::{
    AppointmentRepository, ApprovalRepository, ContractRepository, DismissalRepository,
    EmployeeRepository, RepositoryError, ResignationRepository, SalaryRepository,
};

use crate::bridge::LinkedEntityBridge;
use crate::effects::SideEffectExecutor;

/// Repository handles the service owns. Grouped so call sites wire one
/// value instead of seven.
#[derive(Clone)]
pub struct WorkflowStores {
    pub approvals: Arc<dyn ApprovalRepository>,
    pub employees: Arc<dyn EmployeeRepository>,
    pub contracts: Arc<dyn ContractRepository>,
    pub salaries: Arc<dyn SalaryRepository>,
    pub resignations: Arc<dyn ResignationRepository>,
    pub dismissals: Arc<dyn DismissalRepository>,
    pub appointments: Arc<dyn AppointmentRepository>,
}

/// The one entry point for every workflow operation. Handlers and the
/// CLI never touch repositories directly; invariants are enforced here
/// and in the pure transition planner.
pub struct ApprovalService {
    approvals: Arc<dyn ApprovalRepository>,
    dismissals: Arc<dyn DismissalRepository>,
    effects: SideEffectExecutor,
    bridge: LinkedEntityBridge,
    audit: Arc<dyn AuditSink>,
}

fn store_failure(error: RepositoryError) -> ApplicationError {
    ApplicationError::Persistence(error.to_string())
}

impl ApprovalService {
    pub fn new(stores: WorkflowStores, audit: Arc<dyn AuditSink>) -> Self {
        let effects = SideEffectExecutor::new(
            stores.employees.clone(),
            stores.contracts.clone(),
            stores.salaries.clone(),
            stores.resignations.clone(),
            stores.dismissals.clone(),
            stores.appointments.clone(),
        );
        let bridge = LinkedEntityBridge::new(stores.approvals.clone(), stores.dismissals.clone());
        Self { approvals: stores.approvals, dismissals: stores.dismissals, effects, bridge, audit }
    }

    /// Validate and persist a new request in `pending`. Dismissal
    /// requests also create the linked dismissal record, with both
    /// sides of the bridge pointing at each other.
    pub async fn submit(
        &self,
        actor: &Actor,
        payload: RequestPayload,
        correlation_id: &str,
    ) -> Result<ApprovalRequest, ApplicationError> {
        if actor.role == Role::Employee {
            return Err(ApplicationError::Domain(DomainError::Authorization(
                "employee principals cannot submit approval requests".to_string(),
            )));
        }

        let now = Utc::now();
        validate_payload(&payload, now).map_err(DomainError::from)?;

        let request_id = ApprovalRequestId(Uuid::new_v4().to_string());
        let dismissal_id = match &payload {
            RequestPayload::DismissEmployee {
                user_id,
                old_position,
                new_position,
                reason,
                effective_date,
            } => {
                let dismissal = Dismissal {
                    id: DismissalId(Uuid::new_v4().to_string()),
                    user_id: user_id.clone(),
                    old_position: old_position.clone(),
                    new_position: new_position.clone(),
                    reason: reason.clone(),
                    effective_date: *effective_date,
                    created_by: actor.id.clone(),
                    status: DismissalStatus::Pending,
                    admin_response: None,
                    approval_id: Some(request_id.clone()),
                    processed_by: None,
                    processed_at: None,
                    created_at: now,
                    updated_at: now,
                };
                let id = dismissal.id.clone();
                self.dismissals.save(dismissal).await.map_err(store_failure)?;
                Some(id)
            }
            _ => None,
        };

        let request = ApprovalRequest {
            id: request_id,
            payload,
            status: ApprovalStatus::Pending,
            requested_by: actor.id.clone(),
            requested_by_role: actor.role,
            processed_by: None,
            admin_response: None,
            processed_at: None,
            hr_action: None,
            hr_feedback: None,
            hr_processed_by: None,
            hr_feedback_at: None,
            dismissal_id,
            created_at: now,
            updated_at: now,
        };
        self.approvals.save(request.clone()).await.map_err(store_failure)?;

        self.audit.emit(
            AuditEvent::new(
                Some(request.id.clone()),
                correlation_id,
                "approval.submitted",
                AuditCategory::Ingress,
                actor.id.0.clone(),
                AuditOutcome::Success,
            )
            .with_metadata("request_type", request.payload.kind().as_str()),
        );

        Ok(request)
    }

    /// The HR escalation step for HR-raised appointment requests.
    pub async fn hr_review(
        &self,
        actor: &Actor,
        id: &ApprovalRequestId,
        hr_action: HrAction,
        feedback: &str,
        correlation_id: &str,
    ) -> Result<ApprovalRequest, ApplicationError> {
        let request = self.load(id).await?;
        let action =
            TransitionAction::HrReview { hr_action, feedback: feedback.to_string() };
        let now = Utc::now();

        let outcome = match plan_transition(&request, actor, &action, now) {
            Ok(outcome) => outcome,
            Err(error) => {
                self.emit_transition_rejected(&request, actor, correlation_id, &error.to_string());
                return Err(DomainError::from(error).into());
            }
        };
        let stamp = outcome.hr_review.clone().ok_or_else(|| {
            ApplicationError::Domain(DomainError::InvariantViolation(
                "hr review outcome must carry a review stamp".to_string(),
            ))
        })?;

        // Appointment record first, then the guarded status flip.
        self.effects.apply_hr_review(&request, &stamp).await?;

        let mut updated = request.clone();
        updated.status = outcome.to;
        updated.hr_action = Some(stamp.hr_action);
        updated.hr_feedback = Some(stamp.feedback.clone());
        updated.hr_processed_by = Some(stamp.reviewed_by.clone());
        updated.hr_feedback_at = Some(stamp.reviewed_at);
        updated.updated_at = now;

        let applied = self
            .approvals
            .save_if_status(updated.clone(), outcome.from)
            .await
            .map_err(store_failure)?;
        if !applied {
            return Err(ApplicationError::Conflict {
                entity: "approval request",
                id: id.0.clone(),
            });
        }

        self.emit_transition_applied(&updated, actor, correlation_id, outcome.from);
        Ok(updated)
    }

    /// The Admin terminal step: plan the transition, apply the side
    /// effect, then flip the status with the optimistic-concurrency
    /// guard. A lost race surfaces as a conflict.
    pub async fn decide(
        &self,
        actor: &Actor,
        id: &ApprovalRequestId,
        verdict: Verdict,
        admin_response: &str,
        correlation_id: &str,
    ) -> Result<ApprovalRequest, ApplicationError> {
        let request = self.load(id).await?;
        let action = TransitionAction::Decide {
            verdict,
            admin_response: admin_response.to_string(),
        };
        let now = Utc::now();

        let outcome = match plan_transition(&request, actor, &action, now) {
            Ok(outcome) => outcome,
            Err(error) => {
                self.emit_transition_rejected(&request, actor, correlation_id, &error.to_string());
                return Err(DomainError::from(error).into());
            }
        };
        let resolution = outcome.resolution.clone().ok_or_else(|| {
            ApplicationError::Domain(DomainError::InvariantViolation(
                "terminal outcome must carry resolution fields".to_string(),
            ))
        })?;

        self.effects.apply_decision(&request, verdict, &resolution).await?;

        let mut updated = request.clone();
        updated.status = outcome.to;
        updated.processed_by = Some(resolution.processed_by.clone());
        updated.admin_response = Some(resolution.admin_response.clone());
        updated.processed_at = Some(resolution.processed_at);
        updated.updated_at = now;

        let applied = self
            .approvals
            .save_if_status(updated.clone(), outcome.from)
            .await
            .map_err(store_failure)?;
        if !applied {
            return Err(ApplicationError::Conflict {
                entity: "approval request",
                id: id.0.clone(),
            });
        }

        self.emit_transition_applied(&updated, actor, correlation_id, outcome.from);
        Ok(updated)
    }

    pub async fn find(
        &self,
        id: &ApprovalRequestId,
    ) -> Result<Option<ApprovalRequest>, ApplicationError> {
        self.approvals.find_by_id(id).await.map_err(store_failure)
    }

    pub async fn list_by_status(
        &self,
        status: ApprovalStatus,
        limit: u32,
    ) -> Result<Vec<ApprovalRequest>, ApplicationError> {
        self.approvals.list_by_status(status, limit).await.map_err(store_failure)
    }

    pub async fn dismissal_for_approval(
        &self,
        approval_id: &ApprovalRequestId,
    ) -> Result<Dismissal, ApplicationError> {
        self.bridge.dismissal_for_approval(approval_id).await
    }

    pub async fn approval_for_dismissal(
        &self,
        dismissal_id: &DismissalId,
    ) -> Result<ApprovalRequest, ApplicationError> {
        self.bridge.approval_for_dismissal(dismissal_id).await
    }

    pub async fn approval_for_appointment(
        &self,
        appointment_id: &AppointmentId,
    ) -> Result<ApprovalRequest, ApplicationError> {
        self.bridge.approval_for_appointment(appointment_id).await
    }

    async fn load(&self, id: &ApprovalRequestId) -> Result<ApprovalRequest, ApplicationError> {
        self.approvals
            .find_by_id(id)
            .await
            .map_err(store_failure)?
            .ok_or_else(|| ApplicationError::NotFound {
                entity: "approval request",
                id: id.0.clone(),
            })
    }

    fn emit_transition_applied(
        &self,
        request: &ApprovalRequest,
        actor: &Actor,
        correlation_id: &str,
        from: ApprovalStatus,
    ) {
        self.audit.emit(
            AuditEvent::new(
                Some(request.id.clone()),
                correlation_id,
                "workflow.transition_applied",
                AuditCategory::Workflow,
                actor.id.0.clone(),
                AuditOutcome::Success,
            )
            .with_metadata("from", from.as_str())
            .with_metadata("to", request.status.as_str()),
        );
    }

    fn emit_transition_rejected(
        &self,
        request: &ApprovalRequest,
        actor: &Actor,
        correlation_id: &str,
        reason: &str,
    ) {
        self.audit.emit(
            AuditEvent::new(
                Some(request.id.clone()),
                correlation_id,
                "workflow.transition_rejected",
                AuditCategory::Workflow,
                actor.id.0.clone(),
                AuditOutcome::Rejected,
            )
            .with_metadata("reason", reason.to_string()),
        );
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::Utc;
    use rust_decimal::Decimal;

    use stafflow_core::audit::{AuditOutcome, InMemoryAuditSink};
    use stafflow_core::domain::actor::{Actor, Role};
    use stafflow_core::domain::appointment::{
        Appointment, AppointmentId, AppointmentStatus, HrAction,
    };
    use stafflow_core::domain::approval::{ApprovalStatus, RequestPayload};
    use stafflow_core::domain::contract::{Contract, ContractId, ContractUpdate};
    use stafflow_core::domain::dismissal::DismissalStatus;
    use stafflow_core::domain::employee::{Employee, EmployeeId, EmployeeStatus};
    use stafflow_core::errors::{ApplicationError, DomainError};
    use stafflow_core::transitions::{TransitionError, Verdict};
    use stafflow_db::repositories::{
        AppointmentRepository, ContractRepository, DismissalRepository, EmployeeRepository,
        InMemoryAppointmentRepository, InMemoryApprovalRepository, InMemoryContractRepository,
        InMemoryDismissalRepository, InMemoryEmployeeRepository, InMemoryResignationRepository,
        InMemorySalaryRepository,
    };

    use super::{ApprovalService, WorkflowStores};

    struct Harness {
        service: ApprovalService,
        employees: Arc<InMemoryEmployeeRepository>,
        contracts: Arc<InMemoryContractRepository>,
        dismissals: Arc<InMemoryDismissalRepository>,
        appointments: Arc<InMemoryAppointmentRepository>,
        audit: InMemoryAuditSink,
    }

    fn harness() -> Harness {
        let approvals = Arc::new(InMemoryApprovalRepository::default());
        let employees = Arc::new(InMemoryEmployeeRepository::default());
        let contracts = Arc::new(InMemoryContractRepository::default());
        let salaries = Arc::new(InMemorySalaryRepository::default());
        let resignations = Arc::new(InMemoryResignationRepository::default());
        let dismissals = Arc::new(InMemoryDismissalRepository::default());
        let appointments = Arc::new(InMemoryAppointmentRepository::default());
        let audit = InMemoryAuditSink::default();

        let service = ApprovalService::new(
            WorkflowStores {
                approvals,
                employees: employees.clone(),
                contracts: contracts.clone(),
                salaries,
                resignations,
                dismissals: dismissals.clone(),
                appointments: appointments.clone(),
            },
            Arc::new(audit.clone()),
        );

        Harness { service, employees, contracts, dismissals, appointments, audit }
    }

    fn admin() -> Actor {
        Actor::new("admin-1", Role::Admin)
    }

    fn hr() -> Actor {
        Actor::new("hr-1", Role::Hr)
    }

    async fn seed_employee(harness: &Harness, id: &str) {
        let now = Utc::now();
        harness
            .employees
            .save(Employee {
                id: EmployeeId(id.to_string()),
                email: format!("{id}@corp.example"),
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
    async fn contract_update_is_applied_only_after_admin_approval() {
        let harness = harness();
        let now = Utc::now();
        harness
            .contracts
            .save(Contract {
                id: ContractId("c1".to_string()),
                employee_id: EmployeeId("emp-1".to_string()),
                position: "engineer".to_string(),
                salary: Decimal::new(1000, 0),
                start_date: now,
                end_date: None,
                created_at: now,
                updated_at: now,
            })
            .await
            .expect("seed contract");

        let payload = RequestPayload::UpdateContract {
            contract_id: ContractId("c1".to_string()),
            update_data: ContractUpdate {
                salary: Some(Decimal::new(1200, 0)),
                ..ContractUpdate::default()
            },
            old_data: ContractUpdate {
                salary: Some(Decimal::new(1000, 0)),
                ..ContractUpdate::default()
            },
        };
        let request =
            harness.service.submit(&hr(), payload, "req-1").await.expect("submit");
        assert_eq!(request.status, ApprovalStatus::Pending);

        // Still untouched while pending.
        let contract = harness
            .contracts
            .find_by_id(&ContractId("c1".to_string()))
            .await
            .expect("find")
            .expect("exists");
        assert_eq!(contract.salary, Decimal::new(1000, 0));

        let resolved = harness
            .service
            .decide(&admin(), &request.id, Verdict::Approve, "raise approved", "req-2")
            .await
            .expect("decide");
        assert_eq!(resolved.status, ApprovalStatus::Approved);
        assert_eq!(resolved.admin_response.as_deref(), Some("raise approved"));
        assert!(resolved.processed_at.is_some());

        let contract = harness
            .contracts
            .find_by_id(&ContractId("c1".to_string()))
            .await
            .expect("find")
            .expect("exists");
        assert_eq!(contract.salary, Decimal::new(1200, 0));
    }

    #[tokio::test]
    async fn reject_with_blank_admin_response_leaves_request_pending() {
        let harness = harness();
        seed_employee(&harness, "emp-1").await;

        let request = harness
            .service
            .submit(
                &hr(),
                RequestPayload::DeleteUser {
                    user_id: EmployeeId("emp-1".to_string()),
                    reason: "duplicate account".to_string(),
                },
                "req-1",
            )
            .await
            .expect("submit");

        let error = harness
            .service
            .decide(&admin(), &request.id, Verdict::Reject, "   ", "req-2")
            .await
            .expect_err("blank rationale must fail");
        assert!(matches!(
            error,
            ApplicationError::Domain(DomainError::Transition(
                TransitionError::MissingAdminResponse
            ))
        ));

        let stored = harness.service.find(&request.id).await.expect("find").expect("exists");
        assert_eq!(stored.status, ApprovalStatus::Pending);
        assert!(stored.processed_by.is_none());

        let rejected_events: Vec<_> = harness
            .audit
            .events()
            .into_iter()
            .filter(|event| event.outcome == AuditOutcome::Rejected)
            .collect();
        assert_eq!(rejected_events.len(), 1);
    }

    #[tokio::test]
    async fn hr_cannot_resolve_a_request() {
        let harness = harness();
        seed_employee(&harness, "emp-1").await;

        let request = harness
            .service
            .submit(
                &hr(),
                RequestPayload::DeleteUser {
                    user_id: EmployeeId("emp-1".to_string()),
                    reason: "left twice".to_string(),
                },
                "req-1",
            )
            .await
            .expect("submit");

        let error = harness
            .service
            .decide(&hr(), &request.id, Verdict::Approve, "self-approve", "req-2")
            .await
            .expect_err("hr may not decide");
        assert!(matches!(
            error,
            ApplicationError::Domain(DomainError::Transition(
                TransitionError::TerminalRequiresAdmin { role: Role::Hr }
            ))
        ));
    }

    #[tokio::test]
    async fn employee_principals_cannot_submit() {
        let harness = harness();

        let error = harness
            .service
            .submit(
                &Actor::new("emp-1", Role::Employee),
                RequestPayload::DeleteUser {
                    user_id: EmployeeId("emp-2".to_string()),
                    reason: "grudge".to_string(),
                },
                "req-1",
            )
            .await
            .expect_err("employee submission must be denied");
        assert!(matches!(
            error,
            ApplicationError::Domain(DomainError::Authorization(_))
        ));
    }

    #[tokio::test]
    async fn invalid_payload_is_rejected_at_submission() {
        let harness = harness();

        let error = harness
            .service
            .submit(
                &hr(),
                RequestPayload::DeleteUser {
                    user_id: EmployeeId("emp-1".to_string()),
                    reason: "  ".to_string(),
                },
                "req-1",
            )
            .await
            .expect_err("blank reason must fail validation");
        assert!(matches!(
            error,
            ApplicationError::Domain(DomainError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn hr_raised_appointment_walks_the_two_step_flow() {
        let harness = harness();
        seed_employee(&harness, "emp-1").await;
        let now = Utc::now();
        harness
            .appointments
            .save(Appointment {
                id: AppointmentId("apt-1".to_string()),
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
            })
            .await
            .expect("seed appointment");

        let request = harness
            .service
            .submit(
                &hr(),
                RequestPayload::AppointmentApproval {
                    appointment_id: AppointmentId("apt-1".to_string()),
                    user_id: EmployeeId("emp-1".to_string()),
                    new_position: "lead engineer".to_string(),
                },
                "req-1",
            )
            .await
            .expect("submit");

        // Admin cannot short-circuit the escalation.
        let error = harness
            .service
            .decide(&admin(), &request.id, Verdict::Approve, "fast-track", "req-2")
            .await
            .expect_err("escalation is mandatory");
        assert!(matches!(
            error,
            ApplicationError::Domain(DomainError::Transition(
                TransitionError::EscalationRequired { .. }
            ))
        ));

        let escalated = harness
            .service
            .hr_review(&hr(), &request.id, HrAction::Approve, "strong performer", "req-3")
            .await
            .expect("hr review");
        assert_eq!(escalated.status, ApprovalStatus::WaitingAdmin);
        assert_eq!(escalated.hr_feedback.as_deref(), Some("strong performer"));

        let appointment = harness
            .appointments
            .find_by_id(&AppointmentId("apt-1".to_string()))
            .await
            .expect("find")
            .expect("exists");
        assert_eq!(appointment.status, AppointmentStatus::WaitingAdmin);
        assert_eq!(appointment.hr_action, Some(HrAction::Approve));

        let resolved = harness
            .service
            .decide(&admin(), &request.id, Verdict::Approve, "promotion confirmed", "req-4")
            .await
            .expect("decide");
        assert_eq!(resolved.status, ApprovalStatus::Approved);

        let appointment = harness
            .appointments
            .find_by_id(&AppointmentId("apt-1".to_string()))
            .await
            .expect("find")
            .expect("exists");
        assert_eq!(appointment.status, AppointmentStatus::Approved);
        assert!(appointment.approved_at.is_some());

        let employee = harness
            .employees
            .find_by_id(&EmployeeId("emp-1".to_string()))
            .await
            .expect("find")
            .expect("exists");
        assert_eq!(employee.position, "lead engineer");
    }

    #[tokio::test]
    async fn admin_raised_appointment_resolves_directly() {
        let harness = harness();
        seed_employee(&harness, "emp-1").await;
        let now = Utc::now();
        harness
            .appointments
            .save(Appointment {
                id: AppointmentId("apt-1".to_string()),
                user_id: EmployeeId("emp-1".to_string()),
                old_position: "engineer".to_string(),
                new_position: "staff engineer".to_string(),
                reason: "promotion cycle".to_string(),
                status: AppointmentStatus::Pending,
                hr_feedback: None,
                hr_feedback_at: None,
                hr_action: None,
                hr_processed_by: None,
                approved_at: None,
                rejected_at: None,
                created_at: now,
                updated_at: now,
            })
            .await
            .expect("seed appointment");

        let request = harness
            .service
            .submit(
                &admin(),
                RequestPayload::AppointmentApproval {
                    appointment_id: AppointmentId("apt-1".to_string()),
                    user_id: EmployeeId("emp-1".to_string()),
                    new_position: "staff engineer".to_string(),
                },
                "req-1",
            )
            .await
            .expect("submit");

        let resolved = harness
            .service
            .decide(&admin(), &request.id, Verdict::Approve, "approved", "req-2")
            .await
            .expect("decide without escalation");
        assert_eq!(resolved.status, ApprovalStatus::Approved);
    }

    #[tokio::test]
    async fn dismissal_side_effect_applies_exactly_once() {
        let harness = harness();
        seed_employee(&harness, "emp-1").await;

        let request = harness
            .service
            .submit(
                &hr(),
                RequestPayload::DismissEmployee {
                    user_id: EmployeeId("emp-1".to_string()),
                    old_position: "engineer".to_string(),
                    new_position: "none".to_string(),
                    reason: "restructuring".to_string(),
                    effective_date: Utc::now() + chrono::Duration::days(14),
                },
                "req-1",
            )
            .await
            .expect("submit");

        // Submission created the bridged dismissal record.
        let dismissal =
            harness.service.dismissal_for_approval(&request.id).await.expect("bridge");
        assert_eq!(dismissal.status, DismissalStatus::Pending);
        assert_eq!(dismissal.approval_id.as_ref(), Some(&request.id));

        let back = harness
            .service
            .approval_for_dismissal(&dismissal.id)
            .await
            .expect("reverse bridge");
        assert_eq!(back.id, request.id);

        let resolved = harness
            .service
            .decide(&admin(), &request.id, Verdict::Approve, "confirmed", "req-2")
            .await
            .expect("decide");
        assert_eq!(resolved.status, ApprovalStatus::Approved);

        let dismissal = harness
            .dismissals
            .find_by_id(&dismissal.id)
            .await
            .expect("find")
            .expect("exists");
        assert_eq!(dismissal.status, DismissalStatus::Approved);
        let first_processed_at = dismissal.processed_at.expect("stamped");

        let employee = harness
            .employees
            .find_by_id(&EmployeeId("emp-1".to_string()))
            .await
            .expect("find")
            .expect("exists");
        assert_eq!(employee.status, EmployeeStatus::Dismissed);

        // A second approval attempt conflicts and re-stamps nothing.
        let error = harness
            .service
            .decide(&admin(), &request.id, Verdict::Approve, "again", "req-3")
            .await
            .expect_err("terminal record cannot be re-approved");
        assert!(matches!(
            error,
            ApplicationError::Domain(DomainError::Transition(
                TransitionError::AlreadyResolved { .. }
            ))
        ));

        let dismissal = harness
            .dismissals
            .find_by_id(&dismissal.id)
            .await
            .expect("find")
            .expect("exists");
        assert_eq!(dismissal.processed_at, Some(first_processed_at));
    }

    #[tokio::test]
    async fn rejected_dismissal_mirrors_without_touching_the_employee() {
        let harness = harness();
        seed_employee(&harness, "emp-1").await;

        let request = harness
            .service
            .submit(
                &hr(),
                RequestPayload::DismissEmployee {
                    user_id: EmployeeId("emp-1".to_string()),
                    old_position: "engineer".to_string(),
                    new_position: "none".to_string(),
                    reason: "restructuring".to_string(),
                    effective_date: Utc::now() + chrono::Duration::days(14),
                },
                "req-1",
            )
            .await
            .expect("submit");

        harness
            .service
            .decide(&admin(), &request.id, Verdict::Reject, "not justified", "req-2")
            .await
            .expect("decide");

        let dismissal =
            harness.service.dismissal_for_approval(&request.id).await.expect("bridge");
        assert_eq!(dismissal.status, DismissalStatus::Rejected);
        assert_eq!(dismissal.admin_response.as_deref(), Some("not justified"));

        let employee = harness
            .employees
            .find_by_id(&EmployeeId("emp-1".to_string()))
            .await
            .expect("find")
            .expect("exists");
        assert_eq!(employee.status, EmployeeStatus::Active);
    }

    #[tokio::test]
    async fn missing_side_effect_target_blocks_the_status_flip() {
        let harness = harness();

        let request = harness
            .service
            .submit(
                &hr(),
                RequestPayload::UpdateContract {
                    contract_id: ContractId("ghost".to_string()),
                    update_data: ContractUpdate {
                        salary: Some(Decimal::new(1200, 0)),
                        ..ContractUpdate::default()
                    },
                    old_data: ContractUpdate::default(),
                },
                "req-1",
            )
            .await
            .expect("submit");

        let error = harness
            .service
            .decide(&admin(), &request.id, Verdict::Approve, "sure", "req-2")
            .await
            .expect_err("missing contract must fail before the flip");
        assert!(matches!(error, ApplicationError::NotFound { entity: "contract", .. }));

        let stored = harness.service.find(&request.id).await.expect("find").expect("exists");
        assert_eq!(stored.status, ApprovalStatus::Pending);
    }
}
