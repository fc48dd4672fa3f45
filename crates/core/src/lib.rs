pub mod audit;
pub mod config;
pub mod domain;
pub mod errors;
pub mod transitions;
pub mod validate;

pub use audit::{AuditCategory, AuditEvent, AuditOutcome, AuditSink, InMemoryAuditSink};
pub use config::{AppConfig, ConfigError, ConfigOverrides, LoadOptions, LogFormat};
pub use domain::actor::{Actor, ActorId, Role};
pub use domain::appointment::{Appointment, AppointmentId, AppointmentStatus, HrAction};
pub use domain::approval::{
    ApprovalRequest, ApprovalRequestId, ApprovalStatus, RequestKind, RequestPayload,
};
pub use domain::contract::{Contract, ContractId, ContractUpdate};
pub use domain::dismissal::{Dismissal, DismissalId, DismissalStatus};
pub use domain::employee::{Employee, EmployeeId, EmployeeStatus, EmployeeUpdate};
pub use domain::resignation::{Resignation, ResignationId, ResignationStatus};
pub use domain::salary::{SalaryId, SalaryRecord};
pub use errors::{ApplicationError, DomainError, InterfaceError};
pub use transitions::{
    plan_transition, TransitionAction, TransitionError, TransitionOutcome, Verdict,
};
pub use validate::{validate_payload, ValidationError};
