pub mod bridge;
pub mod effects;
pub mod service;

pub use bridge::LinkedEntityBridge;
pub use effects::SideEffectExecutor;
pub use service::{ApprovalService, WorkflowStores};
