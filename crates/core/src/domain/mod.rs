// Domain Layer - Pure business logic and entities

pub mod error;
pub mod node;
pub mod readiness;
pub mod task;

pub use error::DomainError;
pub use node::{Capability, NodeId, NodeRecord, NodeStatus};
pub use readiness::{
    ComputeLimits, CurrentResources, IdleState, PowerState, ReadinessSnapshot, SystemInfo,
};
pub use task::{TaskId, TaskRecord, TaskStatus, TaskType};
