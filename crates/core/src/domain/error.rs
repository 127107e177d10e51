// Domain Error Types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DomainError {
    #[error("invalid task state transition: {from} -> {to}")]
    InvalidStateTransition { from: String, to: String },

    #[error("node not found: {0}")]
    NodeNotFound(String),

    #[error("task not found: {0}")]
    TaskNotFound(String),

    #[error("invalid capacity: current_load {current_load} exceeds max_concurrent_tasks {max}")]
    InvalidCapacity { current_load: i64, max: i64 },
}

pub type Result<T> = std::result::Result<T, DomainError>;
