//! Task record (§3), owned by the Node Registry (C7).

use serde::{Deserialize, Serialize};

use super::error::DomainError;
use super::node::NodeId;

pub type TaskId = String;

/// Canonical lowercase task type. Two task types get a hard requirement in
/// the scheduler (§4.9): `gpu_inference` and `training` both require
/// `gpu_available` on the candidate node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskType(String);

impl TaskType {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into().to_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn requires_gpu(&self) -> bool {
        matches!(self.0.as_str(), "gpu_inference" | "training")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TaskStatus::Pending => write!(f, "PENDING"),
            TaskStatus::Running => write!(f, "RUNNING"),
            TaskStatus::Completed => write!(f, "COMPLETED"),
            TaskStatus::Failed => write!(f, "FAILED"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskRecord {
    pub id: TaskId,
    pub task_type: TaskType,
    pub priority: i32,
    pub created_at: i64,
    pub payload: serde_json::Value,
    pub status: TaskStatus,
    pub assigned_node_id: Option<NodeId>,
}

impl TaskRecord {
    pub fn new(
        id: impl Into<String>,
        task_type: TaskType,
        priority: i32,
        created_at: i64,
        payload: serde_json::Value,
    ) -> Self {
        Self {
            id: id.into(),
            task_type,
            priority,
            created_at,
            payload,
            status: TaskStatus::Pending,
            assigned_node_id: None,
        }
    }

    /// `pending → running`, recording the assigned node. Atomic from the
    /// task driver's point of view: the caller holds the registry write
    /// lock across this call (§9 Open Question: this is the one strict
    /// place where pending→running and candidate selection must line up).
    pub fn start(&mut self, node_id: NodeId) -> Result<(), DomainError> {
        if self.status != TaskStatus::Pending {
            return Err(DomainError::InvalidStateTransition {
                from: self.status.to_string(),
                to: TaskStatus::Running.to_string(),
            });
        }
        self.status = TaskStatus::Running;
        self.assigned_node_id = Some(node_id);
        Ok(())
    }

    /// Transient return to `pending` before the agent accepted the task
    /// (rejection or transport error), or when the offline sweep re-queues
    /// a task whose node disappeared.
    pub fn requeue(&mut self) {
        self.status = TaskStatus::Pending;
        self.assigned_node_id = None;
    }

    pub fn complete(&mut self) -> Result<(), DomainError> {
        if self.status != TaskStatus::Running {
            return Err(DomainError::InvalidStateTransition {
                from: self.status.to_string(),
                to: TaskStatus::Completed.to_string(),
            });
        }
        self.status = TaskStatus::Completed;
        Ok(())
    }

    pub fn fail(&mut self) -> Result<(), DomainError> {
        if self.status != TaskStatus::Running {
            return Err(DomainError::InvalidStateTransition {
                from: self.status.to_string(),
                to: TaskStatus::Failed.to_string(),
            });
        }
        self.status = TaskStatus::Failed;
        Ok(())
    }
}
