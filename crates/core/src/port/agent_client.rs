//! Agent Client port - the hub's outbound view of an agent (§4.9, §4.10, §6).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::{ComputeLimits, NodeId, ReadinessSnapshot, SystemInfo, TaskRecord};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiComputeContext {
    pub readiness_score: i32,
    pub scheduled_at: i64,
    pub power_aware: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecuteRequest {
    pub task: TaskRecord,
    pub ai_compute_context: AiComputeContext,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ExecuteResponse {
    Completed {
        result: serde_json::Value,
        duration_ms: i64,
        compute_limits_used: ComputeLimits,
    },
    Failed {
        error: String,
        duration_ms: i64,
        compute_limits_used: ComputeLimits,
    },
    Rejected {
        error: String,
        readiness_score: i32,
        recommendations: Vec<String>,
    },
}

/// Detailed health snapshot returned by the agent's `health_detailed`
/// operation (§4.5), polled by the Health Poller (C10).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthDetail {
    pub readiness: ReadinessSnapshot,
    pub uptime_seconds: i64,
    pub status: HealthStatus,
    pub task_stats: TaskStats,
    pub system_info: SystemInfo,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Warning,
    Critical,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct TaskStats {
    pub total_tasks: u64,
    pub completed_tasks: u64,
    pub failed_tasks: u64,
    pub success_rate_percent: f64,
    pub avg_duration_ms: f64,
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum AgentClientError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("timeout after {0}ms")]
    Timeout(u64),
}

/// §4.9/§4.10: the hub's view of one agent, used by the Scheduler Core and
/// the Health Poller.
#[async_trait]
pub trait AgentClient: Send + Sync {
    async fn fetch_readiness(&self, node: &NodeId) -> Result<ReadinessSnapshot, AgentClientError>;

    async fn fetch_health_detailed(
        &self,
        node: &NodeId,
    ) -> Result<HealthDetail, AgentClientError>;

    async fn execute(
        &self,
        node: &NodeId,
        req: ExecuteRequest,
    ) -> Result<ExecuteResponse, AgentClientError>;
}
