//! Hub Client port - the agent's outbound view of the hub (§4.6, §6).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::{Capability, PowerState, ReadinessSnapshot};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub id: String,
    pub host: String,
    pub port: u16,
    pub capabilities: Vec<Capability>,
    pub max_concurrent_tasks: i64,
    pub ready_for_ai: bool,
    pub readiness_score: i32,
    pub gpu_available: bool,
    pub power_state: PowerState,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeartbeatRequest {
    pub timestamp: i64,
    pub ready_for_ai: bool,
    pub readiness_score: i32,
    pub idle_state: crate::domain::IdleState,
    pub power_state: PowerState,
    pub current_resources: crate::domain::CurrentResources,
    pub compute_limits: crate::domain::ComputeLimits,
    pub health_status: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeartbeatOutcome {
    Accepted,
    UnknownNode,
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum HubClientError {
    #[error("transport error: {0}")]
    Transport(String),
}

/// §4.6: the agent lifecycle loop's view of the hub. `readiness` is the
/// `ReadinessSnapshot` the current tick should report.
#[async_trait]
pub trait HubClient: Send + Sync {
    async fn register(
        &self,
        req: RegisterRequest,
        readiness: &ReadinessSnapshot,
    ) -> Result<(), HubClientError>;

    async fn heartbeat(&self, req: HeartbeatRequest) -> Result<HeartbeatOutcome, HubClientError>;
}
