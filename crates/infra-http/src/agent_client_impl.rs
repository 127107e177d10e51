//! reqwest-based `AgentClient` (§4.9/§4.10/§6) - the hub's outbound view of
//! one agent.

use std::time::Duration;

use async_trait::async_trait;

use sparenet_core::domain::{NodeId, ReadinessSnapshot};
use sparenet_core::port::{AgentClient, AgentClientError, ExecuteRequest, ExecuteResponse, HealthDetail};

/// Per-call-class deadlines (§5): readiness 10s, health 15s, execute 60s.
pub struct Deadlines {
    pub readiness: Duration,
    pub health: Duration,
    pub execute: Duration,
}

impl Default for Deadlines {
    fn default() -> Self {
        Self {
            readiness: Duration::from_secs(10),
            health: Duration::from_secs(15),
            execute: Duration::from_secs(60),
        }
    }
}

type NodeAddressResolver = dyn Fn(&NodeId) -> Option<String> + Send + Sync;

pub struct AgentClientImpl {
    client: reqwest::Client,
    deadlines: Deadlines,
    registry: std::sync::Arc<NodeAddressResolver>,
}

impl AgentClientImpl {
    /// `node_address` resolves a node id to its base URL (`http://host:port`),
    /// looked up against the hub's node registry so the client never caches
    /// a stale address.
    pub fn new(
        deadlines: Deadlines,
        node_address: impl Fn(&NodeId) -> Option<String> + Send + Sync + 'static,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            deadlines,
            registry: std::sync::Arc::new(node_address),
        }
    }

    fn base_url(&self, node: &NodeId) -> Result<String, AgentClientError> {
        (self.registry)(node)
            .ok_or_else(|| AgentClientError::Transport(format!("unknown node: {node}")))
    }
}

#[async_trait]
impl AgentClient for AgentClientImpl {
    async fn fetch_readiness(&self, node: &NodeId) -> Result<ReadinessSnapshot, AgentClientError> {
        let url = format!("{}/ai-readiness", self.base_url(node)?);
        self.client
            .get(&url)
            .timeout(self.deadlines.readiness)
            .send()
            .await
            .map_err(|e| AgentClientError::Transport(e.to_string()))?
            .json::<ReadinessSnapshot>()
            .await
            .map_err(|e| AgentClientError::Transport(e.to_string()))
    }

    async fn fetch_health_detailed(&self, node: &NodeId) -> Result<HealthDetail, AgentClientError> {
        let url = format!("{}/health/detailed", self.base_url(node)?);
        self.client
            .get(&url)
            .timeout(self.deadlines.health)
            .send()
            .await
            .map_err(|e| AgentClientError::Transport(e.to_string()))?
            .json::<HealthDetail>()
            .await
            .map_err(|e| AgentClientError::Transport(e.to_string()))
    }

    async fn execute(
        &self,
        node: &NodeId,
        req: ExecuteRequest,
    ) -> Result<ExecuteResponse, AgentClientError> {
        let url = format!("{}/tasks/execute", self.base_url(node)?);
        self.client
            .post(&url)
            .json(&req)
            .timeout(self.deadlines.execute)
            .send()
            .await
            .map_err(|e| AgentClientError::Transport(e.to_string()))?
            .json::<ExecuteResponse>()
            .await
            .map_err(|e| AgentClientError::Transport(e.to_string()))
    }
}
