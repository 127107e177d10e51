//! reqwest-based `HubClient` (§4.6/§6) - the agent's outbound view of the hub.

use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use sparenet_core::domain::ReadinessSnapshot;
use sparenet_core::port::{
    HeartbeatOutcome, HeartbeatRequest, HubClient, HubClientError, RegisterRequest,
};

const REGISTER_DEADLINE: Duration = Duration::from_secs(10);
const HEARTBEAT_DEADLINE: Duration = Duration::from_secs(5);

pub struct HubClientImpl {
    client: reqwest::Client,
    hub_url: String,
    node_id: String,
}

impl HubClientImpl {
    pub fn new(hub_url: String, node_id: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            hub_url,
            node_id,
        }
    }
}

#[async_trait]
impl HubClient for HubClientImpl {
    async fn register(
        &self,
        req: RegisterRequest,
        _readiness: &ReadinessSnapshot,
    ) -> Result<(), HubClientError> {
        let url = format!("{}/nodes/register", self.hub_url);
        let response = self
            .client
            .post(&url)
            .json(&req)
            .timeout(REGISTER_DEADLINE)
            .send()
            .await
            .map_err(|e| HubClientError::Transport(e.to_string()))?;
        if !response.status().is_success() {
            return Err(HubClientError::Transport(format!(
                "registration rejected: {}",
                response.status()
            )));
        }
        debug!(hub_url = %self.hub_url, "registered with hub");
        Ok(())
    }

    async fn heartbeat(&self, req: HeartbeatRequest) -> Result<HeartbeatOutcome, HubClientError> {
        let url = format!("{}/nodes/{}/heartbeat", self.hub_url, self.node_id);
        let response = self
            .client
            .post(&url)
            .json(&req)
            .timeout(HEARTBEAT_DEADLINE)
            .send()
            .await
            .map_err(|e| HubClientError::Transport(e.to_string()))?;
        match response.status() {
            reqwest::StatusCode::OK => Ok(HeartbeatOutcome::Accepted),
            reqwest::StatusCode::NOT_FOUND => Ok(HeartbeatOutcome::UnknownNode),
            status => Err(HubClientError::Transport(format!(
                "unexpected heartbeat status: {status}"
            ))),
        }
    }
}
