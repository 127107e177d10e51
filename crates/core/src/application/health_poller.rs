//! Health Poller (C10, §4.10) - polls every online node's detailed health on
//! a slow interval, grounded in the original source's `_monitor_node_health`.

use std::time::Duration;

use tracing::{debug, warn};

use crate::port::AgentClient;

use super::readiness_cache::ReadinessCache;
use super::registry::NodeRegistry;
use super::shutdown::ShutdownToken;

const POLL_INTERVAL: Duration = Duration::from_secs(30);

pub struct HealthPoller {
    registry: std::sync::Arc<NodeRegistry>,
    cache: std::sync::Arc<ReadinessCache>,
    agent_client: std::sync::Arc<dyn AgentClient>,
    time_provider: std::sync::Arc<dyn crate::port::TimeProvider>,
}

impl HealthPoller {
    pub fn new(
        registry: std::sync::Arc<NodeRegistry>,
        cache: std::sync::Arc<ReadinessCache>,
        agent_client: std::sync::Arc<dyn AgentClient>,
        time_provider: std::sync::Arc<dyn crate::port::TimeProvider>,
    ) -> Self {
        Self {
            registry,
            cache,
            agent_client,
            time_provider,
        }
    }

    pub async fn run(&self, mut shutdown: ShutdownToken) {
        loop {
            tokio::select! {
                _ = tokio::time::sleep(POLL_INTERVAL) => {
                    self.poll_once().await;
                }
                _ = shutdown.wait() => {
                    debug!("health poller shutting down");
                    return;
                }
            }
            if shutdown.is_shutdown() {
                return;
            }
        }
    }

    pub async fn poll_once(&self) {
        let now = self.time_provider.now_millis() / 1000;
        for node in self.registry.online_nodes() {
            match self.agent_client.fetch_health_detailed(&node.id).await {
                Ok(detail) => {
                    let _ = self.registry.update_health(&node.id, detail.readiness.clone());
                    self.cache.put(node.id.clone(), detail.readiness, now);
                }
                Err(err) => {
                    // Leave state unchanged; the heartbeat sweep is the sole
                    // authority for marking a node offline (§4.10).
                    warn!(node_id = %node.id, error = %err, "health poll failed");
                }
            }
        }
    }
}
