//! Agent Lifecycle Loop (C6, §4.6) - register once, then heartbeat on a
//! fixed tick, re-registering after consecutive heartbeat failures.

use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use tracing::{info, warn};

use crate::domain::{Capability, NodeId};
use crate::port::{
    HeartbeatOutcome, HeartbeatRequest, HubClient, HubClientError, RegisterRequest,
};

use super::readiness::ReadinessEvaluator;
use super::shutdown::ShutdownToken;

const CONSECUTIVE_FAILURE_THRESHOLD: u32 = 5;

pub struct AgentLifecycleLoop {
    node_id: NodeId,
    host: String,
    port: u16,
    capabilities: Vec<Capability>,
    max_concurrent_tasks: i64,
    heartbeat_interval: Duration,
    hub_client: std::sync::Arc<dyn HubClient>,
    evaluator: std::sync::Arc<ReadinessEvaluator>,
    consecutive_failures: AtomicU32,
}

impl AgentLifecycleLoop {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        node_id: NodeId,
        host: String,
        port: u16,
        capabilities: Vec<Capability>,
        max_concurrent_tasks: i64,
        heartbeat_interval: Duration,
        hub_client: std::sync::Arc<dyn HubClient>,
        evaluator: std::sync::Arc<ReadinessEvaluator>,
    ) -> Self {
        Self {
            node_id,
            host,
            port,
            capabilities,
            max_concurrent_tasks,
            heartbeat_interval,
            hub_client,
            evaluator,
            consecutive_failures: AtomicU32::new(0),
        }
    }

    /// Startup registration. Failure here is fatal to the agent process
    /// (§7: "agent treats startup registration failure as fatal and exits").
    pub async fn register(&self) -> Result<(), HubClientError> {
        let readiness = self.evaluator.evaluate().await;
        let request = RegisterRequest {
            id: self.node_id.clone(),
            host: self.host.clone(),
            port: self.port,
            capabilities: self.capabilities.clone(),
            max_concurrent_tasks: self.max_concurrent_tasks,
            ready_for_ai: readiness.ready_for_ai,
            readiness_score: readiness.readiness_score,
            gpu_available: readiness.current_resources.gpu_available,
            power_state: readiness.power_state,
        };
        self.hub_client.register(request, &readiness).await?;
        self.consecutive_failures.store(0, Ordering::SeqCst);
        info!(node_id = %self.node_id, "registered with hub");
        Ok(())
    }

    pub async fn run(&self, mut shutdown: ShutdownToken) {
        loop {
            tokio::select! {
                _ = tokio::time::sleep(self.heartbeat_interval) => {
                    self.tick().await;
                }
                _ = shutdown.wait() => {
                    info!("agent lifecycle loop shutting down");
                    return;
                }
            }
            if shutdown.is_shutdown() {
                return;
            }
        }
    }

    /// One heartbeat attempt, public so callers (and tests) can drive the
    /// loop manually instead of waiting out `heartbeat_interval`.
    pub async fn tick(&self) {
        let readiness = self.evaluator.evaluate().await;
        let request = HeartbeatRequest {
            timestamp: 0,
            ready_for_ai: readiness.ready_for_ai,
            readiness_score: readiness.readiness_score,
            idle_state: readiness.idle_state,
            power_state: readiness.power_state,
            current_resources: readiness.current_resources,
            compute_limits: readiness.compute_limits,
            health_status: if readiness.ready_for_ai { "healthy" } else { "degraded" }.to_string(),
        };

        match self.hub_client.heartbeat(request).await {
            Ok(HeartbeatOutcome::Accepted) => {
                self.consecutive_failures.store(0, Ordering::SeqCst);
            }
            Ok(HeartbeatOutcome::UnknownNode) | Err(_) => {
                let failures = self.consecutive_failures.fetch_add(1, Ordering::SeqCst) + 1;
                warn!(node_id = %self.node_id, failures, "heartbeat failed");
                if failures >= CONSECUTIVE_FAILURE_THRESHOLD {
                    warn!(node_id = %self.node_id, "re-registering after consecutive heartbeat failures");
                    if self.register().await.is_err() {
                        warn!(node_id = %self.node_id, "re-registration attempt failed, will retry next tick");
                    } else {
                        self.consecutive_failures.store(0, Ordering::SeqCst);
                    }
                }
            }
        }
    }
}
