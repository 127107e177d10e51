//! Node Registry (C7, §4.7) - in-memory map of every known agent node.

use std::collections::HashMap;
use std::sync::RwLock;

use tracing::{info, warn};

use crate::domain::{DomainError, NodeId, NodeRecord, NodeStatus};
use crate::port::TimeProvider;

/// A node is swept offline if no heartbeat has arrived within this window
/// (§4.7 "stale node sweep").
const HEARTBEAT_STALE_SECONDS: i64 = 60;

pub struct NodeRegistry {
    nodes: RwLock<HashMap<NodeId, NodeRecord>>,
    time_provider: std::sync::Arc<dyn TimeProvider>,
    heartbeat_timeout_seconds: i64,
}

impl NodeRegistry {
    pub fn new(time_provider: std::sync::Arc<dyn TimeProvider>) -> Self {
        Self {
            nodes: RwLock::new(HashMap::new()),
            time_provider,
            heartbeat_timeout_seconds: HEARTBEAT_STALE_SECONDS,
        }
    }

    pub fn with_heartbeat_timeout(mut self, seconds: i64) -> Self {
        self.heartbeat_timeout_seconds = seconds;
        self
    }

    /// Registers a node, or re-registers an existing one in place (idempotent
    /// per §4.7: a re-register does not reset `current_load`).
    pub fn register(&self, mut record: NodeRecord) {
        let mut nodes = self.nodes.write().unwrap();
        if let Some(existing) = nodes.get(&record.id) {
            record.current_load = existing.current_load;
        }
        record.status = NodeStatus::Online;
        record.last_heartbeat_at = self.time_provider.now_millis() / 1000;
        info!(node_id = %record.id, "node registered");
        nodes.insert(record.id.clone(), record);
    }

    /// Applies a heartbeat to a known node. Returns `NodeNotFound` if the
    /// node never registered (§4.7/§4.9: agent must re-register in that case).
    pub fn heartbeat(
        &self,
        node_id: &str,
        readiness: crate::domain::ReadinessSnapshot,
    ) -> Result<(), DomainError> {
        let mut nodes = self.nodes.write().unwrap();
        let record = nodes
            .get_mut(node_id)
            .ok_or_else(|| DomainError::NodeNotFound(node_id.to_string()))?;
        record.status = NodeStatus::Online;
        record.last_heartbeat_at = self.time_provider.now_millis() / 1000;
        record.last_health = Some(readiness);
        Ok(())
    }

    /// Records a health-poll result without touching `last_heartbeat_at`:
    /// the heartbeat-timeout sweep remains the sole authority for marking a
    /// node offline (§4.10).
    pub fn update_health(
        &self,
        node_id: &str,
        readiness: crate::domain::ReadinessSnapshot,
    ) -> Result<(), DomainError> {
        let mut nodes = self.nodes.write().unwrap();
        let record = nodes
            .get_mut(node_id)
            .ok_or_else(|| DomainError::NodeNotFound(node_id.to_string()))?;
        record.last_health = Some(readiness);
        Ok(())
    }

    pub fn get(&self, node_id: &str) -> Option<NodeRecord> {
        self.nodes.read().unwrap().get(node_id).cloned()
    }

    pub fn all(&self) -> Vec<NodeRecord> {
        self.nodes.read().unwrap().values().cloned().collect()
    }

    pub fn online_nodes(&self) -> Vec<NodeRecord> {
        self.nodes
            .read()
            .unwrap()
            .values()
            .filter(|n| n.status == NodeStatus::Online)
            .cloned()
            .collect()
    }

    /// Atomically increments a node's `current_load` iff it still has
    /// capacity, returning whether the reservation succeeded. This is the
    /// single point of truth for the §9 Open Question on assignment
    /// atomicity: callers must reserve capacity here before dispatching a
    /// task, under the same write lock used by every other mutation.
    pub fn try_reserve(&self, node_id: &str) -> Result<bool, DomainError> {
        let mut nodes = self.nodes.write().unwrap();
        let record = nodes
            .get_mut(node_id)
            .ok_or_else(|| DomainError::NodeNotFound(node_id.to_string()))?;
        if record.has_capacity() {
            record.current_load += 1;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    pub fn release(&self, node_id: &str) {
        let mut nodes = self.nodes.write().unwrap();
        if let Some(record) = nodes.get_mut(node_id) {
            record.current_load = (record.current_load - 1).max(0);
        }
    }

    /// Marks nodes offline whose last heartbeat predates the stale window.
    /// Returns the ids that were just transitioned, so callers (the Task
    /// Queue Driver, §4.11) can requeue any tasks still assigned to them.
    pub fn sweep_stale(&self) -> Vec<NodeId> {
        let now = self.time_provider.now_millis() / 1000;
        let mut nodes = self.nodes.write().unwrap();
        let mut swept = Vec::new();
        for record in nodes.values_mut() {
            if record.status == NodeStatus::Online
                && now - record.last_heartbeat_at > self.heartbeat_timeout_seconds
            {
                record.status = NodeStatus::Offline;
                record.current_load = 0;
                warn!(node_id = %record.id, "node swept offline: stale heartbeat");
                swept.push(record.id.clone());
            }
        }
        swept
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Capability;
    use crate::port::time_provider::SystemTimeProvider;
    use std::sync::atomic::{AtomicI64, Ordering};
    use std::sync::Arc;

    struct FakeTime(AtomicI64);
    impl TimeProvider for FakeTime {
        fn now_millis(&self) -> i64 {
            self.0.load(Ordering::SeqCst)
        }
    }

    fn node(id: &str) -> NodeRecord {
        NodeRecord::new(
            id.to_string(),
            "127.0.0.1".to_string(),
            8100,
            vec![Capability::Inference],
            2,
            0,
        )
    }

    #[test]
    fn register_then_heartbeat_unknown_node_fails() {
        let registry = NodeRegistry::new(Arc::new(SystemTimeProvider));
        let result = registry.heartbeat(
            "missing",
            crate::domain::ReadinessSnapshot {
                ready_for_ai: true,
                readiness_score: 90,
                idle_state: crate::domain::IdleState {
                    is_idle: true,
                    idle_duration_seconds: 1000,
                    user_active: false,
                    last_activity_at: 0,
                },
                power_state: crate::domain::PowerState {
                    on_battery: false,
                    battery_level_percent: 100.0,
                    power_plugged: true,
                    time_left_seconds: None,
                },
                compute_limits: crate::domain::ComputeLimits {
                    max_cpu_usage_percent: 90.0,
                    max_memory_usage_percent: 90.0,
                    max_concurrent_tasks: 5,
                },
                current_resources: crate::domain::CurrentResources {
                    cpu_usage_percent: 1.0,
                    memory_usage_percent: 1.0,
                    gpu_available: false,
                },
                recommendations: vec![],
            },
        );
        assert!(matches!(result, Err(DomainError::NodeNotFound(_))));
    }

    #[test]
    fn re_register_preserves_current_load() {
        let registry = NodeRegistry::new(Arc::new(SystemTimeProvider));
        registry.register(node("n1"));
        assert!(registry.try_reserve("n1").unwrap());
        registry.register(node("n1"));
        let record = registry.get("n1").unwrap();
        assert_eq!(record.current_load, 1);
    }

    #[test]
    fn reserve_fails_at_capacity() {
        let registry = NodeRegistry::new(Arc::new(SystemTimeProvider));
        registry.register(node("n1"));
        assert!(registry.try_reserve("n1").unwrap());
        assert!(registry.try_reserve("n1").unwrap());
        assert!(!registry.try_reserve("n1").unwrap());
        registry.release("n1");
        assert!(registry.try_reserve("n1").unwrap());
    }

    #[test]
    fn sweep_stale_marks_offline_and_zeroes_load() {
        let time = Arc::new(FakeTime(AtomicI64::new(0)));
        let registry = NodeRegistry::new(time.clone());
        registry.register(node("n1"));
        registry.try_reserve("n1").unwrap();
        time.0.store(61_000, Ordering::SeqCst);
        let swept = registry.sweep_stale();
        assert_eq!(swept, vec!["n1".to_string()]);
        let record = registry.get("n1").unwrap();
        assert_eq!(record.status, NodeStatus::Offline);
        assert_eq!(record.current_load, 0);
    }

    #[test]
    fn sweep_stale_leaves_fresh_nodes_online() {
        let time = Arc::new(FakeTime(AtomicI64::new(0)));
        let registry = NodeRegistry::new(time.clone());
        registry.register(node("n1"));
        time.0.store(10, Ordering::SeqCst);
        let swept = registry.sweep_stale();
        assert!(swept.is_empty());
        assert_eq!(registry.get("n1").unwrap().status, NodeStatus::Online);
    }
}
