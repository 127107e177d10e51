//! Node record (§3) - one entry per registered agent, owned by the Node Registry (C7).

use serde::{Deserialize, Serialize};

use super::readiness::{PowerState, ReadinessSnapshot};

pub type NodeId = String;

/// Capability tags an agent can declare. A closed set: an unknown tag is a
/// deserialization error rather than a silently-ignored string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Capability {
    Inference,
    TextGeneration,
    IdleDetection,
    PowerManagement,
    AiComputeReadiness,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeStatus {
    Online,
    Offline,
}

impl std::fmt::Display for NodeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NodeStatus::Online => write!(f, "ONLINE"),
            NodeStatus::Offline => write!(f, "OFFLINE"),
        }
    }
}

/// Node record, owned exclusively by the registry. Handed to other
/// components only as an immutable clone.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeRecord {
    pub id: NodeId,
    pub host: String,
    pub port: u16,
    pub capabilities: Vec<Capability>,
    pub max_concurrent_tasks: i64,
    pub status: NodeStatus,
    pub last_heartbeat_at: i64,
    pub last_health: Option<ReadinessSnapshot>,
    pub current_load: i64,
}

impl NodeRecord {
    /// Construct a freshly-registered node: `offline` until the first
    /// successful heartbeat (§3 invariant).
    pub fn new(
        id: impl Into<String>,
        host: impl Into<String>,
        port: u16,
        capabilities: Vec<Capability>,
        max_concurrent_tasks: i64,
        registered_at: i64,
    ) -> Self {
        Self {
            id: id.into(),
            host: host.into(),
            port,
            capabilities,
            max_concurrent_tasks,
            status: NodeStatus::Offline,
            last_heartbeat_at: registered_at,
            last_health: None,
            current_load: 0,
        }
    }

    pub fn has_capability(&self, cap: Capability) -> bool {
        self.capabilities.contains(&cap)
    }

    pub fn has_capacity(&self) -> bool {
        self.current_load < self.max_concurrent_tasks
    }

    pub fn power_state(&self) -> Option<&PowerState> {
        self.last_health.as_ref().map(|s| &s.power_state)
    }
}
