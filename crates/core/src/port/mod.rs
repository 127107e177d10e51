// Port Layer - Interfaces for external dependencies

pub mod activity_probe;
pub mod agent_client;
pub mod hub_client;
pub mod id_provider;
pub mod power_probe;
pub mod resource_probe;
pub mod task_executor;
pub mod time_provider;

pub use activity_probe::ActivityProbe;
pub use agent_client::{
    AgentClient, AgentClientError, AiComputeContext, ExecuteRequest, ExecuteResponse, HealthDetail,
    HealthStatus, TaskStats,
};
pub use hub_client::{HeartbeatOutcome, HeartbeatRequest, HubClient, HubClientError, RegisterRequest};
pub use id_provider::IdProvider;
pub use power_probe::PowerProbe;
pub use resource_probe::ResourceProbe;
pub use task_executor::{ExecutionError, ExecutionOutcome, TaskExecutor};
pub use time_provider::TimeProvider;
