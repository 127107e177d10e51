// Sparenet Infra-HTTP - axum routers for the hub/agent control planes and
// reqwest-based adapters for the HubClient/AgentClient ports.

pub mod agent_client_impl;
pub mod agent_routes;
pub mod hub_client_impl;
pub mod hub_routes;

pub use agent_client_impl::{AgentClientImpl, Deadlines as AgentClientDeadlines};
pub use agent_routes::{AgentAppState, AgentRouterConfig};
pub use hub_client_impl::HubClientImpl;
pub use hub_routes::HubAppState;
