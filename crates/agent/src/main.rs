//! Sparenet Agent - platform probes, readiness evaluator, hub lifecycle loop
//! and the control endpoint hub/clients talk to.

mod echo_executor;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use sparenet_core::application::{shutdown_channel, AgentLifecycleLoop, ReadinessEvaluator, TaskStatsTracker};
use sparenet_core::domain::Capability;
use sparenet_core::port::time_provider::SystemTimeProvider;
use sparenet_core::port::TimeProvider;
use sparenet_infra_http::{agent_routes, AgentRouterConfig, HubClientImpl};
use sparenet_infra_system::{ActivityProbeImpl, PowerProbeImpl, ResourceProbeImpl};

use echo_executor::EchoExecutor;

const VERSION: &str = env!("CARGO_PKG_VERSION");
const DEFAULT_BIND_ADDR: &str = "0.0.0.0:9000";
const DEFAULT_HUB_URL: &str = "http://127.0.0.1:8080";

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();
    info!("sparenet-agent v{} starting...", VERSION);

    let node_id = std::env::var("AGENT_ID").unwrap_or_else(|_| uuid::Uuid::new_v4().to_string());
    let host = std::env::var("AGENT_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
    let port: u16 = std::env::var("AGENT_PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(9000);
    let bind_addr = std::env::var("AGENT_BIND_ADDR").unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string());
    let hub_url = std::env::var("HUB_URL").unwrap_or_else(|_| DEFAULT_HUB_URL.to_string());
    let heartbeat_interval_seconds = env_parse("HEARTBEAT_INTERVAL", 10);
    let idle_min_seconds = env_parse("IDLE_MIN_SECONDS", 300);
    let idle_cpu_threshold = env_parse("IDLE_CPU_THRESHOLD", 10) as f32;

    let capabilities = vec![
        Capability::Inference,
        Capability::TextGeneration,
        Capability::IdleDetection,
        Capability::PowerManagement,
        Capability::AiComputeReadiness,
    ];
    let max_concurrent_tasks = 2;

    let time_provider = Arc::new(SystemTimeProvider);
    let evaluator = Arc::new(
        ReadinessEvaluator::new(
            Arc::new(PowerProbeImpl),
            Arc::new(ActivityProbeImpl),
            Arc::new(ResourceProbeImpl::new()),
            time_provider.clone(),
        )
        .with_idle_config(idle_min_seconds, idle_cpu_threshold),
    );

    let hub_client = Arc::new(HubClientImpl::new(hub_url.clone(), node_id.clone()));
    let task_stats = Arc::new(TaskStatsTracker::new());
    let executor = Arc::new(EchoExecutor);

    let lifecycle = Arc::new(AgentLifecycleLoop::new(
        node_id.clone(),
        host.clone(),
        port,
        capabilities.clone(),
        max_concurrent_tasks,
        Duration::from_secs(heartbeat_interval_seconds as u64),
        hub_client,
        evaluator.clone(),
    ));

    lifecycle.register().await.context("startup registration with hub failed")?;

    let (shutdown_tx, shutdown_rx) = shutdown_channel();

    let lifecycle_handle = {
        let lifecycle = lifecycle.clone();
        let shutdown = shutdown_rx.clone();
        tokio::spawn(async move { lifecycle.run(shutdown).await })
    };

    let state = Arc::new(agent_routes::AgentAppState {
        node_id: node_id.clone(),
        evaluator,
        executor,
        task_stats,
        time_provider: time_provider.clone(),
        started_at_millis: time_provider.now_millis(),
        config: AgentRouterConfig {
            capabilities,
            max_concurrent_tasks,
        },
    });
    let app = agent_routes::router(state).layer(tower_http::trace::TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!(bind_addr = %bind_addr, node_id = %node_id, "agent control endpoint listening");

    let server = axum::serve(listener, app).with_graceful_shutdown(async move {
        let mut shutdown = shutdown_rx.clone();
        shutdown.wait().await;
    });

    tokio::select! {
        result = server => {
            result.map_err(|e| anyhow::anyhow!("HTTP server error: {e}"))?;
        }
        result = tokio::signal::ctrl_c() => {
            result?;
            info!("shutdown signal received");
            shutdown_tx.shutdown();
        }
    }

    let _ = tokio::time::timeout(Duration::from_secs(5), lifecycle_handle).await;

    info!("agent shutdown complete");
    Ok(())
}

fn env_parse(key: &str, default: i64) -> i64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn init_logging() {
    let log_format = std::env::var("SPARENET_LOG_FORMAT").unwrap_or_else(|_| "pretty".to_string());
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("sparenet=info"))
        .expect("failed to create env filter");

    match log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().pretty())
                .init();
        }
    }
}
