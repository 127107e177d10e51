//! Sparenet Hub - central coordinator: node registry, readiness cache,
//! scheduler core and the external HTTP API agents/clients talk to.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use sparenet_core::application::{
    shutdown_channel, HealthPoller, NodeRegistry, ReadinessCache, Scheduler, TaskDriver, TaskStore,
};
use sparenet_core::port::id_provider::UuidProvider;
use sparenet_core::port::time_provider::SystemTimeProvider;
use sparenet_infra_http::{hub_routes, AgentClientDeadlines, AgentClientImpl, HubAppState};

const VERSION: &str = env!("CARGO_PKG_VERSION");
const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const SWEEP_INTERVAL: Duration = Duration::from_secs(10);
const CACHE_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();
    info!("sparenet-hub v{} starting...", VERSION);

    let bind_addr =
        std::env::var("HUB_BIND_ADDR").unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string());
    let heartbeat_timeout_seconds = env_parse("HEARTBEAT_TIMEOUT", 60);
    let readiness_cache_ttl_seconds = env_parse("READINESS_CACHE_TTL", 30);

    let time_provider = Arc::new(SystemTimeProvider);
    let id_provider = Arc::new(UuidProvider);
    let registry = Arc::new(
        NodeRegistry::new(time_provider.clone()).with_heartbeat_timeout(heartbeat_timeout_seconds),
    );
    let cache = Arc::new(ReadinessCache::new());
    let tasks = Arc::new(TaskStore::new());

    let agent_client = {
        let registry = registry.clone();
        Arc::new(AgentClientImpl::new(
            AgentClientDeadlines::default(),
            move |node_id| {
                registry
                    .get(node_id)
                    .map(|record| format!("http://{}:{}", record.host, record.port))
            },
        ))
    };

    let scheduler = Arc::new(
        Scheduler::new(
            registry.clone(),
            cache.clone(),
            tasks.clone(),
            agent_client.clone(),
            time_provider.clone(),
        )
        .with_cache_ttl(readiness_cache_ttl_seconds),
    );
    let task_driver = Arc::new(TaskDriver::new(tasks.clone(), scheduler.clone()));
    let health_poller = Arc::new(HealthPoller::new(
        registry.clone(),
        cache.clone(),
        agent_client.clone(),
        time_provider.clone(),
    ));

    let (shutdown_tx, shutdown_rx) = shutdown_channel();

    let driver_handle = {
        let task_driver = task_driver.clone();
        let shutdown = shutdown_rx.clone();
        tokio::spawn(async move { task_driver.run(shutdown).await })
    };
    let poller_handle = {
        let health_poller = health_poller.clone();
        let shutdown = shutdown_rx.clone();
        tokio::spawn(async move { health_poller.run(shutdown).await })
    };
    let sweep_handle = {
        let registry = registry.clone();
        let tasks = tasks.clone();
        let mut shutdown = shutdown_rx.clone();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = tokio::time::sleep(SWEEP_INTERVAL) => {
                        for node_id in registry.sweep_stale() {
                            let requeued = tasks.requeue_all_for_node(&node_id);
                            if !requeued.is_empty() {
                                info!(node_id = %node_id, count = requeued.len(), "requeued tasks from swept node");
                            }
                        }
                    }
                    _ = shutdown.wait() => return,
                }
                if shutdown.is_shutdown() {
                    return;
                }
            }
        })
    };
    let _ = CACHE_SWEEP_INTERVAL; // cache entries expire implicitly via get_fresh; no separate sweep task needed

    let state = Arc::new(HubAppState {
        registry: registry.clone(),
        cache: cache.clone(),
        tasks: tasks.clone(),
        id_provider,
        time_provider: time_provider.clone(),
    });
    let app = hub_routes::router(state).layer(tower_http::trace::TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!(bind_addr = %bind_addr, "hub HTTP API listening");

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

    let _ = tokio::time::timeout(Duration::from_secs(5), async {
        let _ = driver_handle.await;
        let _ = poller_handle.await;
        let _ = sweep_handle.await;
    })
    .await;

    info!("hub shutdown complete");
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
