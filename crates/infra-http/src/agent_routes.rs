//! Agent Control Endpoint (C5, §4.5) - axum router exposing the five
//! read operations plus `execute`.

use std::sync::Arc;
use std::time::Instant;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use tracing::{info, warn};

use sparenet_core::domain::{Capability, NodeId};
use sparenet_core::port::{ExecuteRequest, ExecuteResponse, HealthDetail, HealthStatus, TaskExecutor};
use sparenet_core::application::{ReadinessEvaluator, TaskStatsTracker};

pub struct AgentRouterConfig {
    pub capabilities: Vec<Capability>,
    pub max_concurrent_tasks: i64,
}

pub struct AgentAppState {
    pub node_id: NodeId,
    pub evaluator: Arc<ReadinessEvaluator>,
    pub executor: Arc<dyn TaskExecutor>,
    pub task_stats: Arc<TaskStatsTracker>,
    pub time_provider: Arc<dyn sparenet_core::port::TimeProvider>,
    pub started_at_millis: i64,
    pub config: AgentRouterConfig,
}

pub fn router(state: Arc<AgentAppState>) -> Router {
    Router::new()
        .route("/health", get(get_health))
        .route("/health/detailed", get(get_health_detailed))
        .route("/ai-readiness", get(get_readiness))
        .route("/ping", get(get_ping))
        .route("/capabilities", get(get_capabilities))
        .route("/tasks/execute", post(post_execute))
        .with_state(state)
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    id: NodeId,
}

/// §4.5: `health()` is the simple liveness probe - `{status: ok, id}`. The
/// criticality label belongs to `health_detailed`, not here.
async fn get_health(State(state): State<Arc<AgentAppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        id: state.node_id.clone(),
    })
}

async fn get_health_detailed(State(state): State<Arc<AgentAppState>>) -> Json<HealthDetail> {
    let readiness = state.evaluator.evaluate().await;
    let status = overall_status(readiness.current_resources.cpu_usage_percent, readiness.current_resources.memory_usage_percent);
    let uptime_seconds = (state.time_provider.now_millis() - state.started_at_millis) / 1000;
    Json(HealthDetail {
        readiness,
        uptime_seconds,
        status,
        task_stats: state.task_stats.snapshot(),
        system_info: state.evaluator.system_info(),
    })
}

async fn get_readiness(
    State(state): State<Arc<AgentAppState>>,
) -> Json<sparenet_core::domain::ReadinessSnapshot> {
    Json(state.evaluator.evaluate().await)
}

#[derive(Serialize)]
struct PingResponse {
    ok: bool,
    server_time: i64,
}

async fn get_ping(State(state): State<Arc<AgentAppState>>) -> Json<PingResponse> {
    Json(PingResponse {
        ok: true,
        server_time: state.time_provider.now_millis(),
    })
}

#[derive(Serialize)]
struct CapabilitiesResponse {
    capabilities: Vec<Capability>,
    max_concurrent_tasks: i64,
    ready_for_ai: bool,
    readiness_score: i32,
    gpu_available: bool,
    power_state: sparenet_core::domain::PowerState,
}

async fn get_capabilities(State(state): State<Arc<AgentAppState>>) -> Json<CapabilitiesResponse> {
    let readiness = state.evaluator.evaluate().await;
    Json(CapabilitiesResponse {
        capabilities: state.config.capabilities.clone(),
        max_concurrent_tasks: state.config.max_concurrent_tasks,
        ready_for_ai: readiness.ready_for_ai,
        readiness_score: readiness.readiness_score,
        gpu_available: readiness.current_resources.gpu_available,
        power_state: readiness.power_state,
    })
}

async fn post_execute(
    State(state): State<Arc<AgentAppState>>,
    Json(request): Json<ExecuteRequest>,
) -> (StatusCode, Json<ExecuteResponse>) {
    let readiness = state.evaluator.evaluate().await;
    if !readiness.ready_for_ai {
        warn!(task_id = %request.task.id, "rejecting execute: not ready for AI compute");
        return (
            StatusCode::OK,
            Json(ExecuteResponse::Rejected {
                error: "node not ready for AI compute".to_string(),
                readiness_score: readiness.readiness_score,
                recommendations: readiness.recommendations,
            }),
        );
    }

    let started = Instant::now();
    let response = match state
        .executor
        .execute(&request.task.payload, &readiness.compute_limits)
        .await
    {
        Ok(outcome) => {
            let duration_ms = started.elapsed().as_millis() as i64;
            state.task_stats.record(true, duration_ms);
            info!(task_id = %request.task.id, duration_ms, "task completed");
            ExecuteResponse::Completed {
                result: outcome.result,
                duration_ms,
                compute_limits_used: readiness.compute_limits,
            }
        }
        Err(err) => {
            let duration_ms = started.elapsed().as_millis() as i64;
            state.task_stats.record(false, duration_ms);
            warn!(task_id = %request.task.id, error = %err, "task execution failed");
            ExecuteResponse::Failed {
                error: err.to_string(),
                duration_ms,
                compute_limits_used: readiness.compute_limits,
            }
        }
    };
    (StatusCode::OK, Json(response))
}

/// Grounded in the original source's `_get_overall_status`: cpu/mem > 90%
/// is critical, > 70% is a warning, otherwise healthy.
fn overall_status(cpu_usage_percent: f32, memory_usage_percent: f32) -> HealthStatus {
    if cpu_usage_percent > 90.0 || memory_usage_percent > 90.0 {
        HealthStatus::Critical
    } else if cpu_usage_percent > 70.0 || memory_usage_percent > 70.0 {
        HealthStatus::Warning
    } else {
        HealthStatus::Healthy
    }
}
