//! Hub's external HTTP surface (§6): node registration/heartbeat consumed by
//! agents, task submission and status consumed by clients.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use sparenet_core::application::{NodeRegistry, ReadinessCache, TaskStore};
use sparenet_core::domain::{NodeRecord, TaskRecord, TaskType};
use sparenet_core::port::{HeartbeatRequest, IdProvider, RegisterRequest, TimeProvider};

pub struct HubAppState {
    pub registry: Arc<NodeRegistry>,
    pub cache: Arc<ReadinessCache>,
    pub tasks: Arc<TaskStore>,
    pub id_provider: Arc<dyn IdProvider>,
    pub time_provider: Arc<dyn TimeProvider>,
}

pub fn router(state: Arc<HubAppState>) -> Router {
    Router::new()
        .route("/nodes/register", post(post_register))
        .route("/nodes/:id/heartbeat", post(post_heartbeat))
        .route("/tasks", post(post_submit_task))
        .route("/nodes", get(get_nodes))
        .route("/status/health", get(get_status_health))
        .route("/metrics", get(get_metrics))
        .with_state(state)
}

async fn post_register(
    State(state): State<Arc<HubAppState>>,
    Json(request): Json<RegisterRequest>,
) -> StatusCode {
    let now = state.time_provider.now_millis() / 1000;
    let record = NodeRecord::new(
        request.id.clone(),
        request.host,
        request.port,
        request.capabilities,
        request.max_concurrent_tasks,
        now,
    );
    state.registry.register(record);
    info!(node_id = %request.id, "node registered via HTTP");
    StatusCode::OK
}

async fn post_heartbeat(
    State(state): State<Arc<HubAppState>>,
    Path(id): Path<String>,
    Json(request): Json<HeartbeatRequest>,
) -> StatusCode {
    let snapshot = sparenet_core::domain::ReadinessSnapshot {
        ready_for_ai: request.ready_for_ai,
        readiness_score: request.readiness_score,
        idle_state: request.idle_state,
        power_state: request.power_state,
        compute_limits: request.compute_limits,
        current_resources: request.current_resources,
        recommendations: vec![],
    };
    let now = state.time_provider.now_millis() / 1000;
    match state.registry.heartbeat(&id, snapshot.clone()) {
        Ok(()) => {
            state.cache.put(id, snapshot, now);
            StatusCode::OK
        }
        Err(_) => {
            warn!(node_id = %id, "heartbeat from unknown node");
            StatusCode::NOT_FOUND
        }
    }
}

#[derive(Deserialize)]
struct SubmitTaskRequest {
    task_type: String,
    #[serde(default)]
    priority: i32,
    #[serde(default = "default_payload")]
    payload: serde_json::Value,
}

fn default_payload() -> serde_json::Value {
    serde_json::json!({})
}

#[derive(Serialize)]
struct SubmitTaskResponse {
    id: String,
}

async fn post_submit_task(
    State(state): State<Arc<HubAppState>>,
    Json(request): Json<SubmitTaskRequest>,
) -> Json<SubmitTaskResponse> {
    let id = state.id_provider.generate_id();
    let now = state.time_provider.now_millis();
    let task = TaskRecord::new(
        id.clone(),
        TaskType::new(request.task_type),
        request.priority,
        now,
        request.payload,
    );
    state.tasks.submit(task);
    Json(SubmitTaskResponse { id })
}

async fn get_nodes(State(state): State<Arc<HubAppState>>) -> Json<Vec<NodeRecord>> {
    Json(state.registry.all())
}

#[derive(Serialize)]
struct StatusHealthResponse {
    online_nodes: usize,
    total_nodes: usize,
}

async fn get_status_health(State(state): State<Arc<HubAppState>>) -> Json<StatusHealthResponse> {
    let all = state.registry.all();
    let online = all
        .iter()
        .filter(|n| n.status == sparenet_core::domain::NodeStatus::Online)
        .count();
    Json(StatusHealthResponse {
        online_nodes: online,
        total_nodes: all.len(),
    })
}

#[derive(Serialize)]
struct MetricsResponse {
    online_nodes: usize,
    total_nodes: usize,
    total_current_load: i64,
}

async fn get_metrics(State(state): State<Arc<HubAppState>>) -> Json<MetricsResponse> {
    let all = state.registry.all();
    let online = all
        .iter()
        .filter(|n| n.status == sparenet_core::domain::NodeStatus::Online)
        .count();
    let total_current_load = all.iter().map(|n| n.current_load).sum();
    Json(MetricsResponse {
        online_nodes: online,
        total_nodes: all.len(),
        total_current_load,
    })
}
