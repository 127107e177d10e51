//! Scheduler Core (C9, §4.9) - picks the best ready agent for one task and
//! dispatches it, grounded step-for-step in the original source's
//! `_select_optimal_ai_node` / `_node_meets_requirements` / `_send_task_to_node`.

use tracing::{info, warn};

use crate::domain::{NodeId, TaskRecord};
use crate::port::{AgentClient, AiComputeContext, ExecuteRequest, ExecuteResponse};

use super::readiness_cache::ReadinessCache;
use super::registry::NodeRegistry;
use super::task_store::TaskStore;

/// Readiness is refetched synchronously when the cache entry is missing or
/// older than this (§4.9 step 1: "short deadline ~10s" governs the fetch
/// itself; this bounds how old a *cached hit* may be before it's distrusted).
const CANDIDATE_FRESHNESS_SECONDS: i64 = 30;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchedulingOutcome {
    Dispatched { node_id: NodeId, completed: bool },
    Rejected { node_id: NodeId },
    NoSuitableNode,
}

struct Candidate {
    node_id: NodeId,
    score: i32,
    gpu_available: bool,
    current_load: i64,
    max_concurrent_tasks: i64,
}

pub struct Scheduler {
    registry: std::sync::Arc<NodeRegistry>,
    cache: std::sync::Arc<ReadinessCache>,
    tasks: std::sync::Arc<TaskStore>,
    agent_client: std::sync::Arc<dyn AgentClient>,
    time_provider: std::sync::Arc<dyn crate::port::TimeProvider>,
    cache_ttl_seconds: i64,
}

impl Scheduler {
    pub fn new(
        registry: std::sync::Arc<NodeRegistry>,
        cache: std::sync::Arc<ReadinessCache>,
        tasks: std::sync::Arc<TaskStore>,
        agent_client: std::sync::Arc<dyn AgentClient>,
        time_provider: std::sync::Arc<dyn crate::port::TimeProvider>,
    ) -> Self {
        Self {
            registry,
            cache,
            tasks,
            agent_client,
            time_provider,
            cache_ttl_seconds: CANDIDATE_FRESHNESS_SECONDS,
        }
    }

    pub fn with_cache_ttl(mut self, seconds: i64) -> Self {
        self.cache_ttl_seconds = seconds;
        self
    }

    pub async fn dispatch(&self, task: &TaskRecord) -> SchedulingOutcome {
        let candidates = self.gather_candidates().await;
        let sorted = sort_candidates(candidates);

        let chosen = sorted
            .iter()
            .find(|c| meets_requirements(c, task))
            .or_else(|| sorted.first());

        let Some(candidate) = chosen else {
            return SchedulingOutcome::NoSuitableNode;
        };
        let node_id = candidate.node_id.clone();

        match self.tasks.try_start(&task.id, &node_id) {
            Ok(true) => {}
            Ok(false) => return SchedulingOutcome::NoSuitableNode,
            Err(err) => {
                warn!(task_id = %task.id, error = %err, "task start transition failed");
                return SchedulingOutcome::NoSuitableNode;
            }
        }
        match self.registry.try_reserve(&node_id) {
            Ok(true) => {}
            Ok(false) | Err(_) => {
                let _ = self.tasks.requeue(&task.id);
                return SchedulingOutcome::NoSuitableNode;
            }
        }

        let now = self.time_provider.now_millis();
        let request = ExecuteRequest {
            task: task.clone(),
            ai_compute_context: AiComputeContext {
                readiness_score: candidate.score,
                scheduled_at: now,
                power_aware: true,
            },
        };

        info!(task_id = %task.id, node_id = %node_id, "dispatching task");
        match self.agent_client.execute(&node_id, request).await {
            Ok(ExecuteResponse::Completed { .. }) => {
                let _ = self.tasks.complete(&task.id);
                self.registry.release(&node_id);
                SchedulingOutcome::Dispatched {
                    node_id,
                    completed: true,
                }
            }
            Ok(ExecuteResponse::Failed { error, .. }) => {
                warn!(task_id = %task.id, node_id = %node_id, error, "agent reported task failure");
                let _ = self.tasks.fail(&task.id);
                self.registry.release(&node_id);
                SchedulingOutcome::Dispatched {
                    node_id,
                    completed: false,
                }
            }
            Ok(ExecuteResponse::Rejected { error, .. }) => {
                warn!(task_id = %task.id, node_id = %node_id, error, "agent rejected task");
                let _ = self.tasks.requeue(&task.id);
                self.registry.release(&node_id);
                self.cache.remove(&node_id);
                SchedulingOutcome::Rejected { node_id }
            }
            Err(err) => {
                warn!(task_id = %task.id, node_id = %node_id, error = %err, "transport error dispatching task");
                let _ = self.tasks.requeue(&task.id);
                self.registry.release(&node_id);
                self.cache.remove(&node_id);
                SchedulingOutcome::Rejected { node_id }
            }
        }
    }

    async fn gather_candidates(&self) -> Vec<Candidate> {
        let now = self.time_provider.now_millis() / 1000;
        let mut candidates = Vec::new();
        for node in self.registry.online_nodes() {
            let snapshot = match self
                .cache
                .get_fresh(&node.id, now, self.cache_ttl_seconds)
            {
                Some(snapshot) => snapshot,
                None => match self.agent_client.fetch_readiness(&node.id).await {
                    Ok(snapshot) => {
                        self.cache.put(node.id.clone(), snapshot.clone(), now);
                        snapshot
                    }
                    Err(err) => {
                        warn!(node_id = %node.id, error = %err, "readiness fetch failed, excluding from candidates");
                        continue;
                    }
                },
            };
            if !snapshot.ready_for_ai {
                continue;
            }
            candidates.push(Candidate {
                node_id: node.id.clone(),
                score: snapshot.readiness_score,
                gpu_available: snapshot.current_resources.gpu_available,
                current_load: node.current_load,
                max_concurrent_tasks: node.max_concurrent_tasks,
            });
        }
        candidates
    }
}

fn sort_candidates(mut candidates: Vec<Candidate>) -> Vec<Candidate> {
    candidates.sort_by(|a, b| {
        b.score
            .cmp(&a.score)
            .then(a.current_load.cmp(&b.current_load))
            .then(a.node_id.cmp(&b.node_id))
    });
    candidates
}

fn meets_requirements(candidate: &Candidate, task: &TaskRecord) -> bool {
    candidate.score >= 60
        && (!task.task_type.requires_gpu() || candidate.gpu_available)
        && candidate.current_load < candidate.max_concurrent_tasks
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        Capability, ComputeLimits, CurrentResources, IdleState, NodeRecord, PowerState,
        ReadinessSnapshot, TaskType,
    };
    use crate::port::agent_client::mocks::MockAgentClient;
    use crate::port::TimeProvider;
    use std::sync::atomic::AtomicI64;
    use std::sync::Arc;

    struct FakeTime(AtomicI64);

    impl TimeProvider for FakeTime {
        fn now_millis(&self) -> i64 {
            self.0.load(std::sync::atomic::Ordering::SeqCst)
        }
    }

    fn snapshot(score: i32, gpu: bool) -> ReadinessSnapshot {
        ReadinessSnapshot {
            ready_for_ai: score >= 60,
            readiness_score: score,
            idle_state: IdleState {
                is_idle: true,
                idle_duration_seconds: 1000,
                user_active: false,
                last_activity_at: 0,
            },
            power_state: PowerState {
                on_battery: false,
                battery_level_percent: 100.0,
                power_plugged: true,
                time_left_seconds: None,
            },
            compute_limits: ComputeLimits {
                max_cpu_usage_percent: 90.0,
                max_memory_usage_percent: 90.0,
                max_concurrent_tasks: 5,
            },
            current_resources: CurrentResources {
                cpu_usage_percent: 1.0,
                memory_usage_percent: 1.0,
                gpu_available: gpu,
            },
            recommendations: vec![],
        }
    }

    fn setup() -> (
        Arc<NodeRegistry>,
        Arc<ReadinessCache>,
        Arc<TaskStore>,
        Arc<MockAgentClient>,
        Scheduler,
    ) {
        let time = Arc::new(FakeTime(AtomicI64::new(0)));
        let registry = Arc::new(NodeRegistry::new(time.clone()));
        let cache = Arc::new(ReadinessCache::new());
        let tasks = Arc::new(TaskStore::new());
        let agent_client = Arc::new(MockAgentClient::new());
        let scheduler = Scheduler::new(
            registry.clone(),
            cache.clone(),
            tasks.clone(),
            agent_client.clone(),
            time,
        );
        (registry, cache, tasks, agent_client, scheduler)
    }

    fn node(id: &str, max: i64) -> NodeRecord {
        NodeRecord::new(
            id.to_string(),
            "127.0.0.1".to_string(),
            8100,
            vec![Capability::Inference],
            max,
            0,
        )
    }

    fn task(id: &str, task_type: &str) -> TaskRecord {
        TaskRecord::new(
            id.to_string(),
            TaskType::new(task_type),
            0,
            0,
            serde_json::json!({}),
        )
    }

    #[tokio::test]
    async fn scenario_3_picks_highest_score_then_evicts_on_reject() {
        let (registry, cache, tasks, agent_client, scheduler) = setup();
        registry.register(node("a", 5));
        registry.register(node("b", 5));
        registry.register(node("c", 5));
        cache.put("a".into(), snapshot(72, false), 0);
        cache.put("b".into(), snapshot(90, false), 0);
        cache.put("c".into(), snapshot(85, false), 0);
        agent_client.set_execute_response(
            "b".into(),
            ExecuteResponse::Rejected {
                error: "busy".into(),
                readiness_score: 90,
                recommendations: vec![],
            },
        );
        agent_client.set_execute_response(
            "c".into(),
            ExecuteResponse::Completed {
                result: serde_json::json!({}),
                duration_ms: 10,
                compute_limits_used: ComputeLimits {
                    max_cpu_usage_percent: 90.0,
                    max_memory_usage_percent: 90.0,
                    max_concurrent_tasks: 5,
                },
            },
        );

        let t = task("t1", "text-generation");
        tasks.submit(t.clone());
        let outcome = scheduler.dispatch(&t).await;
        assert_eq!(outcome, SchedulingOutcome::Rejected { node_id: "b".into() });
        assert!(cache.get("b").is_none());

        let t = tasks.get("t1").unwrap();
        let outcome = scheduler.dispatch(&t).await;
        assert_eq!(
            outcome,
            SchedulingOutcome::Dispatched {
                node_id: "c".into(),
                completed: true
            }
        );
    }

    #[tokio::test]
    async fn scenario_4_gpu_requirement_prefers_gpu_node() {
        let (registry, cache, tasks, agent_client, scheduler) = setup();
        registry.register(node("d", 5));
        registry.register(node("e", 5));
        cache.put("d".into(), snapshot(95, false), 0);
        cache.put("e".into(), snapshot(70, true), 0);
        agent_client.set_execute_response(
            "e".into(),
            ExecuteResponse::Completed {
                result: serde_json::json!({}),
                duration_ms: 5,
                compute_limits_used: ComputeLimits {
                    max_cpu_usage_percent: 90.0,
                    max_memory_usage_percent: 90.0,
                    max_concurrent_tasks: 5,
                },
            },
        );

        let t = task("t2", "gpu_inference");
        tasks.submit(t.clone());
        let outcome = scheduler.dispatch(&t).await;
        assert_eq!(
            outcome,
            SchedulingOutcome::Dispatched {
                node_id: "e".into(),
                completed: true
            }
        );
    }

    #[tokio::test]
    async fn scenario_4_fallback_when_gpu_node_at_capacity() {
        let (registry, cache, tasks, agent_client, scheduler) = setup();
        registry.register(node("d", 5));
        registry.register(node("e", 1));
        cache.put("d".into(), snapshot(95, false), 0);
        cache.put("e".into(), snapshot(70, true), 0);
        assert!(registry.try_reserve("e").unwrap()); // e is now at capacity
        agent_client.set_execute_response(
            "d".into(),
            ExecuteResponse::Rejected {
                error: "no gpu".into(),
                readiness_score: 95,
                recommendations: vec![],
            },
        );

        let t = task("t3", "gpu_inference");
        tasks.submit(t.clone());
        let outcome = scheduler.dispatch(&t).await;
        assert_eq!(outcome, SchedulingOutcome::Rejected { node_id: "d".into() });
        assert_eq!(tasks.get("t3").unwrap().status, crate::domain::TaskStatus::Pending);
    }

    #[tokio::test]
    async fn no_online_nodes_yields_no_suitable_node() {
        let (_registry, _cache, tasks, _agent_client, scheduler) = setup();
        let t = task("t4", "text-generation");
        tasks.submit(t.clone());
        let outcome = scheduler.dispatch(&t).await;
        assert_eq!(outcome, SchedulingOutcome::NoSuitableNode);
    }
}
