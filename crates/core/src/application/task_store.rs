//! Task index (part of C7, §4.7) - in-memory `id -> task_record` map plus
//! the pending-list ordering the Task Queue Driver (C11) consumes.

use std::collections::HashMap;
use std::sync::RwLock;

use crate::domain::{DomainError, NodeId, TaskId, TaskRecord, TaskStatus};

pub struct TaskStore {
    tasks: RwLock<HashMap<TaskId, TaskRecord>>,
}

impl TaskStore {
    pub fn new() -> Self {
        Self {
            tasks: RwLock::new(HashMap::new()),
        }
    }

    pub fn submit(&self, task: TaskRecord) {
        self.tasks.write().unwrap().insert(task.id.clone(), task);
    }

    pub fn get(&self, task_id: &str) -> Option<TaskRecord> {
        self.tasks.read().unwrap().get(task_id).cloned()
    }

    /// Pending tasks sorted `(priority desc, created_at asc)` per §4.9's
    /// intake paragraph.
    pub fn list_pending(&self) -> Vec<TaskRecord> {
        let mut pending: Vec<TaskRecord> = self
            .tasks
            .read()
            .unwrap()
            .values()
            .filter(|t| t.status == TaskStatus::Pending)
            .cloned()
            .collect();
        pending.sort_by(|a, b| {
            b.priority
                .cmp(&a.priority)
                .then(a.created_at.cmp(&b.created_at))
        });
        pending
    }

    /// Atomically transitions a task from `pending` to `running` assigned to
    /// `node_id`, or returns `Ok(false)` if it was no longer pending (already
    /// claimed by a concurrent drain tick - §9 Open Question, resolved here
    /// by making the transition the single source of truth for ownership).
    pub fn try_start(&self, task_id: &str, node_id: &NodeId) -> Result<bool, DomainError> {
        let mut tasks = self.tasks.write().unwrap();
        let task = tasks
            .get_mut(task_id)
            .ok_or_else(|| DomainError::TaskNotFound(task_id.to_string()))?;
        if task.status != TaskStatus::Pending {
            return Ok(false);
        }
        task.start(node_id.clone())?;
        Ok(true)
    }

    pub fn complete(&self, task_id: &str) -> Result<(), DomainError> {
        let mut tasks = self.tasks.write().unwrap();
        let task = tasks
            .get_mut(task_id)
            .ok_or_else(|| DomainError::TaskNotFound(task_id.to_string()))?;
        task.complete()
    }

    pub fn fail(&self, task_id: &str) -> Result<(), DomainError> {
        let mut tasks = self.tasks.write().unwrap();
        let task = tasks
            .get_mut(task_id)
            .ok_or_else(|| DomainError::TaskNotFound(task_id.to_string()))?;
        task.fail()
    }

    /// Reverts a task to `pending`, clearing its node assignment - used on
    /// agent rejection, transport error, or the offline-sweep requeue.
    pub fn requeue(&self, task_id: &str) -> Result<(), DomainError> {
        let mut tasks = self.tasks.write().unwrap();
        let task = tasks
            .get_mut(task_id)
            .ok_or_else(|| DomainError::TaskNotFound(task_id.to_string()))?;
        task.requeue();
        Ok(())
    }

    /// Requeues every `running` task assigned to `node_id` - called by the
    /// offline sweep (§4.7).
    pub fn requeue_all_for_node(&self, node_id: &str) -> Vec<TaskId> {
        let mut tasks = self.tasks.write().unwrap();
        let mut requeued = Vec::new();
        for task in tasks.values_mut() {
            if task.status == TaskStatus::Running
                && task.assigned_node_id.as_deref() == Some(node_id)
            {
                task.requeue();
                requeued.push(task.id.clone());
            }
        }
        requeued
    }
}

impl Default for TaskStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::TaskType;

    fn task(id: &str, priority: i32, created_at: i64) -> TaskRecord {
        TaskRecord::new(
            id.to_string(),
            TaskType::new("text-generation"),
            priority,
            created_at,
            serde_json::json!({}),
        )
    }

    #[test]
    fn pending_list_sorted_by_priority_then_age() {
        let store = TaskStore::new();
        store.submit(task("a", 1, 100));
        store.submit(task("b", 5, 200));
        store.submit(task("c", 5, 50));
        let pending = store.list_pending();
        let ids: Vec<_> = pending.iter().map(|t| t.id.clone()).collect();
        assert_eq!(ids, vec!["c", "b", "a"]);
    }

    #[test]
    fn try_start_is_exclusive() {
        let store = TaskStore::new();
        store.submit(task("a", 1, 0));
        assert!(store.try_start("a", &"node-1".to_string()).unwrap());
        assert!(!store.try_start("a", &"node-2".to_string()).unwrap());
    }

    #[test]
    fn requeue_all_for_node_only_touches_running_tasks_there() {
        let store = TaskStore::new();
        store.submit(task("a", 1, 0));
        store.submit(task("b", 1, 0));
        store.try_start("a", &"node-1".to_string()).unwrap();
        store.try_start("b", &"node-2".to_string()).unwrap();
        let requeued = store.requeue_all_for_node("node-1");
        assert_eq!(requeued, vec!["a".to_string()]);
        assert_eq!(store.get("a").unwrap().status, TaskStatus::Pending);
        assert_eq!(store.get("b").unwrap().status, TaskStatus::Running);
    }
}
