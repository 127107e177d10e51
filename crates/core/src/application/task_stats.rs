//! Bounded task-history tracker backing the agent's `health_detailed`
//! `task_stats` field (§4.5), grounded in the original source's
//! `HealthMonitor.task_history` (a 1000-entry ring buffer) but capped
//! smaller, since an agent only needs recent-enough stats, not full history.

use std::collections::VecDeque;
use std::sync::Mutex;

use crate::port::agent_client::TaskStats;

const MAX_HISTORY: usize = 200;

struct Entry {
    completed: bool,
    duration_ms: i64,
}

pub struct TaskStatsTracker {
    history: Mutex<VecDeque<Entry>>,
}

impl TaskStatsTracker {
    pub fn new() -> Self {
        Self {
            history: Mutex::new(VecDeque::with_capacity(MAX_HISTORY)),
        }
    }

    pub fn record(&self, completed: bool, duration_ms: i64) {
        let mut history = self.history.lock().unwrap();
        if history.len() >= MAX_HISTORY {
            history.pop_front();
        }
        history.push_back(Entry {
            completed,
            duration_ms,
        });
    }

    pub fn snapshot(&self) -> TaskStats {
        let history = self.history.lock().unwrap();
        let total = history.len() as u64;
        if total == 0 {
            return TaskStats::default();
        }
        let completed = history.iter().filter(|e| e.completed).count() as u64;
        let failed = total - completed;
        let completed_durations: Vec<i64> = history
            .iter()
            .filter(|e| e.completed)
            .map(|e| e.duration_ms)
            .collect();
        let avg_duration_ms = if completed_durations.is_empty() {
            0.0
        } else {
            completed_durations.iter().sum::<i64>() as f64 / completed_durations.len() as f64
        };
        TaskStats {
            total_tasks: total,
            completed_tasks: completed,
            failed_tasks: failed,
            success_rate_percent: completed as f64 / total as f64 * 100.0,
            avg_duration_ms,
        }
    }
}

impl Default for TaskStatsTracker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_history_reports_zeros() {
        let tracker = TaskStatsTracker::new();
        let stats = tracker.snapshot();
        assert_eq!(stats.total_tasks, 0);
        assert_eq!(stats.success_rate_percent, 0.0);
    }

    #[test]
    fn success_rate_and_avg_duration() {
        let tracker = TaskStatsTracker::new();
        tracker.record(true, 100);
        tracker.record(true, 300);
        tracker.record(false, 0);
        let stats = tracker.snapshot();
        assert_eq!(stats.total_tasks, 3);
        assert_eq!(stats.completed_tasks, 2);
        assert_eq!(stats.failed_tasks, 1);
        assert!((stats.success_rate_percent - 66.666).abs() < 0.01);
        assert_eq!(stats.avg_duration_ms, 200.0);
    }

    #[test]
    fn history_is_bounded() {
        let tracker = TaskStatsTracker::new();
        for _ in 0..(MAX_HISTORY + 50) {
            tracker.record(true, 1);
        }
        let stats = tracker.snapshot();
        assert_eq!(stats.total_tasks, MAX_HISTORY as u64);
    }
}
