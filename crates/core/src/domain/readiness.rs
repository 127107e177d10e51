//! Readiness snapshot (§3) - produced by the Readiness Evaluator (C4), cached
//! by the Readiness Cache (C8).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IdleState {
    pub is_idle: bool,
    pub idle_duration_seconds: i64,
    pub user_active: bool,
    pub last_activity_at: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PowerState {
    pub on_battery: bool,
    pub battery_level_percent: f32,
    pub power_plugged: bool,
    pub time_left_seconds: Option<i64>,
}

impl PowerState {
    /// §3: `should_throttle ≡ on_battery ∧ battery_level < 20`.
    pub fn should_throttle(&self) -> bool {
        self.on_battery && self.battery_level_percent < 20.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ComputeLimits {
    pub max_cpu_usage_percent: f32,
    pub max_memory_usage_percent: f32,
    pub max_concurrent_tasks: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CurrentResources {
    pub cpu_usage_percent: f32,
    pub memory_usage_percent: f32,
    pub gpu_available: bool,
}

/// Static system facts (§4.5 `health_detailed`), grounded in the original
/// source's `_get_system_info`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemInfo {
    pub cpu_count: usize,
    pub memory_total_bytes: u64,
    pub boot_time_unix_seconds: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReadinessSnapshot {
    pub ready_for_ai: bool,
    pub readiness_score: i32,
    pub idle_state: IdleState,
    pub power_state: PowerState,
    pub compute_limits: ComputeLimits,
    pub current_resources: CurrentResources,
    pub recommendations: Vec<String>,
}

impl ReadinessSnapshot {
    /// §3 invariant: `ready_for_ai = (readiness_score ≥ 60) ∧ ¬should_throttle`.
    pub fn is_consistent(&self) -> bool {
        let expected = self.readiness_score >= 60 && !self.power_state.should_throttle();
        self.ready_for_ai == expected
            && (0..=100).contains(&self.readiness_score)
    }
}
