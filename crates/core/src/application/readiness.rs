//! Readiness Evaluator (C4, §4.4) - combines the power/activity/resource
//! probes into a single admission decision and a set of compute caps.

use std::sync::Mutex;

use tracing::debug;

use crate::domain::{CurrentResources, IdleState, PowerState, ReadinessSnapshot};
use crate::port::power_probe::compute_limits_for;
use crate::port::{ActivityProbe, PowerProbe, ResourceProbe, TimeProvider};

const IDLE_MIN_SECONDS_DEFAULT: i64 = 300;
const IDLE_CPU_THRESHOLD_DEFAULT: f32 = 10.0;

/// Idle-session state carried across `evaluate()` calls (§4.4).
struct IdleTracker {
    last_activity_at: i64,
    idle_start_at: Option<i64>,
    currently_idle: bool,
}

impl IdleTracker {
    fn new(now: i64) -> Self {
        Self {
            last_activity_at: now,
            idle_start_at: None,
            currently_idle: false,
        }
    }

    /// Returns `(idle_duration_seconds, currently_idle)`.
    fn observe(
        &mut self,
        now: i64,
        user_active: bool,
        cpu_usage_percent: f32,
        memory_usage_percent: f32,
        idle_cpu_threshold: f32,
        idle_min_seconds: i64,
    ) -> (i64, bool) {
        let low_load = cpu_usage_percent < idle_cpu_threshold && memory_usage_percent < 70.0;

        if user_active {
            self.last_activity_at = now;
            self.idle_start_at = None;
            self.currently_idle = false;
        } else if low_load {
            if self.idle_start_at.is_none() {
                self.idle_start_at = Some(now);
            }
        } else {
            self.idle_start_at = None;
            self.currently_idle = false;
        }

        let idle_duration = self
            .idle_start_at
            .map(|start| now - start)
            .unwrap_or(0)
            .max(0);

        if !self.currently_idle && idle_duration >= idle_min_seconds && self.idle_start_at.is_some()
        {
            self.currently_idle = true;
        }

        (idle_duration, self.currently_idle)
    }
}

/// Readiness Evaluator (C4). One instance per agent; holds the only mutable
/// state in the AI-readiness computation (idle-session tracking).
pub struct ReadinessEvaluator {
    power_probe: std::sync::Arc<dyn PowerProbe>,
    activity_probe: std::sync::Arc<dyn ActivityProbe>,
    resource_probe: std::sync::Arc<dyn ResourceProbe>,
    time_provider: std::sync::Arc<dyn TimeProvider>,
    idle_tracker: Mutex<IdleTracker>,
    idle_min_seconds: i64,
    idle_cpu_threshold: f32,
}

impl ReadinessEvaluator {
    pub fn new(
        power_probe: std::sync::Arc<dyn PowerProbe>,
        activity_probe: std::sync::Arc<dyn ActivityProbe>,
        resource_probe: std::sync::Arc<dyn ResourceProbe>,
        time_provider: std::sync::Arc<dyn TimeProvider>,
    ) -> Self {
        let now = time_provider.now_millis() / 1000;
        Self {
            power_probe,
            activity_probe,
            resource_probe,
            time_provider,
            idle_tracker: Mutex::new(IdleTracker::new(now)),
            idle_min_seconds: IDLE_MIN_SECONDS_DEFAULT,
            idle_cpu_threshold: IDLE_CPU_THRESHOLD_DEFAULT,
        }
    }

    pub fn with_idle_config(mut self, idle_min_seconds: i64, idle_cpu_threshold: f32) -> Self {
        self.idle_min_seconds = idle_min_seconds;
        self.idle_cpu_threshold = idle_cpu_threshold;
        self
    }

    /// Static system facts for `health_detailed` (§4.5), delegated straight
    /// through to the resource probe.
    pub fn system_info(&self) -> crate::domain::SystemInfo {
        self.resource_probe.system_info()
    }

    pub async fn evaluate(&self) -> ReadinessSnapshot {
        let now_seconds = self.time_provider.now_millis() / 1000;
        let user_active = self.activity_probe.user_active().await;
        let power = self.power_probe.sample().await;
        let resources = self.resource_probe.sample().await;

        let (idle_duration_seconds, currently_idle) = {
            let mut tracker = self.idle_tracker.lock().unwrap();
            let (duration, idle) = tracker.observe(
                now_seconds,
                user_active,
                resources.cpu_usage_percent,
                resources.memory_usage_percent,
                self.idle_cpu_threshold,
                self.idle_min_seconds,
            );
            (duration, idle)
        };

        let idle_state = IdleState {
            is_idle: currently_idle,
            idle_duration_seconds,
            user_active,
            last_activity_at: self.idle_tracker.lock().unwrap().last_activity_at,
        };

        let score = score_readiness(&idle_state, &power, &resources);
        let should_throttle = power.should_throttle();
        let ready_for_ai = score >= 60 && !should_throttle;
        let compute_limits = compute_limits_for(&power);
        let recommendations = recommendations_for(score, &idle_state, &power, &resources);

        debug!(
            score,
            ready_for_ai, idle_duration_seconds, "readiness evaluated"
        );

        ReadinessSnapshot {
            ready_for_ai,
            readiness_score: score,
            idle_state,
            power_state: power,
            compute_limits,
            current_resources: resources,
            recommendations,
        }
    }
}

/// Score composition from §4.4's table. Idle, Power and Resources each
/// contribute at most their single best-matching row; the final score is
/// their sum, bounded to [0, 100] by construction (40+30+30 max).
fn score_readiness(idle: &IdleState, power: &PowerState, resources: &CurrentResources) -> i32 {
    let idle_points = if idle.is_idle {
        if idle.idle_duration_seconds > 1800 {
            40
        } else if idle.idle_duration_seconds > 600 {
            30
        } else {
            20
        }
    } else {
        5
    };

    let power_points = if !power.on_battery {
        30
    } else if power.battery_level_percent > 80.0 {
        25
    } else if power.battery_level_percent > 50.0 {
        15
    } else if power.battery_level_percent > 20.0 {
        5
    } else {
        0
    };

    let resource_points = if resources.cpu_usage_percent < 20.0 && resources.memory_usage_percent < 50.0 {
        30
    } else if resources.cpu_usage_percent < 50.0 && resources.memory_usage_percent < 70.0 {
        20
    } else if resources.cpu_usage_percent < 80.0 && resources.memory_usage_percent < 85.0 {
        10
    } else {
        0
    };

    idle_points + power_points + resource_points
}

/// Deterministic recommendation strings, grounded on the original source's
/// `_get_compute_recommendations` (ordering: busyness, idle, power, then
/// resource-specific advice, falling back to a single "ready" message).
fn recommendations_for(
    score: i32,
    idle: &IdleState,
    power: &PowerState,
    resources: &CurrentResources,
) -> Vec<String> {
    let mut out = Vec::new();

    if score < 30 {
        out.push("System is busy - not ideal for AI compute".to_string());
    } else if score < 60 {
        out.push("System has limited availability - light AI tasks only".to_string());
    }

    if !idle.is_idle {
        out.push("Wait for system to be idle for better performance".to_string());
    } else if idle.idle_duration_seconds < 600 {
        out.push("System recently active - monitor for stability".to_string());
    }

    if power.on_battery {
        if power.battery_level_percent < 20.0 {
            out.push("Critical battery level - avoid AI compute".to_string());
        } else if power.battery_level_percent < 50.0 {
            out.push("Consider connecting to power for intensive tasks".to_string());
        }
    }

    if resources.cpu_usage_percent > 80.0 {
        out.push("High CPU usage - may impact AI task performance".to_string());
    }
    if resources.memory_usage_percent > 85.0 {
        out.push("High memory usage - may limit model size".to_string());
    }

    if out.is_empty() && score >= 60 {
        out.push("System ready for AI compute tasks".to_string());
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::port::activity_probe::mocks::MockActivityProbe;
    use crate::port::power_probe::mocks::MockPowerProbe;
    use crate::port::resource_probe::mocks::MockResourceProbe;
    use std::sync::Arc;

    struct FixedTime(std::sync::atomic::AtomicI64);

    impl TimeProvider for FixedTime {
        fn now_millis(&self) -> i64 {
            self.0.load(std::sync::atomic::Ordering::SeqCst)
        }
    }

    fn harness(
        power: PowerState,
        resources: CurrentResources,
        user_active: bool,
        start_ms: i64,
    ) -> (ReadinessEvaluator, Arc<FixedTime>) {
        let time = Arc::new(FixedTime(std::sync::atomic::AtomicI64::new(start_ms)));
        let eval = ReadinessEvaluator::new(
            Arc::new(MockPowerProbe::new(power)),
            Arc::new(MockActivityProbe::new(user_active)),
            Arc::new(MockResourceProbe::new(resources)),
            time.clone(),
        );
        (eval, time)
    }

    #[tokio::test]
    async fn scenario_1_idle_plugged_in_low_load() {
        let (eval, _time) = harness(
            PowerState {
                on_battery: false,
                battery_level_percent: 100.0,
                power_plugged: true,
                time_left_seconds: None,
            },
            CurrentResources {
                cpu_usage_percent: 5.0,
                memory_usage_percent: 30.0,
                gpu_available: false,
            },
            false,
            0,
        );

        // Force the idle tracker past the 300s threshold by manipulating time.
        {
            let mut tracker = eval.idle_tracker.lock().unwrap();
            tracker.idle_start_at = Some(-1900);
        }
        let snapshot = eval.evaluate().await;
        assert_eq!(snapshot.readiness_score, 100);
        assert!(snapshot.ready_for_ai);
    }

    #[tokio::test]
    async fn scenario_2_low_battery_not_idle_rejects_regardless_of_score() {
        let (eval, _time) = harness(
            PowerState {
                on_battery: true,
                battery_level_percent: 15.0,
                power_plugged: false,
                time_left_seconds: None,
            },
            CurrentResources {
                cpu_usage_percent: 60.0,
                memory_usage_percent: 75.0,
                gpu_available: false,
            },
            true,
            0,
        );

        let snapshot = eval.evaluate().await;
        assert!(!snapshot.ready_for_ai);
        assert_eq!(snapshot.compute_limits.max_concurrent_tasks, 1);
        assert_eq!(snapshot.compute_limits.max_cpu_usage_percent, 30.0);
        assert_eq!(snapshot.compute_limits.max_memory_usage_percent, 50.0);
    }

    #[tokio::test]
    async fn scenario_6_idle_flap_never_crosses_idle_threshold() {
        let time = Arc::new(FixedTime(std::sync::atomic::AtomicI64::new(0)));
        let activity = Arc::new(MockActivityProbe::new(true));
        let eval = ReadinessEvaluator::new(
            Arc::new(MockPowerProbe::new(PowerState {
                on_battery: false,
                battery_level_percent: 100.0,
                power_plugged: true,
                time_left_seconds: None,
            })),
            activity.clone(),
            Arc::new(MockResourceProbe::new(CurrentResources {
                cpu_usage_percent: 5.0,
                memory_usage_percent: 10.0,
                gpu_available: false,
            })),
            time.clone(),
        );

        // Activity probe flips true every 25s for 10 minutes: idle_start_at
        // resets each time, so idle_duration never exceeds the gap and
        // currently_idle must remain false throughout.
        for i in 0..24 {
            time.0.store(i * 25_000, std::sync::atomic::Ordering::SeqCst);
            activity.set(true);
            eval.evaluate().await;
            activity.set(false);
            let snapshot = eval.evaluate().await;
            assert!(!snapshot.idle_state.is_idle);
            assert_eq!(snapshot.idle_state.idle_duration_seconds, 0);
        }
    }

    #[test]
    fn invariant_holds_across_samples() {
        for on_battery in [true, false] {
            for battery in [0.0, 10.0, 25.0, 55.0, 90.0] {
                for idle in [true, false] {
                    for duration in [0, 500, 1000, 2000] {
                        for cpu in [5.0, 40.0, 75.0, 95.0] {
                            for mem in [10.0, 55.0, 80.0, 95.0] {
                                let power = PowerState {
                                    on_battery,
                                    battery_level_percent: battery,
                                    power_plugged: !on_battery,
                                    time_left_seconds: None,
                                };
                                let idle_state = IdleState {
                                    is_idle: idle,
                                    idle_duration_seconds: duration,
                                    user_active: !idle,
                                    last_activity_at: 0,
                                };
                                let resources = CurrentResources {
                                    cpu_usage_percent: cpu,
                                    memory_usage_percent: mem,
                                    gpu_available: false,
                                };
                                let score = score_readiness(&idle_state, &power, &resources);
                                assert!((0..=100).contains(&score));
                                let ready = score >= 60 && !power.should_throttle();
                                if ready {
                                    assert!(score >= 60);
                                    assert!(!(power.on_battery && power.battery_level_percent < 20.0));
                                }
                            }
                        }
                    }
                }
            }
        }
    }
}
