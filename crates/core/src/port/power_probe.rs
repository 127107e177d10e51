//! Power Probe port (C1, §4.1).

use async_trait::async_trait;

use crate::domain::{ComputeLimits, PowerState};

#[async_trait]
pub trait PowerProbe: Send + Sync {
    /// Read battery level and plug state. No battery present ⇒
    /// `on_battery=false, battery_level_percent=100`.
    async fn sample(&self) -> PowerState;
}

/// Derive compute caps from power state per the §4.1 contract table.
/// A pure function (not part of the trait) so it's trivially unit-testable
/// against every row of the table without a probe in the loop.
pub fn compute_limits_for(power: &PowerState) -> ComputeLimits {
    if !power.on_battery {
        return ComputeLimits {
            max_cpu_usage_percent: 90.0,
            max_memory_usage_percent: 90.0,
            max_concurrent_tasks: 5,
        };
    }
    let level = power.battery_level_percent;
    if level >= 50.0 {
        ComputeLimits {
            max_cpu_usage_percent: 70.0,
            max_memory_usage_percent: 80.0,
            max_concurrent_tasks: 3,
        }
    } else if level >= 20.0 {
        ComputeLimits {
            max_cpu_usage_percent: 50.0,
            max_memory_usage_percent: 70.0,
            max_concurrent_tasks: 2,
        }
    } else {
        ComputeLimits {
            max_cpu_usage_percent: 30.0,
            max_memory_usage_percent: 50.0,
            max_concurrent_tasks: 1,
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    fn power(on_battery: bool, level: f32) -> PowerState {
        PowerState {
            on_battery,
            battery_level_percent: level,
            power_plugged: !on_battery,
            time_left_seconds: None,
        }
    }

    #[test]
    fn plugged_in_gets_highest_caps() {
        let limits = compute_limits_for(&power(false, 10.0));
        assert_eq!(limits.max_concurrent_tasks, 5);
        assert_eq!(limits.max_cpu_usage_percent, 90.0);
    }

    #[test]
    fn battery_above_50_percent() {
        let limits = compute_limits_for(&power(true, 50.0));
        assert_eq!(limits.max_concurrent_tasks, 3);
    }

    #[test]
    fn battery_between_20_and_50() {
        let limits = compute_limits_for(&power(true, 21.0));
        assert_eq!(limits.max_concurrent_tasks, 2);
    }

    #[test]
    fn battery_below_20_is_most_restrictive() {
        let limits = compute_limits_for(&power(true, 5.0));
        assert_eq!(limits.max_concurrent_tasks, 1);
        assert_eq!(limits.max_cpu_usage_percent, 30.0);
    }
}
