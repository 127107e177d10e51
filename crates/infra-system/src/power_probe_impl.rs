//! Power Probe adapter (C1, §4.1). Reads battery level and plug state from
//! platform-specific sources, mirroring the branches the teacher's
//! `Scheduler::is_charging` used for its own (boolean-only) charging check.

use async_trait::async_trait;

use sparenet_core::domain::PowerState;
use sparenet_core::port::PowerProbe;

pub struct PowerProbeImpl;

impl PowerProbeImpl {
    pub fn new() -> Self {
        Self
    }
}

impl Default for PowerProbeImpl {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PowerProbe for PowerProbeImpl {
    async fn sample(&self) -> PowerState {
        read_power_state()
    }
}

#[cfg(target_os = "macos")]
fn read_power_state() -> PowerState {
    use std::process::Command;

    let output = Command::new("pmset").arg("-g").arg("batt").output();
    let Ok(output) = output else {
        return no_battery();
    };
    let Ok(stdout) = String::from_utf8(output.stdout) else {
        return no_battery();
    };

    let power_plugged = stdout.contains("AC Power");
    let battery_level_percent = stdout
        .lines()
        .nth(1)
        .and_then(|line| line.split('%').next())
        .and_then(|s| s.split_whitespace().last())
        .and_then(|s| s.parse::<f32>().ok())
        .unwrap_or(100.0);

    PowerState {
        on_battery: !power_plugged,
        battery_level_percent,
        power_plugged,
        time_left_seconds: None,
    }
}

#[cfg(target_os = "linux")]
fn read_power_state() -> PowerState {
    use std::fs;

    let Ok(entries) = fs::read_dir("/sys/class/power_supply") else {
        return no_battery();
    };

    let mut power_plugged = false;
    let mut battery_level_percent: Option<f32> = None;

    for entry in entries.flatten() {
        let path = entry.path();
        if let Ok(kind) = fs::read_to_string(path.join("type")) {
            match kind.trim() {
                "Mains" => {
                    if let Ok(online) = fs::read_to_string(path.join("online")) {
                        if online.trim() == "1" {
                            power_plugged = true;
                        }
                    }
                }
                "Battery" => {
                    if let Ok(capacity) = fs::read_to_string(path.join("capacity")) {
                        if let Ok(percent) = capacity.trim().parse::<f32>() {
                            battery_level_percent = Some(percent);
                        }
                    }
                }
                _ => {}
            }
        }
    }

    match battery_level_percent {
        Some(percent) => PowerState {
            on_battery: !power_plugged,
            battery_level_percent: percent,
            power_plugged,
            time_left_seconds: None,
        },
        None => no_battery(),
    }
}

#[cfg(not(any(target_os = "macos", target_os = "linux")))]
fn read_power_state() -> PowerState {
    no_battery()
}

/// No battery present (desktop, or platform without a reliable signal):
/// fail-safe to "plugged in, full" so power state never throttles a node
/// that has no battery to throttle (§7 probe-failure policy).
fn no_battery() -> PowerState {
    PowerState {
        on_battery: false,
        battery_level_percent: 100.0,
        power_plugged: true,
        time_left_seconds: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn sample_does_not_panic() {
        let probe = PowerProbeImpl::new();
        let state = probe.sample().await;
        assert!(state.battery_level_percent >= 0.0 && state.battery_level_percent <= 100.0);
    }
}
