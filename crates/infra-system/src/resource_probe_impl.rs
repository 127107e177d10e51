//! Resource Probe adapter (C3, §4.3), grounded in the teacher's
//! `SystemProbeImpl` (sysinfo-based CPU/memory sampling).

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use sysinfo::System;
use tracing::debug;

use sparenet_core::domain::{CurrentResources, SystemInfo};
use sparenet_core::port::ResourceProbe;

/// CPU usage readings require two samples spaced apart; sysinfo documents
/// this minimum refresh interval.
const CPU_SAMPLE_WINDOW: Duration = Duration::from_secs(1);

pub struct ResourceProbeImpl {
    system: Mutex<System>,
}

impl ResourceProbeImpl {
    pub fn new() -> Self {
        Self {
            system: Mutex::new(System::new_all()),
        }
    }
}

impl Default for ResourceProbeImpl {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ResourceProbe for ResourceProbeImpl {
    async fn sample(&self) -> CurrentResources {
        {
            let mut sys = self.system.lock().unwrap();
            sys.refresh_cpu_usage();
        }
        tokio::time::sleep(CPU_SAMPLE_WINDOW).await;

        let (cpu_usage_percent, memory_usage_percent) = {
            let mut sys = self.system.lock().unwrap();
            sys.refresh_cpu_usage();
            sys.refresh_memory();
            let cpu = sys.global_cpu_info().cpu_usage();
            let memory_percent = if sys.total_memory() == 0 {
                0.0
            } else {
                (sys.used_memory() as f64 / sys.total_memory() as f64 * 100.0) as f32
            };
            (cpu, memory_percent)
        };

        let gpu_available = nvidia_smi_present();

        debug!(cpu_usage_percent, memory_usage_percent, gpu_available, "resources sampled");

        CurrentResources {
            cpu_usage_percent,
            memory_usage_percent,
            gpu_available,
        }
    }

    fn system_info(&self) -> SystemInfo {
        let sys = self.system.lock().unwrap();
        SystemInfo {
            cpu_count: sys.cpus().len(),
            memory_total_bytes: sys.total_memory(),
            boot_time_unix_seconds: System::boot_time(),
        }
    }
}

fn nvidia_smi_present() -> bool {
    std::env::var_os("PATH")
        .map(|path| {
            std::env::split_paths(&path).any(|dir| {
                dir.join("nvidia-smi").is_file()
                    || dir.join("nvidia-smi.exe").is_file()
            })
        })
        .unwrap_or(false)
}
