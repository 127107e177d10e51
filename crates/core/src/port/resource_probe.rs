//! Resource Probe port (C3, §4.3).

use async_trait::async_trait;

use crate::domain::{CurrentResources, SystemInfo};

#[async_trait]
pub trait ResourceProbe: Send + Sync {
    /// CPU usage is sampled over a fixed 1s window - the longest synchronous
    /// sampling window permitted anywhere in the system (§5).
    async fn sample(&self) -> CurrentResources;

    /// Static facts (cpu count, total memory, boot time) for `health_detailed`
    /// (§4.5). Unlike `sample`, these don't change between calls and need no
    /// sampling window.
    fn system_info(&self) -> SystemInfo;
}

#[cfg(test)]
pub mod mocks {
    use super::*;
    use std::sync::Mutex;

    pub struct MockResourceProbe {
        resources: Mutex<CurrentResources>,
        system_info: SystemInfo,
    }

    impl MockResourceProbe {
        pub fn new(resources: CurrentResources) -> Self {
            Self {
                resources: Mutex::new(resources),
                system_info: SystemInfo {
                    cpu_count: 4,
                    memory_total_bytes: 16_000_000_000,
                    boot_time_unix_seconds: 0,
                },
            }
        }

        pub fn set(&self, resources: CurrentResources) {
            *self.resources.lock().unwrap() = resources;
        }
    }

    #[async_trait]
    impl ResourceProbe for MockResourceProbe {
        async fn sample(&self) -> CurrentResources {
            *self.resources.lock().unwrap()
        }

        fn system_info(&self) -> SystemInfo {
            self.system_info
        }
    }
}
