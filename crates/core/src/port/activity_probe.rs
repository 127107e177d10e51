//! Activity Probe port (C2, §4.2).

use async_trait::async_trait;

/// Contract: returns true iff the last user input event occurred within the
/// last 30 seconds. Implementations that lack a reliable platform signal
/// MUST default to `true` (fail-safe: never throttle a user who is actually
/// present).
#[async_trait]
pub trait ActivityProbe: Send + Sync {
    async fn user_active(&self) -> bool;
}

#[cfg(test)]
pub mod mocks {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};

    pub struct MockActivityProbe {
        active: AtomicBool,
    }

    impl MockActivityProbe {
        pub fn new(active: bool) -> Self {
            Self {
                active: AtomicBool::new(active),
            }
        }

        pub fn set(&self, active: bool) {
            self.active.store(active, Ordering::SeqCst);
        }
    }

    #[async_trait]
    impl ActivityProbe for MockActivityProbe {
        async fn user_active(&self) -> bool {
            self.active.load(Ordering::SeqCst)
        }
    }
}
