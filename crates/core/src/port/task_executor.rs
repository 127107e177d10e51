//! Task Executor port - the inference engine collaborator (out of scope per
//! §1; the core treats it as an opaque "execute this task" operation).

use async_trait::async_trait;
use serde_json::Value;

use crate::domain::ComputeLimits;

#[derive(Debug, Clone)]
pub struct ExecutionOutcome {
    pub result: Value,
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum ExecutionError {
    #[error("inference engine failed: {0}")]
    Failed(String),
}

/// Runs one task on the agent with the given compute caps applied. The real
/// implementation (model loading, GPU memory) lives entirely outside this
/// core; agents wire in whatever engine they have.
#[async_trait]
pub trait TaskExecutor: Send + Sync {
    async fn execute(
        &self,
        payload: &Value,
        limits: &ComputeLimits,
    ) -> Result<ExecutionOutcome, ExecutionError>;
}

#[cfg(test)]
pub mod mocks {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Clone)]
    pub enum MockBehavior {
        Success,
        Fail(String),
    }

    pub struct MockTaskExecutor {
        behavior: MockBehavior,
        call_count: AtomicUsize,
    }

    impl MockTaskExecutor {
        pub fn new(behavior: MockBehavior) -> Self {
            Self {
                behavior,
                call_count: AtomicUsize::new(0),
            }
        }

        pub fn call_count(&self) -> usize {
            self.call_count.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl TaskExecutor for MockTaskExecutor {
        async fn execute(
            &self,
            payload: &Value,
            _limits: &ComputeLimits,
        ) -> Result<ExecutionOutcome, ExecutionError> {
            self.call_count.fetch_add(1, Ordering::SeqCst);
            match &self.behavior {
                MockBehavior::Success => Ok(ExecutionOutcome {
                    result: payload.clone(),
                }),
                MockBehavior::Fail(msg) => Err(ExecutionError::Failed(msg.clone())),
            }
        }
    }
}
