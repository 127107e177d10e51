//! Stand-in `TaskExecutor`: the real inference engine is out of scope (the
//! core treats execution as opaque, §4's Task Executor port doc comment).
//! This adapter just echoes the payload back, applying no compute limits of
//! its own, so the rest of the pipeline (dispatch, stats, rejection) is
//! exercisable end to end without an actual model runtime wired in.

use async_trait::async_trait;
use serde_json::Value;

use sparenet_core::domain::ComputeLimits;
use sparenet_core::port::task_executor::{ExecutionError, ExecutionOutcome, TaskExecutor};

pub struct EchoExecutor;

#[async_trait]
impl TaskExecutor for EchoExecutor {
    async fn execute(
        &self,
        payload: &Value,
        _limits: &ComputeLimits,
    ) -> Result<ExecutionOutcome, ExecutionError> {
        Ok(ExecutionOutcome {
            result: payload.clone(),
        })
    }
}
