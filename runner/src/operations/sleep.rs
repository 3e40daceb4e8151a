use crate::operations::{Action, OperationError};
use async_trait::async_trait;
use common::Bindings;
use std::time::Duration;

/// Pauses the step
pub struct SleepAction {
    duration: Duration,
}

impl SleepAction {
    pub fn new(duration: Duration) -> Self {
        Self { duration }
    }
}

#[async_trait]
impl Action for SleepAction {
    async fn exec(&self, bindings: Bindings) -> Result<Bindings, OperationError> {
        tokio::time::sleep(self.duration).await;
        Ok(bindings)
    }
}
