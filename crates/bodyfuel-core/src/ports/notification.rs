//! Outbound notification port used by the task executor.

use async_trait::async_trait;

use crate::domain::{DomainError, TaskPayload, TaskType};

#[async_trait]
pub trait NotificationSender: Send + Sync {
    /// Deliver one task payload. An `Err` counts as a failed attempt.
    async fn send(&self, task_type: &TaskType, payload: &TaskPayload) -> Result<(), DomainError>;
}
