//! Notification sender that only logs. Used by the CLI and in development.

use async_trait::async_trait;

use crate::domain::{DomainError, TaskPayload, TaskType};
use crate::ports::NotificationSender;

#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingNotificationSender;

#[async_trait]
impl NotificationSender for LoggingNotificationSender {
    async fn send(&self, task_type: &TaskType, payload: &TaskPayload) -> Result<(), DomainError> {
        match payload {
            TaskPayload::WorkoutNotification {
                user_id,
                workout_id,
                message,
            } => {
                tracing::info!(%task_type, %user_id, %workout_id, message = %message, "notification sent");
            }
            TaskPayload::VerificationCode {
                user_id, destination, ..
            } => {
                // the code itself is never logged
                tracing::info!(%task_type, %user_id, destination = %destination, "verification code sent");
            }
            TaskPayload::Raw(value) => {
                tracing::info!(%task_type, payload = %value, "raw task delivered");
            }
        }
        Ok(())
    }
}
