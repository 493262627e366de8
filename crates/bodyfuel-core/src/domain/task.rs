//! Asynchronous tasks with attempt-limited retry state.

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::backoff::BackoffPolicy;
use super::errors::DomainError;
use super::ids::{TaskId, UserId, WorkoutId};

string_enum! {
    /// Persisted task state.
    ///
    /// Running -> Failed once attempts are exhausted. `restart` is the only
    /// way back to Running.
    pub enum TaskState as "task state" {
        Running => "running",
        Failed => "failed",
    }
}

/// Task category. Decides both the payload shape and the backoff policy.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum TaskType {
    SendCodeOnEmail,
    SendCodeOnPhone,
    SendNotificationEmail,
    SendNotificationPhone,
    /// Any type name this build does not know. Uses linear backoff.
    Other(String),
}

impl TaskType {
    pub fn as_str(&self) -> &str {
        match self {
            TaskType::SendCodeOnEmail => "send_code_email_task",
            TaskType::SendCodeOnPhone => "send_code_phone_task",
            TaskType::SendNotificationEmail => "send_notification_email_task",
            TaskType::SendNotificationPhone => "send_notification_phone_task",
            TaskType::Other(name) => name,
        }
    }

    pub fn backoff_policy(&self) -> BackoffPolicy {
        match self {
            TaskType::SendCodeOnEmail | TaskType::SendCodeOnPhone => BackoffPolicy::Fibonacci,
            TaskType::SendNotificationEmail | TaskType::SendNotificationPhone => {
                BackoffPolicy::ExponentialJitter
            }
            TaskType::Other(_) => BackoffPolicy::Linear,
        }
    }

    fn accepts(&self, payload: &TaskPayload) -> bool {
        matches!(
            (self, payload),
            (
                TaskType::SendCodeOnEmail | TaskType::SendCodeOnPhone,
                TaskPayload::VerificationCode { .. }
            ) | (
                TaskType::SendNotificationEmail | TaskType::SendNotificationPhone,
                TaskPayload::WorkoutNotification { .. }
            ) | (TaskType::Other(_), TaskPayload::Raw(_))
        )
    }
}

impl From<String> for TaskType {
    fn from(s: String) -> Self {
        match s.as_str() {
            "send_code_email_task" => TaskType::SendCodeOnEmail,
            "send_code_phone_task" => TaskType::SendCodeOnPhone,
            "send_notification_email_task" => TaskType::SendNotificationEmail,
            "send_notification_phone_task" => TaskType::SendNotificationPhone,
            _ => TaskType::Other(s),
        }
    }
}

impl From<TaskType> for String {
    fn from(t: TaskType) -> Self {
        t.as_str().to_string()
    }
}

impl fmt::Display for TaskType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Typed task payload, tagged by category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum TaskPayload {
    VerificationCode {
        user_id: UserId,
        destination: String,
        code: String,
    },
    WorkoutNotification {
        user_id: UserId,
        workout_id: WorkoutId,
        message: String,
    },
    Raw(serde_json::Value),
}

impl TaskPayload {
    pub fn kind(&self) -> &'static str {
        match self {
            TaskPayload::VerificationCode { .. } => "verification_code",
            TaskPayload::WorkoutNotification { .. } => "workout_notification",
            TaskPayload::Raw(_) => "raw",
        }
    }
}

/// Outcome of recording a failed execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Try again no earlier than `retry_at`.
    Scheduled {
        retry_at: DateTime<Utc>,
        delay: Duration,
    },
    /// Attempts are used up; the task is now `Failed`.
    Exhausted,
}

/// Everything needed to rebuild a [`Task`] from storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskSnapshot {
    pub id: TaskId,
    pub task_type: TaskType,
    pub payload: TaskPayload,
    pub state: TaskState,
    pub attempts: u32,
    pub max_attempts: u32,
    pub retry_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A unit of asynchronous work.
///
/// Invariants:
/// - once `attempts >= max_attempts` the state is `Failed` and
///   `record_failure` no longer changes `attempts`;
/// - the backoff policy is derived from the type and never changes;
/// - every mutation sets `updated_at`.
#[derive(Debug, Clone, PartialEq)]
pub struct Task {
    id: TaskId,
    task_type: TaskType,
    payload: TaskPayload,
    state: TaskState,
    attempts: u32,
    max_attempts: u32,
    retry_at: DateTime<Utc>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    backoff: BackoffPolicy,
}

impl Task {
    pub fn new(
        id: TaskId,
        task_type: TaskType,
        max_attempts: u32,
        payload: TaskPayload,
        now: DateTime<Utc>,
    ) -> Result<Self, DomainError> {
        Self::restore(TaskSnapshot {
            id,
            task_type,
            payload,
            state: TaskState::Running,
            attempts: 0,
            max_attempts,
            retry_at: now,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn restore(s: TaskSnapshot) -> Result<Self, DomainError> {
        if !s.task_type.accepts(&s.payload) {
            return Err(DomainError::PayloadMismatch {
                task_type: s.task_type.to_string(),
                payload: s.payload.kind(),
            });
        }

        let backoff = s.task_type.backoff_policy();
        Ok(Self {
            id: s.id,
            task_type: s.task_type,
            payload: s.payload,
            state: s.state,
            attempts: s.attempts,
            max_attempts: s.max_attempts,
            retry_at: s.retry_at,
            created_at: s.created_at,
            updated_at: s.updated_at,
            backoff,
        })
    }

    pub fn snapshot(&self) -> TaskSnapshot {
        TaskSnapshot {
            id: self.id,
            task_type: self.task_type.clone(),
            payload: self.payload.clone(),
            state: self.state,
            attempts: self.attempts,
            max_attempts: self.max_attempts,
            retry_at: self.retry_at,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }

    pub fn id(&self) -> TaskId {
        self.id
    }

    pub fn task_type(&self) -> &TaskType {
        &self.task_type
    }

    pub fn payload(&self) -> &TaskPayload {
        &self.payload
    }

    pub fn state(&self) -> TaskState {
        self.state
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn retry_at(&self) -> DateTime<Utc> {
        self.retry_at
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn backoff_policy(&self) -> BackoffPolicy {
        self.backoff
    }

    pub fn is_failed(&self) -> bool {
        self.state == TaskState::Failed
    }

    pub fn is_limit_exceeded(&self) -> bool {
        self.attempts >= self.max_attempts
    }

    pub fn is_eligible_for_execution(&self, now: DateTime<Utc>) -> bool {
        self.state == TaskState::Running && self.retry_at < now
    }

    /// Count one failed execution and either schedule the next try or
    /// give up. Giving up is a state change the caller must persist.
    pub fn record_failure<R: Rng + ?Sized>(&mut self, now: DateTime<Utc>, rng: &mut R) -> RetryDecision {
        self.updated_at = now;

        if self.is_limit_exceeded() {
            self.mark_failed(now);
            return RetryDecision::Exhausted;
        }

        self.attempts += 1;
        if self.is_limit_exceeded() {
            self.mark_failed(now);
            return RetryDecision::Exhausted;
        }

        let delay = self.backoff.delay(self.attempts, rng);
        let step = chrono::Duration::from_std(delay).unwrap_or(chrono::Duration::MAX);
        self.retry_at = now.checked_add_signed(step).unwrap_or(DateTime::<Utc>::MAX_UTC);
        RetryDecision::Scheduled {
            retry_at: self.retry_at,
            delay,
        }
    }

    pub fn mark_failed(&mut self, now: DateTime<Utc>) {
        self.state = TaskState::Failed;
        self.updated_at = now;
    }

    pub fn restart(&mut self, now: DateTime<Utc>) {
        self.state = TaskState::Running;
        self.attempts = 0;
        self.retry_at = now;
        self.updated_at = now;
    }
}
