//! Tunables for the background workers and the pure components they use.
//!
//! Every struct deserializes from a partial table: missing keys fall back
//! to the defaults below.

use std::time::Duration;

use serde::{Deserialize, Serialize};

fn default_interval_secs() -> u64 { 60 }
fn default_max_retry_send_notification() -> u32 { 5 }
fn default_poll_interval_secs() -> u64 { 13 }
fn default_batch_size() -> usize { 50 }
fn default_rest_window_secs() -> u64 { 8 * 60 * 60 }
fn default_week_window_days() -> u32 { 7 }
fn default_history_limit() -> usize { 10 }
fn default_selection_count() -> usize { 5 }
fn default_preferred_weight() -> usize { 3 }

/// Workout generation scheduler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulerConfig {
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
    /// Attempt budget of the notification task enqueued with each workout.
    #[serde(default = "default_max_retry_send_notification")]
    pub max_retry_send_notification: u32,
    /// Fixed seed for exercise selection. `None` seeds from the OS.
    #[serde(default)]
    pub rng_seed: Option<u64>,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
            max_retry_send_notification: default_max_retry_send_notification(),
            rng_seed: None,
        }
    }
}

impl SchedulerConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs.max(1))
    }
}

/// Task executor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutorConfig {
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
    /// Maximum number of tasks handled per poll.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    /// Fixed seed for backoff jitter. `None` seeds from the OS.
    #[serde(default)]
    pub rng_seed: Option<u64>,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval_secs(),
            batch_size: default_batch_size(),
            rng_seed: None,
        }
    }
}

impl ExecutorConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs.max(1))
    }
}

/// Workout history analysis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalyzerConfig {
    /// Minimum time between the last workout update and a new workout.
    #[serde(default = "default_rest_window_secs")]
    pub rest_window_secs: u64,
    #[serde(default = "default_week_window_days")]
    pub week_window_days: u32,
    /// How many recent workouts are analyzed.
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            rest_window_secs: default_rest_window_secs(),
            week_window_days: default_week_window_days(),
            history_limit: default_history_limit(),
        }
    }
}

impl AnalyzerConfig {
    /// Saturates at `chrono::Duration::MAX`.
    pub fn rest_window(&self) -> chrono::Duration {
        i64::try_from(self.rest_window_secs)
            .ok()
            .and_then(chrono::Duration::try_seconds)
            .unwrap_or(chrono::Duration::MAX)
    }

    /// Saturates at `chrono::Duration::MAX`.
    pub fn week_window(&self) -> chrono::Duration {
        chrono::Duration::try_days(i64::from(self.week_window_days)).unwrap_or(chrono::Duration::MAX)
    }
}

/// Weighted exercise selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectorConfig {
    #[serde(default = "default_selection_count")]
    pub count: usize,
    /// Copies of each preferred-type exercise put into the draw.
    #[serde(default = "default_preferred_weight")]
    pub preferred_weight: usize,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            count: default_selection_count(),
            preferred_weight: default_preferred_weight(),
        }
    }
}
