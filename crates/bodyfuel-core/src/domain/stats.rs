//! Derived view of a user's recent workouts.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::exercise::{ExerciseType, PlaceExercise};
use super::ids::UserId;
use super::workout::WorkoutLevel;

/// Result of analyzing recent history. Computed per tick, never stored.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalyzeWorkoutStats {
    pub user_id: UserId,
    pub total_workouts: u32,
    pub total_finished: u32,
    pub total_cancelled: u32,
    pub total_new: u32,
    pub finished_this_week: u32,
    pub average_level: WorkoutLevel,
    pub popular_exercise_type: ExerciseType,
    pub popular_place: PlaceExercise,
    pub last_generation: Option<DateTime<Utc>>,
    pub skip: bool,
    pub skip_reason: Option<String>,
}

impl AnalyzeWorkoutStats {
    /// Zero counts with the defaults used for users without history.
    pub fn empty(user_id: UserId) -> Self {
        Self {
            user_id,
            total_workouts: 0,
            total_finished: 0,
            total_cancelled: 0,
            total_new: 0,
            finished_this_week: 0,
            average_level: WorkoutLevel::Light,
            popular_exercise_type: ExerciseType::UpperBody,
            popular_place: PlaceExercise::Home,
            last_generation: None,
            skip: false,
            skip_reason: None,
        }
    }

    pub fn skipped(user_id: UserId, last_generation: DateTime<Utc>, reason: impl Into<String>) -> Self {
        Self {
            last_generation: Some(last_generation),
            skip: true,
            skip_reason: Some(reason.into()),
            ..Self::empty(user_id)
        }
    }
}
