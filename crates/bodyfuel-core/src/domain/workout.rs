//! Generated workouts and their status lifecycle.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::errors::DomainError;
use super::exercise::{ExerciseStatus, ExerciseType, LevelPreparation, PlaceExercise};
use super::ids::{ExerciseId, UserId, WorkoutId};

string_enum! {
    pub enum WorkoutLevel as "workouts level" {
        Light => "workout_light",
        Middle => "workout_middle",
        Hard => "workout_hard",
    }
}

impl From<LevelPreparation> for WorkoutLevel {
    fn from(level: LevelPreparation) -> Self {
        match level {
            LevelPreparation::Beginner => WorkoutLevel::Light,
            LevelPreparation::Medium => WorkoutLevel::Middle,
            LevelPreparation::Sportsman => WorkoutLevel::Hard,
        }
    }
}

string_enum! {
    /// Workout status.
    ///
    /// Transitions:
    /// - Created -> InActive -> Done
    /// - Created -> InActive -> Failed
    /// - Created -> Failed (cancelled before it was started)
    pub enum WorkoutStatus as "workouts status" {
        Created => "workout_created",
        Done => "workout_done",
        InActive => "workout_in_active",
        Failed => "workout_failed",
    }
}

impl WorkoutStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, WorkoutStatus::Done | WorkoutStatus::Failed)
    }
}

/// One exercise as planned inside a workout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkoutExercise {
    pub exercise_id: ExerciseId,
    pub name: String,
    pub sets: u32,
    pub reps: u32,
    pub rest_secs: u32,
    pub calories: u32,
    pub status: ExerciseStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workout {
    pub id: WorkoutId,
    pub user_id: UserId,
    pub level: WorkoutLevel,
    pub status: WorkoutStatus,
    pub total_calories: u32,
    pub prediction_calories: u32,
    pub duration: Duration,
    /// Exercise type the workout was biased toward.
    pub focus: ExerciseType,
    pub place: PlaceExercise,
    pub exercises: Vec<WorkoutExercise>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Workout {
    pub fn is_active(&self) -> bool {
        self.status == WorkoutStatus::InActive
    }

    /// Created -> InActive.
    pub fn start(&mut self, now: DateTime<Utc>) -> Result<(), DomainError> {
        self.transition(WorkoutStatus::InActive, now)
    }

    /// InActive -> Done, recording what was actually burned.
    pub fn finish(&mut self, total_calories: u32, now: DateTime<Utc>) -> Result<(), DomainError> {
        self.transition(WorkoutStatus::Done, now)?;
        self.total_calories = total_calories;
        Ok(())
    }

    /// Created | InActive -> Failed.
    pub fn fail(&mut self, now: DateTime<Utc>) -> Result<(), DomainError> {
        self.transition(WorkoutStatus::Failed, now)
    }

    fn transition(&mut self, to: WorkoutStatus, now: DateTime<Utc>) -> Result<(), DomainError> {
        let allowed = matches!(
            (self.status, to),
            (WorkoutStatus::Created, WorkoutStatus::InActive)
                | (WorkoutStatus::InActive, WorkoutStatus::Done)
                | (WorkoutStatus::InActive, WorkoutStatus::Failed)
                | (WorkoutStatus::Created, WorkoutStatus::Failed)
        );
        if !allowed {
            return Err(DomainError::InvalidTransition {
                workout: self.id.to_string(),
                from: self.status.as_str(),
                to: to.as_str(),
            });
        }

        self.status = to;
        self.updated_at = now;
        Ok(())
    }
}
