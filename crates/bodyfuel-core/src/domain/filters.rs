//! Repository filters. Every `None` field matches anything.

use chrono::{DateTime, Utc};

use super::exercise::{Exercise, ExerciseType, LevelPreparation, PlaceExercise};
use super::ids::{ExerciseId, TaskId, UserId, UserParamsId, WeightId, WorkoutId};
use super::task::{Task, TaskState, TaskType};
use super::user::{UserInfo, UserParams, UserWeight};
use super::workout::{Workout, WorkoutStatus};

fn field_matches<T: PartialEq>(want: &Option<T>, got: &T) -> bool {
    want.as_ref().is_none_or(|w| w == got)
}

#[derive(Debug, Clone, Default)]
pub struct UserParamsFilter {
    pub id: Option<UserParamsId>,
    pub user_id: Option<UserId>,
}

impl UserParamsFilter {
    pub fn by_user(user_id: UserId) -> Self {
        Self {
            user_id: Some(user_id),
            ..Default::default()
        }
    }

    pub fn matches(&self, p: &UserParams) -> bool {
        field_matches(&self.id, &p.id) && field_matches(&self.user_id, &p.user_id)
    }
}

#[derive(Debug, Clone, Default)]
pub struct UserInfoFilter {
    pub id: Option<UserId>,
    pub username: Option<String>,
    pub email: Option<String>,
}

impl UserInfoFilter {
    pub fn by_id(id: UserId) -> Self {
        Self {
            id: Some(id),
            ..Default::default()
        }
    }

    pub fn matches(&self, u: &UserInfo) -> bool {
        field_matches(&self.id, &u.id)
            && field_matches(&self.username, &u.username)
            && field_matches(&self.email, &u.email)
    }
}

#[derive(Debug, Clone, Default)]
pub struct UserWeightFilter {
    pub id: Option<WeightId>,
    pub user_id: Option<UserId>,
    /// Inclusive lower bound on `date`.
    pub from: Option<DateTime<Utc>>,
}

impl UserWeightFilter {
    pub fn by_user(user_id: UserId) -> Self {
        Self {
            user_id: Some(user_id),
            ..Default::default()
        }
    }

    pub fn matches(&self, w: &UserWeight) -> bool {
        field_matches(&self.id, &w.id)
            && field_matches(&self.user_id, &w.user_id)
            && self.from.is_none_or(|from| w.date >= from)
    }
}

#[derive(Debug, Clone, Default)]
pub struct WorkoutsFilter {
    pub id: Option<WorkoutId>,
    pub user_id: Option<UserId>,
    pub status: Option<WorkoutStatus>,
}

impl WorkoutsFilter {
    pub fn by_user(user_id: UserId) -> Self {
        Self {
            user_id: Some(user_id),
            ..Default::default()
        }
    }

    pub fn by_id(id: WorkoutId) -> Self {
        Self {
            id: Some(id),
            ..Default::default()
        }
    }

    pub fn matches(&self, w: &Workout) -> bool {
        field_matches(&self.id, &w.id)
            && field_matches(&self.user_id, &w.user_id)
            && field_matches(&self.status, &w.status)
    }
}

#[derive(Debug, Clone, Default)]
pub struct ExerciseFilter {
    pub id: Option<ExerciseId>,
    pub name: Option<String>,
    pub level: Option<LevelPreparation>,
    pub exercise_type: Option<ExerciseType>,
    pub place: Option<PlaceExercise>,
}

impl ExerciseFilter {
    pub fn by_id(id: ExerciseId) -> Self {
        Self {
            id: Some(id),
            ..Default::default()
        }
    }

    pub fn matches(&self, e: &Exercise) -> bool {
        field_matches(&self.id, &e.id)
            && field_matches(&self.name, &e.name)
            && field_matches(&self.level, &e.level)
            && field_matches(&self.exercise_type, &e.exercise_type)
            && field_matches(&self.place, &e.place)
    }
}

#[derive(Debug, Clone, Default)]
pub struct TasksFilter {
    pub id: Option<TaskId>,
    pub task_type: Option<TaskType>,
    pub state: Option<TaskState>,
    /// Inclusive upper bound on `retry_at`.
    pub retry_at_before: Option<DateTime<Utc>>,
}

impl TasksFilter {
    pub fn by_id(id: TaskId) -> Self {
        Self {
            id: Some(id),
            ..Default::default()
        }
    }

    /// Running tasks whose retry time has come.
    pub fn due(now: DateTime<Utc>) -> Self {
        Self {
            state: Some(TaskState::Running),
            retry_at_before: Some(now),
            ..Default::default()
        }
    }

    pub fn matches(&self, t: &Task) -> bool {
        field_matches(&self.id, &t.id())
            && field_matches(&self.task_type, t.task_type())
            && field_matches(&self.state, &t.state())
            && self.retry_at_before.is_none_or(|before| t.retry_at() <= before)
    }
}
