//! Repository ports.
//!
//! `get` returns `DomainError::NotFound` when nothing matches. `list` never
//! fails on an empty result. Writes that break a uniqueness rule return
//! `DomainError::AlreadyExists`.

use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::{
    DomainError, Exercise, ExerciseFilter, ExerciseId, Task, TaskId, TasksFilter, UserId, UserInfo,
    UserInfoFilter, UserParams, UserParamsFilter, UserWeight, UserWeightFilter, WeightId, Workout,
    WorkoutsFilter,
};

#[async_trait]
pub trait UserParamsRepository: Send + Sync {
    async fn get(&self, filter: &UserParamsFilter) -> Result<UserParams, DomainError>;
    async fn list(&self, filter: &UserParamsFilter) -> Result<Vec<UserParams>, DomainError>;
    async fn create(&self, params: &UserParams) -> Result<(), DomainError>;
    async fn update(&self, params: &UserParams) -> Result<(), DomainError>;
    async fn delete(&self, filter: &UserParamsFilter) -> Result<(), DomainError>;
}

#[async_trait]
pub trait UserInfoRepository: Send + Sync {
    async fn get(&self, filter: &UserInfoFilter) -> Result<UserInfo, DomainError>;
    async fn list(&self, filter: &UserInfoFilter) -> Result<Vec<UserInfo>, DomainError>;
    async fn create(&self, info: &UserInfo) -> Result<(), DomainError>;
    async fn update(&self, info: &UserInfo) -> Result<(), DomainError>;
    async fn delete(&self, id: UserId) -> Result<(), DomainError>;
}

#[async_trait]
pub trait UserWeightRepository: Send + Sync {
    async fn get(&self, filter: &UserWeightFilter) -> Result<UserWeight, DomainError>;
    /// Newest first by `date`.
    async fn list(&self, filter: &UserWeightFilter) -> Result<Vec<UserWeight>, DomainError>;
    async fn create(&self, weight: &UserWeight) -> Result<(), DomainError>;
    async fn update(&self, weight: &UserWeight) -> Result<(), DomainError>;
    async fn delete(&self, id: WeightId) -> Result<(), DomainError>;
}

#[async_trait]
pub trait WorkoutsRepository: Send + Sync {
    async fn get(&self, filter: &WorkoutsFilter) -> Result<Workout, DomainError>;
    /// At most `limit` workouts, newest first by `created_at`.
    async fn top_list_with_limit(
        &self,
        filter: &WorkoutsFilter,
        limit: usize,
    ) -> Result<Vec<Workout>, DomainError>;
    async fn create(&self, workout: &Workout) -> Result<(), DomainError>;
    async fn update(&self, workout: &Workout) -> Result<(), DomainError>;
}

#[async_trait]
pub trait ExerciseRepository: Send + Sync {
    async fn get(&self, filter: &ExerciseFilter) -> Result<Exercise, DomainError>;
    async fn list(&self, filter: &ExerciseFilter) -> Result<Vec<Exercise>, DomainError>;
    async fn create(&self, exercise: &Exercise) -> Result<(), DomainError>;
    async fn update(&self, exercise: &Exercise) -> Result<(), DomainError>;
    async fn delete(&self, id: ExerciseId) -> Result<(), DomainError>;
}

#[async_trait]
pub trait TasksRepository: Send + Sync {
    async fn get(&self, filter: &TasksFilter) -> Result<Task, DomainError>;
    /// Oldest `retry_at` first.
    async fn list(&self, filter: &TasksFilter) -> Result<Vec<Task>, DomainError>;
    async fn create(&self, task: &Task) -> Result<(), DomainError>;
    async fn update(&self, task: &Task) -> Result<(), DomainError>;
    async fn delete(&self, ids: &[TaskId]) -> Result<(), DomainError>;
}

/// The full set of repositories a service works with.
#[derive(Clone)]
pub struct Repositories {
    pub user_params: Arc<dyn UserParamsRepository>,
    pub user_info: Arc<dyn UserInfoRepository>,
    pub user_weights: Arc<dyn UserWeightRepository>,
    pub workouts: Arc<dyn WorkoutsRepository>,
    pub exercises: Arc<dyn ExerciseRepository>,
    pub tasks: Arc<dyn TasksRepository>,
}
