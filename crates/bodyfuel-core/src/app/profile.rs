//! CRUD service over users, their profile data, the exercise catalog,
//! workouts and tasks.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{
    DomainError, Exercise, ExerciseFilter, ExerciseId, ExerciseType, ExerciseUpdate, LevelPreparation,
    Lifestyle, PlaceExercise, ResultExt, Task, TaskId, TasksFilter, UserId, UserInfo, UserInfoFilter,
    UserInfoUpdate, UserParams, UserParamsFilter, UserParamsUpdate, UserWeight, UserWeightFilter,
    UserWeightUpdate, Want, WeightId, Workout, WorkoutId, WorkoutStatus, WorkoutsFilter,
};
use crate::ports::{Clock, IdGenerator, Repositories, TransactionManager};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewUser {
    pub username: String,
    pub name: String,
    pub surname: String,
    pub password_hash: String,
    pub email: String,
    pub phone: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewUserParams {
    pub height: u32,
    #[serde(default)]
    pub photo: String,
    pub want: Want,
    pub lifestyle: Lifestyle,
    pub target_weight: f64,
    pub target_workouts_weeks: u32,
    pub target_calories_daily: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewExercise {
    pub level: LevelPreparation,
    pub name: String,
    pub exercise_type: ExerciseType,
    #[serde(default)]
    pub description: String,
    pub base_count_reps: u32,
    pub steps: u32,
    #[serde(default)]
    pub link_gif: String,
    pub place: PlaceExercise,
    pub avg_calories_per: f64,
    #[serde(default)]
    pub base_relax_secs: u32,
}

fn validate_weight(entity: &'static str, value: f64) -> Result<(), DomainError> {
    if !value.is_finite() || value <= 0.0 {
        return Err(DomainError::invalid(entity, format!("weight must be positive, got {value}")));
    }
    Ok(())
}

pub struct ProfileService {
    repos: Repositories,
    tx: Arc<dyn TransactionManager>,
    clock: Arc<dyn Clock>,
    ids: Arc<dyn IdGenerator>,
}

impl ProfileService {
    pub fn new(
        repos: Repositories,
        tx: Arc<dyn TransactionManager>,
        clock: Arc<dyn Clock>,
        ids: Arc<dyn IdGenerator>,
    ) -> Self {
        Self { repos, tx, clock, ids }
    }

    // ---- users ----

    pub async fn register_user(&self, new: NewUser) -> Result<UserInfo, DomainError> {
        if new.username.trim().is_empty() {
            return Err(DomainError::invalid("user info", "username must not be empty"));
        }

        let info = UserInfo {
            id: self.ids.user_id(),
            username: new.username,
            name: new.name,
            surname: new.surname,
            password_hash: new.password_hash,
            email: new.email,
            phone: new.phone,
            created_at: self.clock.now(),
        };
        self.repos.user_info.create(&info).await.context("register user")?;

        tracing::info!(user_id = %info.id, username = %info.username, "user registered");
        Ok(info)
    }

    pub async fn get_user(&self, id: UserId) -> Result<UserInfo, DomainError> {
        self.repos.user_info.get(&UserInfoFilter::by_id(id)).await
    }

    pub async fn update_user(&self, id: UserId, update: UserInfoUpdate) -> Result<UserInfo, DomainError> {
        let mut info = self.get_user(id).await?;
        info.apply(update);
        self.repos.user_info.update(&info).await.context("update user")?;
        Ok(info)
    }

    pub async fn delete_user(&self, id: UserId) -> Result<(), DomainError> {
        self.repos.user_info.delete(id).await
    }

    // ---- params ----

    /// Profile with `current_weight` taken from the newest weight entry.
    pub async fn get_params(&self, user_id: UserId) -> Result<UserParams, DomainError> {
        let mut params = self
            .repos
            .user_params
            .get(&UserParamsFilter::by_user(user_id))
            .await
            .context("get user params")?;

        params.current_weight = self.latest_weight(user_id).await?;
        Ok(params)
    }

    async fn latest_weight(&self, user_id: UserId) -> Result<Option<f64>, DomainError> {
        let weights = self
            .repos
            .user_weights
            .list(&UserWeightFilter::by_user(user_id))
            .await
            .context("list user weights")?;
        Ok(weights.first().map(|w| w.weight))
    }

    pub async fn create_params(&self, user_id: UserId, new: NewUserParams) -> Result<UserParams, DomainError> {
        self.get_user(user_id).await.context("create user params")?;
        validate_weight("user params", new.target_weight)?;

        let params = UserParams {
            id: self.ids.params_id(),
            user_id,
            height: new.height,
            photo: new.photo,
            want: new.want,
            lifestyle: new.lifestyle,
            target_weight: new.target_weight,
            target_workouts_weeks: new.target_workouts_weeks,
            target_calories_daily: new.target_calories_daily,
            current_weight: None,
        };
        self.repos.user_params.create(&params).await.context("create user params")?;
        Ok(params)
    }

    pub async fn update_params(&self, user_id: UserId, update: UserParamsUpdate) -> Result<UserParams, DomainError> {
        if let Some(target) = update.target_weight {
            validate_weight("user params", target)?;
        }

        let mut params = self
            .repos
            .user_params
            .get(&UserParamsFilter::by_user(user_id))
            .await
            .context("get user params")?;
        params.apply(update);
        self.repos.user_params.update(&params).await.context("update user params")?;

        params.current_weight = self.latest_weight(user_id).await?;
        Ok(params)
    }

    pub async fn delete_params(&self, user_id: UserId) -> Result<(), DomainError> {
        self.repos.user_params.delete(&UserParamsFilter::by_user(user_id)).await
    }

    // ---- weights ----

    pub async fn add_weight(
        &self,
        user_id: UserId,
        weight: f64,
        date: Option<DateTime<Utc>>,
    ) -> Result<UserWeight, DomainError> {
        validate_weight("user weight", weight)?;

        let entry = UserWeight {
            id: self.ids.weight_id(),
            user_id,
            weight,
            date: date.unwrap_or_else(|| self.clock.now()),
        };
        self.repos.user_weights.create(&entry).await.context("add weight")?;
        Ok(entry)
    }

    /// Newest first.
    pub async fn list_weights(&self, user_id: UserId) -> Result<Vec<UserWeight>, DomainError> {
        self.repos.user_weights.list(&UserWeightFilter::by_user(user_id)).await
    }

    pub async fn update_weight(&self, id: WeightId, update: UserWeightUpdate) -> Result<UserWeight, DomainError> {
        if let Some(weight) = update.weight {
            validate_weight("user weight", weight)?;
        }

        let filter = UserWeightFilter {
            id: Some(id),
            ..Default::default()
        };
        let mut entry = self.repos.user_weights.get(&filter).await?;
        entry.apply(update);
        self.repos.user_weights.update(&entry).await.context("update weight")?;
        Ok(entry)
    }

    pub async fn delete_weight(&self, id: WeightId) -> Result<(), DomainError> {
        self.repos.user_weights.delete(id).await
    }

    // ---- exercises ----

    pub async fn create_exercise(&self, new: NewExercise) -> Result<Exercise, DomainError> {
        let exercise = Exercise {
            id: self.ids.exercise_id(),
            level: new.level,
            name: new.name,
            exercise_type: new.exercise_type,
            description: new.description,
            base_count_reps: new.base_count_reps,
            steps: new.steps,
            link_gif: new.link_gif,
            place: new.place,
            avg_calories_per: new.avg_calories_per,
            base_relax_secs: new.base_relax_secs,
        };
        exercise.validate()?;
        self.repos.exercises.create(&exercise).await.context("create exercise")?;
        Ok(exercise)
    }

    pub async fn get_exercise(&self, id: ExerciseId) -> Result<Exercise, DomainError> {
        self.repos.exercises.get(&ExerciseFilter::by_id(id)).await
    }

    pub async fn list_exercises(&self, filter: &ExerciseFilter) -> Result<Vec<Exercise>, DomainError> {
        self.repos.exercises.list(filter).await
    }

    pub async fn update_exercise(&self, id: ExerciseId, update: ExerciseUpdate) -> Result<Exercise, DomainError> {
        let mut exercise = self.get_exercise(id).await?;
        exercise.apply(update)?;
        self.repos.exercises.update(&exercise).await.context("update exercise")?;
        Ok(exercise)
    }

    pub async fn delete_exercise(&self, id: ExerciseId) -> Result<(), DomainError> {
        self.repos.exercises.delete(id).await
    }

    // ---- workouts ----

    /// Newest first.
    pub async fn list_workouts(&self, user_id: UserId) -> Result<Vec<Workout>, DomainError> {
        self.repos
            .workouts
            .top_list_with_limit(&WorkoutsFilter::by_user(user_id), usize::MAX)
            .await
    }

    pub async fn get_workout(&self, id: WorkoutId) -> Result<Workout, DomainError> {
        self.repos.workouts.get(&WorkoutsFilter::by_id(id)).await
    }

    /// Created -> InActive. Refused while the user has another workout in
    /// progress.
    pub async fn start_workout(&self, id: WorkoutId) -> Result<Workout, DomainError> {
        let now = self.clock.now();
        let mut started = None;
        let slot = &mut started;

        self.tx
            .run(Box::pin(async move {
                let mut workout = self.get_workout(id).await?;

                let active = WorkoutsFilter {
                    user_id: Some(workout.user_id),
                    status: Some(WorkoutStatus::InActive),
                    ..Default::default()
                };
                match self.repos.workouts.get(&active).await {
                    Ok(other) if other.id != id => {
                        return Err(DomainError::already_exists("active workout", other.id));
                    }
                    Ok(_) => {}
                    Err(e) if e.is_not_found() => {}
                    Err(e) => return Err(e.context("check active workouts")),
                }

                workout.start(now)?;
                self.repos.workouts.update(&workout).await.context("start workout")?;
                *slot = Some(workout);
                Ok(())
            }))
            .await?;

        started.ok_or_else(|| DomainError::Infrastructure("start workout produced no result".into()))
    }

    pub async fn finish_workout(&self, id: WorkoutId, total_calories: u32) -> Result<Workout, DomainError> {
        let mut workout = self.get_workout(id).await?;
        workout.finish(total_calories, self.clock.now())?;
        self.repos.workouts.update(&workout).await.context("finish workout")?;
        Ok(workout)
    }

    pub async fn fail_workout(&self, id: WorkoutId) -> Result<Workout, DomainError> {
        let mut workout = self.get_workout(id).await?;
        workout.fail(self.clock.now())?;
        self.repos.workouts.update(&workout).await.context("fail workout")?;
        Ok(workout)
    }

    // ---- tasks ----

    pub async fn list_tasks(&self, filter: &TasksFilter) -> Result<Vec<Task>, DomainError> {
        self.repos.tasks.list(filter).await
    }

    /// Put a task back to running with a fresh attempt budget.
    pub async fn restart_task(&self, id: TaskId) -> Result<Task, DomainError> {
        let now = self.clock.now();
        let mut restarted = None;
        let slot = &mut restarted;

        self.tx
            .run(Box::pin(async move {
                let mut task = self.repos.tasks.get(&TasksFilter::by_id(id)).await?;
                task.restart(now);
                self.repos.tasks.update(&task).await.context("restart task")?;
                *slot = Some(task);
                Ok(())
            }))
            .await?;

        tracing::info!(task_id = %id, "task restarted");
        restarted.ok_or_else(|| DomainError::Infrastructure("restart task produced no result".into()))
    }

    pub async fn delete_tasks(&self, ids: &[TaskId]) -> Result<(), DomainError> {
        self.repos.tasks.delete(ids).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::workout::fixtures::workout;
    use crate::domain::{ErrorKind, TaskPayload, TaskState, TaskType};
    use crate::impls::{InMemoryStore, InMemoryTransactionManager};
    use crate::ports::{FixedClock, UlidGenerator};
    use chrono::{Duration, TimeZone};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 15, 18, 0, 0).unwrap()
    }

    fn service() -> (ProfileService, Arc<FixedClock>) {
        let store = InMemoryStore::new();
        let clock = Arc::new(FixedClock::new(t0()));
        let service = ProfileService::new(
            InMemoryStore::repositories(&store),
            Arc::new(InMemoryTransactionManager::new(Arc::clone(&store))),
            clock.clone(),
            Arc::new(UlidGenerator::new(clock.clone())),
        );
        (service, clock)
    }

    fn new_user(username: &str) -> NewUser {
        NewUser {
            username: username.into(),
            name: "Thomas".into(),
            surname: "Anderson".into(),
            password_hash: "hash".into(),
            email: format!("{username}@example.com"),
            phone: "+100".into(),
        }
    }

    fn new_params() -> NewUserParams {
        NewUserParams {
            height: 182,
            photo: String::new(),
            want: Want::LoseWeight,
            lifestyle: Lifestyle::Active,
            target_weight: 78.0,
            target_workouts_weeks: 3,
            target_calories_daily: 2100,
        }
    }

    fn new_exercise(name: &str) -> NewExercise {
        NewExercise {
            level: LevelPreparation::Beginner,
            name: name.into(),
            exercise_type: ExerciseType::LowerBody,
            description: String::new(),
            base_count_reps: 12,
            steps: 3,
            link_gif: String::new(),
            place: PlaceExercise::Home,
            avg_calories_per: 0.4,
            base_relax_secs: 0,
        }
    }

    #[tokio::test]
    async fn usernames_are_unique() {
        let (svc, _) = service();
        svc.register_user(new_user("neo")).await.unwrap();

        let err = svc.register_user(new_user("neo")).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Conflict);
    }

    #[tokio::test]
    async fn one_params_row_per_user() {
        let (svc, _) = service();
        let user = svc.register_user(new_user("neo")).await.unwrap();
        svc.create_params(user.id, new_params()).await.unwrap();

        let err = svc.create_params(user.id, new_params()).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Conflict);
    }

    #[tokio::test]
    async fn params_for_unknown_user_are_rejected() {
        let (svc, _) = service();

        let err = svc
            .create_params(UserId::from_ulid(ulid::Ulid::new()), new_params())
            .await
            .unwrap_err();

        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn current_weight_comes_from_the_latest_entry() {
        let (svc, _) = service();
        let user = svc.register_user(new_user("neo")).await.unwrap();
        svc.create_params(user.id, new_params()).await.unwrap();

        assert_eq!(svc.get_params(user.id).await.unwrap().current_weight, None);

        svc.add_weight(user.id, 84.0, Some(t0() - Duration::days(10))).await.unwrap();
        svc.add_weight(user.id, 81.5, Some(t0() - Duration::days(1))).await.unwrap();
        svc.add_weight(user.id, 83.0, Some(t0() - Duration::days(5))).await.unwrap();

        assert_eq!(svc.get_params(user.id).await.unwrap().current_weight, Some(81.5));
        let history: Vec<f64> = svc.list_weights(user.id).await.unwrap().iter().map(|w| w.weight).collect();
        assert_eq!(history, vec![81.5, 83.0, 84.0]);
    }

    #[tokio::test]
    async fn non_positive_weight_is_invalid() {
        let (svc, _) = service();
        let user = svc.register_user(new_user("neo")).await.unwrap();

        let err = svc.add_weight(user.id, 0.0, None).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[tokio::test]
    async fn exercise_names_are_unique_and_numbers_validated() {
        let (svc, _) = service();
        svc.create_exercise(new_exercise("squat")).await.unwrap();

        let dup = svc.create_exercise(new_exercise("squat")).await.unwrap_err();
        assert_eq!(dup.kind(), ErrorKind::Conflict);

        let mut bad = new_exercise("lunge");
        bad.avg_calories_per = -0.1;
        let invalid = svc.create_exercise(bad).await.unwrap_err();
        assert_eq!(invalid.kind(), ErrorKind::Validation);
    }

    #[tokio::test]
    async fn renaming_onto_an_existing_exercise_conflicts() {
        let (svc, _) = service();
        svc.create_exercise(new_exercise("squat")).await.unwrap();
        let lunge = svc.create_exercise(new_exercise("lunge")).await.unwrap();

        let err = svc
            .update_exercise(
                lunge.id,
                ExerciseUpdate {
                    name: Some("squat".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Conflict);
        assert_eq!(svc.get_exercise(lunge.id).await.unwrap().name, "lunge");
    }

    #[tokio::test]
    async fn only_one_workout_in_progress_per_user() {
        let (svc, clock) = service();
        let user = svc.register_user(new_user("neo")).await.unwrap();
        let first = workout(user.id, WorkoutStatus::Created, t0() - Duration::days(1));
        let second = workout(user.id, WorkoutStatus::Created, t0());
        svc.repos.workouts.create(&first).await.unwrap();
        svc.repos.workouts.create(&second).await.unwrap();

        let started = svc.start_workout(first.id).await.unwrap();
        assert_eq!(started.status, WorkoutStatus::InActive);

        let err = svc.start_workout(second.id).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);
        assert_eq!(svc.get_workout(second.id).await.unwrap().status, WorkoutStatus::Created);

        clock.advance(Duration::minutes(45));
        let done = svc.finish_workout(first.id, 320).await.unwrap();
        assert_eq!(done.status, WorkoutStatus::Done);
        assert_eq!(done.total_calories, 320);
        assert_eq!(done.updated_at, t0() + Duration::minutes(45));

        svc.start_workout(second.id).await.unwrap();
        svc.fail_workout(second.id).await.unwrap();
        assert_eq!(svc.get_workout(second.id).await.unwrap().status, WorkoutStatus::Failed);
    }

    #[tokio::test]
    async fn restart_brings_a_failed_task_back() {
        let (svc, clock) = service();
        let mut task = Task::new(
            TaskId::from_ulid(ulid::Ulid::new()),
            TaskType::SendCodeOnEmail,
            1,
            TaskPayload::VerificationCode {
                user_id: UserId::from_ulid(ulid::Ulid::new()),
                destination: "neo@example.com".into(),
                code: "424242".into(),
            },
            t0(),
        )
        .unwrap();
        task.record_failure(t0(), &mut StdRng::seed_from_u64(1));
        assert!(task.is_failed());
        svc.repos.tasks.create(&task).await.unwrap();

        clock.advance(Duration::hours(1));
        let restarted = svc.restart_task(task.id()).await.unwrap();

        assert_eq!(restarted.state(), TaskState::Running);
        assert_eq!(restarted.attempts(), 0);
        assert_eq!(restarted.retry_at(), t0() + Duration::hours(1));
        let stored = svc.list_tasks(&TasksFilter::by_id(task.id())).await.unwrap();
        assert_eq!(stored, vec![restarted]);

        svc.delete_tasks(&[task.id()]).await.unwrap();
        assert!(svc.list_tasks(&TasksFilter::default()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn restarting_a_missing_task_is_not_found() {
        let (svc, _) = service();

        let err = svc.restart_task(TaskId::from_ulid(ulid::Ulid::new())).await.unwrap_err();

        assert!(err.is_not_found());
    }
}
