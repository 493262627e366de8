//! Periodic workout generation.
//!
//! Every tick walks all user profiles in listing order. For each user it
//! analyzes recent history, and unless the user must be skipped, picks
//! exercises from the catalog, plans a workout, and stores it together
//! with a notification task in one transaction.

use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use rand::SeedableRng;
use rand::rngs::StdRng;
use tokio::sync::watch;

use super::analyzer::WorkoutAnalyzer;
use super::config::{AnalyzerConfig, SchedulerConfig, SelectorConfig};
use super::planner::WorkoutPlanner;
use super::selector::ExerciseSelector;
use super::worker::{PeriodicJob, WorkerHandle, spawn_periodic};
use crate::domain::{
    DomainError, ExerciseFilter, ResultExt, Task, TaskPayload, TaskType, UserInfoFilter, UserParams,
    UserParamsFilter, WorkoutsFilter,
};
use crate::ports::{Clock, IdGenerator, Repositories, TransactionManager};

pub const NEW_WORKOUT_MESSAGE: &str = "new workout in your profile";

/// What one tick did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    pub processed: usize,
    pub generated: usize,
    pub skipped: usize,
    pub failed: usize,
}

enum UserOutcome {
    Generated,
    Skipped,
}

pub struct WorkoutScheduler {
    repos: Repositories,
    tx: Arc<dyn TransactionManager>,
    clock: Arc<dyn Clock>,
    ids: Arc<dyn IdGenerator>,
    config: SchedulerConfig,
    analyzer: WorkoutAnalyzer,
    selector: ExerciseSelector,
    planner: WorkoutPlanner,
    rng: Mutex<StdRng>,
}

impl WorkoutScheduler {
    pub fn new(
        repos: Repositories,
        tx: Arc<dyn TransactionManager>,
        clock: Arc<dyn Clock>,
        ids: Arc<dyn IdGenerator>,
        config: SchedulerConfig,
    ) -> Self {
        let rng = match config.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Self {
            repos,
            tx,
            clock,
            ids,
            config,
            analyzer: WorkoutAnalyzer::default(),
            selector: ExerciseSelector::default(),
            planner: WorkoutPlanner,
            rng: Mutex::new(rng),
        }
    }

    pub fn with_analyzer(mut self, config: AnalyzerConfig) -> Self {
        self.analyzer = WorkoutAnalyzer::new(config);
        self
    }

    pub fn with_selector(mut self, config: SelectorConfig) -> Self {
        self.selector = ExerciseSelector::new(config);
        self
    }

    /// Run in the background until the returned handle is stopped.
    pub fn start(self) -> WorkerHandle {
        let interval = self.config.interval();
        spawn_periodic(Arc::new(self), interval)
    }

    /// One full pass over all users.
    pub async fn run_tick(&self) -> TickReport {
        self.process_users(None).await
    }

    async fn process_users(&self, shutdown: Option<&watch::Receiver<bool>>) -> TickReport {
        let mut report = TickReport::default();

        let all_params = match self.repos.user_params.list(&UserParamsFilter::default()).await {
            Ok(all) => all,
            Err(e) => {
                tracing::error!(error = %e, "failed to list user params");
                return report;
            }
        };

        for params in &all_params {
            if shutdown.is_some_and(|rx| *rx.borrow()) {
                tracing::info!(remaining = all_params.len() - report.processed, "shutdown requested, tick cut short");
                break;
            }

            report.processed += 1;
            match self.process_user(params).await {
                Ok(UserOutcome::Generated) => report.generated += 1,
                Ok(UserOutcome::Skipped) => report.skipped += 1,
                Err(e) => {
                    report.failed += 1;
                    tracing::error!(user_id = %params.user_id, error = %e, "workout generation failed");
                }
            }
        }

        report
    }

    async fn process_user(&self, params: &UserParams) -> Result<UserOutcome, DomainError> {
        let user_id = params.user_id;
        let now = self.clock.now();

        let user = self
            .repos
            .user_info
            .get(&UserInfoFilter::by_id(user_id))
            .await
            .context("get user info")?;

        let recent = self
            .repos
            .workouts
            .top_list_with_limit(&WorkoutsFilter::by_user(user_id), self.analyzer.history_limit())
            .await
            .context("list recent workouts")?;

        let stats = self.analyzer.analyze(user_id, &recent, now);
        if stats.skip {
            tracing::info!(
                user_id = %user_id,
                reason = stats.skip_reason.as_deref().unwrap_or_default(),
                "user skipped"
            );
            return Ok(UserOutcome::Skipped);
        }

        let filter = ExerciseFilter {
            level: Some(params.level_preparation()),
            place: Some(stats.popular_place),
            ..Default::default()
        };
        let pool = self.repos.exercises.list(&filter).await.context("list exercises")?;
        if pool.is_empty() {
            tracing::warn!(
                user_id = %user_id,
                level = %params.level_preparation(),
                place = %stats.popular_place,
                "no exercises for user level and place"
            );
            return Ok(UserOutcome::Skipped);
        }

        let selected = {
            let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
            self.selector.select(
                &pool,
                stats.popular_exercise_type,
                self.selector.default_count(),
                &mut *rng,
            )
        };

        let workout = self.planner.plan(self.ids.workout_id(), params, &stats, &selected, now);
        let task = Task::new(
            self.ids.task_id(),
            TaskType::SendNotificationPhone,
            self.config.max_retry_send_notification,
            TaskPayload::WorkoutNotification {
                user_id,
                workout_id: workout.id,
                message: NEW_WORKOUT_MESSAGE.to_string(),
            },
            now,
        )?;

        self.tx
            .run(Box::pin(async {
                self.repos.workouts.create(&workout).await.context("create workout")?;
                self.repos.tasks.create(&task).await.context("create notification task")
            }))
            .await?;

        tracing::info!(
            user_id = %user_id,
            username = %user.username,
            workout_id = %workout.id,
            task_id = %task.id(),
            exercises = workout.exercises.len(),
            prediction_calories = workout.prediction_calories,
            "workout generated"
        );
        Ok(UserOutcome::Generated)
    }
}

#[async_trait]
impl PeriodicJob for WorkoutScheduler {
    fn name(&self) -> &'static str {
        "workout-scheduler"
    }

    async fn tick(&self, shutdown: &watch::Receiver<bool>) {
        let report = self.process_users(Some(shutdown)).await;
        tracing::debug!(
            processed = report.processed,
            generated = report.generated,
            skipped = report.skipped,
            failed = report.failed,
            "scheduler tick finished"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::exercise::fixtures::exercise;
    use crate::domain::user::fixtures::{params, user_info};
    use crate::domain::workout::fixtures::workout;
    use crate::domain::{
        ExerciseType, Lifestyle, PlaceExercise, TaskId, TaskState, TasksFilter, UserId, WorkoutStatus,
    };
    use crate::impls::{InMemoryStore, InMemoryTransactionManager};
    use crate::ports::{FixedClock, TasksRepository, UlidGenerator};
    use chrono::{DateTime, Duration, TimeZone, Utc};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 15, 18, 0, 0).unwrap()
    }

    struct Fixture {
        repos: Repositories,
        store: Arc<InMemoryStore>,
        clock: Arc<FixedClock>,
    }

    impl Fixture {
        async fn new() -> Self {
            let store = InMemoryStore::new();
            let repos = InMemoryStore::repositories(&store);
            for (i, exercise_type) in [ExerciseType::UpperBody, ExerciseType::Cardio, ExerciseType::LowerBody]
                .into_iter()
                .cycle()
                .take(8)
                .enumerate()
            {
                repos
                    .exercises
                    .create(&exercise(&format!("home-{i}"), exercise_type, PlaceExercise::Home))
                    .await
                    .unwrap();
            }

            Self {
                repos,
                store,
                clock: Arc::new(FixedClock::new(t0())),
            }
        }

        async fn user(&self, username: &str) -> UserId {
            let info = user_info(username);
            self.repos.user_info.create(&info).await.unwrap();
            self.repos
                .user_params
                .create(&params(info.id, Lifestyle::NotActive))
                .await
                .unwrap();
            info.id
        }

        fn scheduler(&self) -> WorkoutScheduler {
            self.scheduler_with(self.repos.clone())
        }

        fn scheduler_with(&self, repos: Repositories) -> WorkoutScheduler {
            WorkoutScheduler::new(
                repos,
                Arc::new(InMemoryTransactionManager::new(Arc::clone(&self.store))),
                self.clock.clone(),
                Arc::new(UlidGenerator::new(self.clock.clone())),
                SchedulerConfig {
                    rng_seed: Some(7),
                    ..Default::default()
                },
            )
        }

        async fn workouts_of(&self, user: UserId) -> Vec<crate::domain::Workout> {
            self.repos
                .workouts
                .top_list_with_limit(&WorkoutsFilter::by_user(user), usize::MAX)
                .await
                .unwrap()
        }
    }

    #[tokio::test]
    async fn fresh_user_gets_a_workout_and_a_notification_task() {
        let fx = Fixture::new().await;
        let user = fx.user("neo").await;

        let report = fx.scheduler().run_tick().await;

        assert_eq!(
            report,
            TickReport {
                processed: 1,
                generated: 1,
                skipped: 0,
                failed: 0
            }
        );

        let workouts = fx.workouts_of(user).await;
        assert_eq!(workouts.len(), 1);
        let w = &workouts[0];
        assert_eq!(w.status, WorkoutStatus::Created);
        assert_eq!(w.exercises.len(), 5);
        assert_eq!(w.place, PlaceExercise::Home);
        assert_eq!(w.created_at, t0());

        let tasks = fx.repos.tasks.list(&TasksFilter::default()).await.unwrap();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].task_type(), &TaskType::SendNotificationPhone);
        assert_eq!(tasks[0].state(), TaskState::Running);
        assert_eq!(tasks[0].max_attempts(), 5);
        assert_eq!(
            tasks[0].payload(),
            &TaskPayload::WorkoutNotification {
                user_id: user,
                workout_id: w.id,
                message: NEW_WORKOUT_MESSAGE.into(),
            }
        );
    }

    #[tokio::test]
    async fn user_with_active_workout_is_skipped() {
        let fx = Fixture::new().await;
        let user = fx.user("trinity").await;
        fx.repos
            .workouts
            .create(&workout(user, WorkoutStatus::InActive, t0() - Duration::days(3)))
            .await
            .unwrap();

        let report = fx.scheduler().run_tick().await;

        assert_eq!(report.skipped, 1);
        assert_eq!(report.generated, 0);
        assert_eq!(fx.workouts_of(user).await.len(), 1);
    }

    #[tokio::test]
    async fn second_tick_respects_the_rest_window() {
        let fx = Fixture::new().await;
        let user = fx.user("morpheus").await;
        let scheduler = fx.scheduler();

        assert_eq!(scheduler.run_tick().await.generated, 1);

        fx.clock.advance(Duration::hours(1));
        assert_eq!(scheduler.run_tick().await.skipped, 1);

        fx.clock.advance(Duration::hours(8));
        assert_eq!(scheduler.run_tick().await.generated, 1);
        assert_eq!(fx.workouts_of(user).await.len(), 2);
    }

    #[tokio::test]
    async fn failing_user_does_not_stop_the_others() {
        let fx = Fixture::new().await;
        // params without a matching user info row
        fx.repos
            .user_params
            .create(&params(UserId::from_ulid(ulid::Ulid::new()), Lifestyle::Active))
            .await
            .unwrap();
        let user = fx.user("switch").await;

        let report = fx.scheduler().run_tick().await;

        assert_eq!(report.processed, 2);
        assert_eq!(report.failed, 1);
        assert_eq!(report.generated, 1);
        assert_eq!(fx.workouts_of(user).await.len(), 1);
    }

    #[tokio::test]
    async fn empty_catalog_for_level_skips_the_user() {
        let fx = Fixture::new().await;
        let info = user_info("tank");
        fx.repos.user_info.create(&info).await.unwrap();
        // sportsman level, catalog only has beginner exercises
        fx.repos
            .user_params
            .create(&params(info.id, Lifestyle::Sportive))
            .await
            .unwrap();

        let report = fx.scheduler().run_tick().await;

        assert_eq!(report.skipped, 1);
        assert!(fx.workouts_of(info.id).await.is_empty());
    }

    struct BrokenTasks;

    #[async_trait]
    impl TasksRepository for BrokenTasks {
        async fn get(&self, _: &TasksFilter) -> Result<Task, DomainError> {
            Err(DomainError::Infrastructure("tasks table is gone".into()))
        }
        async fn list(&self, _: &TasksFilter) -> Result<Vec<Task>, DomainError> {
            Err(DomainError::Infrastructure("tasks table is gone".into()))
        }
        async fn create(&self, _: &Task) -> Result<(), DomainError> {
            Err(DomainError::Infrastructure("tasks table is gone".into()))
        }
        async fn update(&self, _: &Task) -> Result<(), DomainError> {
            Err(DomainError::Infrastructure("tasks table is gone".into()))
        }
        async fn delete(&self, _: &[TaskId]) -> Result<(), DomainError> {
            Err(DomainError::Infrastructure("tasks table is gone".into()))
        }
    }

    #[tokio::test]
    async fn workout_is_not_kept_when_its_task_cannot_be_stored() {
        let fx = Fixture::new().await;
        let user = fx.user("dozer").await;
        let repos = Repositories {
            tasks: Arc::new(BrokenTasks),
            ..fx.repos.clone()
        };

        let report = fx.scheduler_with(repos).run_tick().await;

        assert_eq!(report.failed, 1);
        assert!(fx.workouts_of(user).await.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn started_scheduler_ticks_and_stops() {
        let fx = Fixture::new().await;
        let user = fx.user("apoc").await;
        let handle = fx.scheduler().start();

        tokio::time::sleep(std::time::Duration::from_secs(61)).await;
        handle.stop().await;

        assert_eq!(fx.workouts_of(user).await.len(), 1);
    }
}
