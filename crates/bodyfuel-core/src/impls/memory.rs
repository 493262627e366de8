//! In-memory storage adapters.
//!
//! All repositories share one [`InMemoryStore`]. Each operation takes the
//! state lock for its own duration only, so no lock is held across an
//! `.await` in caller code.
//!
//! While a transaction is open, operations issued outside it wait for it
//! to commit or roll back. They never see its uncommitted writes and a
//! rollback never touches their writes.

use std::collections::BTreeMap;
use std::ops::{Deref, DerefMut};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Mutex, MutexGuard};

use crate::domain::{
    DomainError, Exercise, ExerciseFilter, ExerciseId, Task, TaskId, TasksFilter, UserId, UserInfo,
    UserInfoFilter, UserParams, UserParamsFilter, UserParamsId, UserWeight, UserWeightFilter, WeightId,
    Workout, WorkoutId, WorkoutsFilter,
};
use crate::ports::{
    ExerciseRepository, Repositories, TasksRepository, TransactionManager, TxFuture, UserInfoRepository,
    UserParamsRepository, UserWeightRepository, WorkoutsRepository,
};

/// Everything the store holds. Keyed by ULID ids, so iteration order is
/// creation order.
#[derive(Debug, Clone, Default)]
struct StoreState {
    user_info: BTreeMap<UserId, UserInfo>,
    user_params: BTreeMap<UserParamsId, UserParams>,
    user_weights: BTreeMap<WeightId, UserWeight>,
    workouts: BTreeMap<WorkoutId, Workout>,
    exercises: BTreeMap<ExerciseId, Exercise>,
    tasks: BTreeMap<TaskId, Task>,
}

#[derive(Debug, Default)]
pub struct InMemoryStore {
    state: Mutex<StoreState>,
    /// Serializes transactions so that a rollback never discards the
    /// writes of another transaction.
    tx_lock: Mutex<()>,
}

tokio::task_local! {
    /// Address of the store whose transaction the current task is running.
    static OPEN_TRANSACTION: usize;
}

/// State access for one repository operation.
struct StateGuard<'a> {
    state: MutexGuard<'a, StoreState>,
    _tx: Option<MutexGuard<'a, ()>>,
}

impl Deref for StateGuard<'_> {
    type Target = StoreState;

    fn deref(&self) -> &StoreState {
        &self.state
    }
}

impl DerefMut for StateGuard<'_> {
    fn deref_mut(&mut self) -> &mut StoreState {
        &mut self.state
    }
}

impl InMemoryStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn addr(&self) -> usize {
        self as *const Self as usize
    }

    fn in_transaction(&self) -> bool {
        OPEN_TRANSACTION.try_with(|addr| *addr == self.addr()).unwrap_or(false)
    }

    /// Inside this store's transaction the state is locked directly;
    /// outside it the caller first waits for any open transaction.
    async fn lock(&self) -> StateGuard<'_> {
        let tx = if self.in_transaction() {
            None
        } else {
            Some(self.tx_lock.lock().await)
        };
        StateGuard {
            state: self.state.lock().await,
            _tx: tx,
        }
    }

    /// One repository handle per port, all backed by `store`.
    pub fn repositories(store: &Arc<Self>) -> Repositories {
        Repositories {
            user_params: Arc::new(InMemoryUserParamsRepository::new(Arc::clone(store))),
            user_info: Arc::new(InMemoryUserInfoRepository::new(Arc::clone(store))),
            user_weights: Arc::new(InMemoryUserWeightRepository::new(Arc::clone(store))),
            workouts: Arc::new(InMemoryWorkoutsRepository::new(Arc::clone(store))),
            exercises: Arc::new(InMemoryExerciseRepository::new(Arc::clone(store))),
            tasks: Arc::new(InMemoryTasksRepository::new(Arc::clone(store))),
        }
    }
}

fn first_match<'a, T: Clone + 'a>(
    items: impl IntoIterator<Item = &'a T>,
    pred: impl Fn(&T) -> bool,
    entity: &'static str,
    key: impl FnOnce() -> String,
) -> Result<T, DomainError> {
    items
        .into_iter()
        .find(|item| pred(item))
        .cloned()
        .ok_or_else(|| DomainError::not_found(entity, key()))
}

macro_rules! in_memory_repository {
    ($name:ident) => {
        pub struct $name {
            store: Arc<InMemoryStore>,
        }

        impl $name {
            pub fn new(store: Arc<InMemoryStore>) -> Self {
                Self { store }
            }
        }
    };
}

in_memory_repository!(InMemoryUserParamsRepository);
in_memory_repository!(InMemoryUserInfoRepository);
in_memory_repository!(InMemoryUserWeightRepository);
in_memory_repository!(InMemoryWorkoutsRepository);
in_memory_repository!(InMemoryExerciseRepository);
in_memory_repository!(InMemoryTasksRepository);

#[async_trait]
impl UserParamsRepository for InMemoryUserParamsRepository {
    async fn get(&self, filter: &UserParamsFilter) -> Result<UserParams, DomainError> {
        let state = self.store.lock().await;
        first_match(state.user_params.values(), |p| filter.matches(p), "user params", || {
            format!("{filter:?}")
        })
    }

    async fn list(&self, filter: &UserParamsFilter) -> Result<Vec<UserParams>, DomainError> {
        let state = self.store.lock().await;
        Ok(state.user_params.values().filter(|p| filter.matches(p)).cloned().collect())
    }

    async fn create(&self, params: &UserParams) -> Result<(), DomainError> {
        let mut state = self.store.lock().await;
        if state.user_params.values().any(|p| p.user_id == params.user_id) {
            return Err(DomainError::already_exists("user params", params.user_id));
        }
        state.user_params.insert(params.id, params.clone());
        Ok(())
    }

    async fn update(&self, params: &UserParams) -> Result<(), DomainError> {
        let mut state = self.store.lock().await;
        let slot = state
            .user_params
            .get_mut(&params.id)
            .ok_or_else(|| DomainError::not_found("user params", params.id))?;
        *slot = params.clone();
        Ok(())
    }

    async fn delete(&self, filter: &UserParamsFilter) -> Result<(), DomainError> {
        let mut state = self.store.lock().await;
        state.user_params.retain(|_, p| !filter.matches(p));
        Ok(())
    }
}

#[async_trait]
impl UserInfoRepository for InMemoryUserInfoRepository {
    async fn get(&self, filter: &UserInfoFilter) -> Result<UserInfo, DomainError> {
        let state = self.store.lock().await;
        first_match(state.user_info.values(), |u| filter.matches(u), "user info", || {
            format!("{filter:?}")
        })
    }

    async fn list(&self, filter: &UserInfoFilter) -> Result<Vec<UserInfo>, DomainError> {
        let state = self.store.lock().await;
        Ok(state.user_info.values().filter(|u| filter.matches(u)).cloned().collect())
    }

    async fn create(&self, info: &UserInfo) -> Result<(), DomainError> {
        let mut state = self.store.lock().await;
        if state.user_info.contains_key(&info.id) {
            return Err(DomainError::already_exists("user info", info.id));
        }
        if state.user_info.values().any(|u| u.username == info.username) {
            return Err(DomainError::already_exists("user info", &info.username));
        }
        state.user_info.insert(info.id, info.clone());
        Ok(())
    }

    async fn update(&self, info: &UserInfo) -> Result<(), DomainError> {
        let mut state = self.store.lock().await;
        if state
            .user_info
            .values()
            .any(|u| u.id != info.id && u.username == info.username)
        {
            return Err(DomainError::already_exists("user info", &info.username));
        }
        let slot = state
            .user_info
            .get_mut(&info.id)
            .ok_or_else(|| DomainError::not_found("user info", info.id))?;
        *slot = info.clone();
        Ok(())
    }

    async fn delete(&self, id: UserId) -> Result<(), DomainError> {
        let mut state = self.store.lock().await;
        state
            .user_info
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| DomainError::not_found("user info", id))
    }
}

#[async_trait]
impl UserWeightRepository for InMemoryUserWeightRepository {
    async fn get(&self, filter: &UserWeightFilter) -> Result<UserWeight, DomainError> {
        let state = self.store.lock().await;
        first_match(state.user_weights.values(), |w| filter.matches(w), "user weight", || {
            format!("{filter:?}")
        })
    }

    async fn list(&self, filter: &UserWeightFilter) -> Result<Vec<UserWeight>, DomainError> {
        let state = self.store.lock().await;
        let mut weights: Vec<UserWeight> =
            state.user_weights.values().filter(|w| filter.matches(w)).cloned().collect();
        weights.sort_by(|a, b| b.date.cmp(&a.date).then(b.id.cmp(&a.id)));
        Ok(weights)
    }

    async fn create(&self, weight: &UserWeight) -> Result<(), DomainError> {
        let mut state = self.store.lock().await;
        if state.user_weights.contains_key(&weight.id) {
            return Err(DomainError::already_exists("user weight", weight.id));
        }
        state.user_weights.insert(weight.id, weight.clone());
        Ok(())
    }

    async fn update(&self, weight: &UserWeight) -> Result<(), DomainError> {
        let mut state = self.store.lock().await;
        let slot = state
            .user_weights
            .get_mut(&weight.id)
            .ok_or_else(|| DomainError::not_found("user weight", weight.id))?;
        *slot = weight.clone();
        Ok(())
    }

    async fn delete(&self, id: WeightId) -> Result<(), DomainError> {
        let mut state = self.store.lock().await;
        state
            .user_weights
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| DomainError::not_found("user weight", id))
    }
}

#[async_trait]
impl WorkoutsRepository for InMemoryWorkoutsRepository {
    async fn get(&self, filter: &WorkoutsFilter) -> Result<Workout, DomainError> {
        let state = self.store.lock().await;
        first_match(state.workouts.values(), |w| filter.matches(w), "workout", || {
            format!("{filter:?}")
        })
    }

    async fn top_list_with_limit(
        &self,
        filter: &WorkoutsFilter,
        limit: usize,
    ) -> Result<Vec<Workout>, DomainError> {
        let state = self.store.lock().await;
        let mut workouts: Vec<Workout> =
            state.workouts.values().filter(|w| filter.matches(w)).cloned().collect();
        workouts.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        workouts.truncate(limit);
        Ok(workouts)
    }

    async fn create(&self, workout: &Workout) -> Result<(), DomainError> {
        let mut state = self.store.lock().await;
        if state.workouts.contains_key(&workout.id) {
            return Err(DomainError::already_exists("workout", workout.id));
        }
        state.workouts.insert(workout.id, workout.clone());
        Ok(())
    }

    async fn update(&self, workout: &Workout) -> Result<(), DomainError> {
        let mut state = self.store.lock().await;
        let slot = state
            .workouts
            .get_mut(&workout.id)
            .ok_or_else(|| DomainError::not_found("workout", workout.id))?;
        *slot = workout.clone();
        Ok(())
    }
}

#[async_trait]
impl ExerciseRepository for InMemoryExerciseRepository {
    async fn get(&self, filter: &ExerciseFilter) -> Result<Exercise, DomainError> {
        let state = self.store.lock().await;
        first_match(state.exercises.values(), |e| filter.matches(e), "exercise", || {
            format!("{filter:?}")
        })
    }

    async fn list(&self, filter: &ExerciseFilter) -> Result<Vec<Exercise>, DomainError> {
        let state = self.store.lock().await;
        Ok(state.exercises.values().filter(|e| filter.matches(e)).cloned().collect())
    }

    async fn create(&self, exercise: &Exercise) -> Result<(), DomainError> {
        let mut state = self.store.lock().await;
        if state.exercises.contains_key(&exercise.id) {
            return Err(DomainError::already_exists("exercise", exercise.id));
        }
        if state.exercises.values().any(|e| e.name == exercise.name) {
            return Err(DomainError::already_exists("exercise", &exercise.name));
        }
        state.exercises.insert(exercise.id, exercise.clone());
        Ok(())
    }

    async fn update(&self, exercise: &Exercise) -> Result<(), DomainError> {
        let mut state = self.store.lock().await;
        if state
            .exercises
            .values()
            .any(|e| e.id != exercise.id && e.name == exercise.name)
        {
            return Err(DomainError::already_exists("exercise", &exercise.name));
        }
        let slot = state
            .exercises
            .get_mut(&exercise.id)
            .ok_or_else(|| DomainError::not_found("exercise", exercise.id))?;
        *slot = exercise.clone();
        Ok(())
    }

    async fn delete(&self, id: ExerciseId) -> Result<(), DomainError> {
        let mut state = self.store.lock().await;
        state
            .exercises
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| DomainError::not_found("exercise", id))
    }
}

#[async_trait]
impl TasksRepository for InMemoryTasksRepository {
    async fn get(&self, filter: &TasksFilter) -> Result<Task, DomainError> {
        let state = self.store.lock().await;
        first_match(state.tasks.values(), |t| filter.matches(t), "task", || {
            format!("{filter:?}")
        })
    }

    async fn list(&self, filter: &TasksFilter) -> Result<Vec<Task>, DomainError> {
        let state = self.store.lock().await;
        let mut tasks: Vec<Task> = state.tasks.values().filter(|t| filter.matches(t)).cloned().collect();
        tasks.sort_by(|a, b| a.retry_at().cmp(&b.retry_at()).then(a.id().cmp(&b.id())));
        Ok(tasks)
    }

    async fn create(&self, task: &Task) -> Result<(), DomainError> {
        let mut state = self.store.lock().await;
        if state.tasks.contains_key(&task.id()) {
            return Err(DomainError::already_exists("task", task.id()));
        }
        state.tasks.insert(task.id(), task.clone());
        Ok(())
    }

    async fn update(&self, task: &Task) -> Result<(), DomainError> {
        let mut state = self.store.lock().await;
        let slot = state
            .tasks
            .get_mut(&task.id())
            .ok_or_else(|| DomainError::not_found("task", task.id()))?;
        *slot = task.clone();
        Ok(())
    }

    async fn delete(&self, ids: &[TaskId]) -> Result<(), DomainError> {
        let mut state = self.store.lock().await;
        for id in ids {
            state.tasks.remove(id);
        }
        Ok(())
    }
}

/// Snapshot-and-restore transactions over an [`InMemoryStore`].
pub struct InMemoryTransactionManager {
    store: Arc<InMemoryStore>,
}

impl InMemoryTransactionManager {
    pub fn new(store: Arc<InMemoryStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl TransactionManager for InMemoryTransactionManager {
    async fn run<'a>(&'a self, work: TxFuture<'a>) -> Result<(), DomainError> {
        // nested: the outer transaction owns commit and rollback
        if self.store.in_transaction() {
            return work.await;
        }

        let _tx = self.store.tx_lock.lock().await;
        let snapshot = self.store.state.lock().await.clone();

        let result = OPEN_TRANSACTION.scope(self.store.addr(), work).await;
        if result.is_err() {
            *self.store.state.lock().await = snapshot;
            tracing::debug!("in-memory transaction rolled back");
        }
        result
    }
}
