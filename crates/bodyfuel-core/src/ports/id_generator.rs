//! IdGenerator port.
//!
//! Ids are ULIDs whose timestamp part comes from the injected [`Clock`], so
//! a `FixedClock` yields ids with a known creation time.

use ulid::Ulid;

use crate::domain::ids::{ExerciseId, TaskId, UserId, UserParamsId, WeightId, WorkoutId};
use crate::ports::Clock;

pub trait IdGenerator: Send + Sync {
    fn next_ulid(&self) -> Ulid;

    fn user_id(&self) -> UserId {
        UserId::from(self.next_ulid())
    }

    fn params_id(&self) -> UserParamsId {
        UserParamsId::from(self.next_ulid())
    }

    fn weight_id(&self) -> WeightId {
        WeightId::from(self.next_ulid())
    }

    fn workout_id(&self) -> WorkoutId {
        WorkoutId::from(self.next_ulid())
    }

    fn exercise_id(&self) -> ExerciseId {
        ExerciseId::from(self.next_ulid())
    }

    fn task_id(&self) -> TaskId {
        TaskId::from(self.next_ulid())
    }
}

/// ULID generator driven by a [`Clock`].
pub struct UlidGenerator<C> {
    clock: C,
}

impl<C: Clock> UlidGenerator<C> {
    pub fn new(clock: C) -> Self {
        Self { clock }
    }
}

impl<C: Clock> IdGenerator for UlidGenerator<C> {
    fn next_ulid(&self) -> Ulid {
        let timestamp_ms = u64::try_from(self.clock.now().timestamp_millis()).unwrap_or(0);
        Ulid::from_parts(timestamp_ms, rand::random())
    }
}
