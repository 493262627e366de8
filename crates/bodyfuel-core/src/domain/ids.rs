//! Domain identifiers (strongly-typed IDs).
//!
//! Every entity id is a ULID wrapped in `Id<T>`, where `T` is a zero-sized
//! marker. Ids of different entities cannot be mixed up at compile time
//! and they sort by creation time.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::marker::PhantomData;
use ulid::Ulid;

/// Marker trait for id kinds. Supplies the display prefix.
pub trait IdMarker: Send + Sync + 'static {
    fn prefix() -> &'static str;
}

/// Generic id type. `T` only exists at compile time.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Id<T: IdMarker> {
    ulid: Ulid,
    #[serde(skip)]
    _marker: PhantomData<T>,
}

impl<T: IdMarker> Id<T> {
    pub fn from_ulid(ulid: Ulid) -> Self {
        Self {
            ulid,
            _marker: PhantomData,
        }
    }

    pub fn as_ulid(&self) -> Ulid {
        self.ulid
    }
}

impl<T: IdMarker> From<Ulid> for Id<T> {
    fn from(ulid: Ulid) -> Self {
        Self::from_ulid(ulid)
    }
}

impl<T: IdMarker> fmt::Display for Id<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", T::prefix(), self.ulid)
    }
}

macro_rules! id_marker {
    ($marker:ident, $prefix:literal) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum $marker {}

        impl IdMarker for $marker {
            fn prefix() -> &'static str {
                $prefix
            }
        }
    };
}

id_marker!(User, "user-");
id_marker!(Params, "params-");
id_marker!(Weight, "weight-");
id_marker!(Workout, "workout-");
id_marker!(Exercise, "exercise-");
id_marker!(Task, "task-");

/// Identifier of a registered user (shared by `UserInfo` and `UserParams::user_id`).
pub type UserId = Id<User>;

/// Identifier of a user-params row.
pub type UserParamsId = Id<Params>;

/// Identifier of a body-weight entry.
pub type WeightId = Id<Weight>;

/// Identifier of a generated workout.
pub type WorkoutId = Id<Workout>;

/// Identifier of a catalog exercise.
pub type ExerciseId = Id<Exercise>;

/// Identifier of an asynchronous task.
pub type TaskId = Id<Task>;
