//! Domain model (ids, entities, task state machine, backoff, errors).
//!
//! Everything here is free of I/O. Time is always passed in by the caller
//! (`now`), randomness through an injected `rand::Rng`.

/// Declares a closed string enum with its snake_case wire name.
///
/// Generates `as_str`, `Display`, `FromStr` (unknown strings become
/// `DomainError::UnknownVariant`) and serde impls using the same names.
macro_rules! string_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident as $kind:literal {
            $($variant:ident => $wire:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
        pub enum $name {
            $(#[serde(rename = $wire)] $variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $wire),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = $crate::domain::errors::DomainError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($wire => Ok($name::$variant),)+
                    other => Err($crate::domain::errors::DomainError::unknown_variant($kind, other)),
                }
            }
        }
    };
}

pub mod backoff;
pub mod errors;
pub mod exercise;
pub mod filters;
pub mod ids;
pub mod stats;
pub mod task;
pub mod user;
pub mod workout;

pub use self::backoff::BackoffPolicy;
pub use self::errors::{DomainError, ErrorKind, ResultExt};
pub use self::exercise::{Exercise, ExerciseStatus, ExerciseType, ExerciseUpdate, LevelPreparation, PlaceExercise};
pub use self::filters::{
    ExerciseFilter, TasksFilter, UserInfoFilter, UserParamsFilter, UserWeightFilter, WorkoutsFilter,
};
pub use self::ids::{ExerciseId, TaskId, UserId, UserParamsId, WeightId, WorkoutId};
pub use self::stats::AnalyzeWorkoutStats;
pub use self::task::{RetryDecision, Task, TaskPayload, TaskSnapshot, TaskState, TaskType};
pub use self::user::{
    Lifestyle, UserInfo, UserInfoUpdate, UserParams, UserParamsUpdate, UserWeight, UserWeightUpdate, Want,
};
pub use self::workout::{Workout, WorkoutExercise, WorkoutLevel, WorkoutStatus};
