//! Application layer: pure planning components plus the services and
//! background workers that drive them through the ports.
//!
//! - **analyzer / selector / planner**: no I/O, no errors
//! - **scheduler**: periodic workout generation
//! - **executor**: periodic task delivery with retry
//! - **profile**: CRUD over the repositories
//! - **worker**: shared periodic worker runtime

pub mod analyzer;
pub mod config;
pub mod executor;
pub mod planner;
pub mod profile;
pub mod scheduler;
pub mod selector;
pub mod worker;

pub use self::analyzer::WorkoutAnalyzer;
pub use self::config::{AnalyzerConfig, ExecutorConfig, SchedulerConfig, SelectorConfig};
pub use self::executor::{ExecutionReport, TaskExecutor};
pub use self::planner::WorkoutPlanner;
pub use self::profile::{NewExercise, NewUser, NewUserParams, ProfileService};
pub use self::scheduler::{NEW_WORKOUT_MESSAGE, TickReport, WorkoutScheduler};
pub use self::selector::ExerciseSelector;
pub use self::worker::{PeriodicJob, WorkerHandle, spawn_periodic};
