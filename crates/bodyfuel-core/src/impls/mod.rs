//! Port implementations for development, tests and the CLI demo.
//!
//! Production storage adapters live outside this crate; they implement
//! the same `ports` traits.

pub mod memory;
pub mod notification;

pub use self::memory::{InMemoryStore, InMemoryTransactionManager};
pub use self::notification::LoggingNotificationSender;
