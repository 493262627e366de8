//! bodyfuel-core
//!
//! Core of the BodyFuel fitness backend: domain model, ports, in-memory
//! adapters, and the workout generation and task delivery workers.
//!
//! - **domain**: ids, entities, task retry state machine, backoff, errors
//! - **ports**: repository, transaction, notification, clock and id traits
//! - **app**: analyzer, selector, planner, scheduler, executor, profile service
//! - **impls**: in-memory storage and a logging notification sender

pub mod app;
pub mod domain;
pub mod impls;
pub mod ports;
