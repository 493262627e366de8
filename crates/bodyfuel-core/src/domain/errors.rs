//! Domain errors and their operational classification.

use thiserror::Error;

/// Operational classification of a [`DomainError`].
///
/// Background workers treat every kind the same way (log and skip the
/// user or task); callers at the service boundary use it to map errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Validation,
    Conflict,
    Infrastructure,
}

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("{entity} not found: {key}")]
    NotFound { entity: &'static str, key: String },

    #[error("{entity} already exists: {key}")]
    AlreadyExists { entity: &'static str, key: String },

    #[error("unknown {kind}: {value}")]
    UnknownVariant { kind: &'static str, value: String },

    #[error("invalid {entity} data: {reason}")]
    Invalid { entity: &'static str, reason: String },

    #[error("workout {workout} cannot move from {from} to {to}")]
    InvalidTransition {
        workout: String,
        from: &'static str,
        to: &'static str,
    },

    #[error("payload {payload} does not match task type {task_type}")]
    PayloadMismatch {
        task_type: String,
        payload: &'static str,
    },

    #[error("infrastructure: {0}")]
    Infrastructure(String),

    #[error("{context}: {source}")]
    Context {
        context: String,
        #[source]
        source: Box<DomainError>,
    },
}

impl DomainError {
    pub fn not_found(entity: &'static str, key: impl ToString) -> Self {
        Self::NotFound {
            entity,
            key: key.to_string(),
        }
    }

    pub fn already_exists(entity: &'static str, key: impl ToString) -> Self {
        Self::AlreadyExists {
            entity,
            key: key.to_string(),
        }
    }

    pub fn unknown_variant(kind: &'static str, value: impl Into<String>) -> Self {
        Self::UnknownVariant {
            kind,
            value: value.into(),
        }
    }

    pub fn invalid(entity: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            entity,
            reason: reason.into(),
        }
    }

    /// Wrap this error with a short description of what was being done.
    pub fn context(self, context: impl Into<String>) -> Self {
        Self::Context {
            context: context.into(),
            source: Box::new(self),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::AlreadyExists { .. } => ErrorKind::Conflict,
            Self::UnknownVariant { .. }
            | Self::Invalid { .. }
            | Self::InvalidTransition { .. }
            | Self::PayloadMismatch { .. } => ErrorKind::Validation,
            Self::Infrastructure(_) => ErrorKind::Infrastructure,
            Self::Context { source, .. } => source.kind(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }
}

/// `.context(..)` on results.
pub trait ResultExt<T> {
    fn context(self, context: impl Into<String>) -> Result<T, DomainError>;
}

impl<T> ResultExt<T> for Result<T, DomainError> {
    fn context(self, context: impl Into<String>) -> Result<T, DomainError> {
        self.map_err(|e| e.context(context))
    }
}
