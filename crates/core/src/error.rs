//! Domain error model.

use thiserror::Error;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error.
///
/// Keep this focused on deterministic, business/domain failures (validation,
/// lifecycle rules, conflicts). The only infrastructure leak is `Store`, which
/// carries an opaque persistence failure upward unchanged.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A value failed validation (e.g. malformed or out-of-range input).
    #[error("validation failed: {0}")]
    Validation(String),

    /// A referenced entity is absent (or excluded by soft delete).
    #[error("not found: {0}")]
    NotFound(String),

    /// A status change was requested that the state machine does not permit.
    #[error("invalid transition: {0}")]
    InvalidTransition(String),

    /// An operation is not permitted at the current lifecycle stage
    /// (distinct from an explicit status-transition request).
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// A uniqueness or concurrent-writer conflict.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Underlying persistence failure, not further classified. Propagated,
    /// never retried, by this layer.
    #[error("store failure: {0}")]
    Store(String),
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    pub fn invalid_transition(msg: impl Into<String>) -> Self {
        Self::InvalidTransition(msg.into())
    }

    pub fn invalid_state(msg: impl Into<String>) -> Self {
        Self::InvalidState(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn store(msg: impl Into<String>) -> Self {
        Self::Store(msg.into())
    }
}
