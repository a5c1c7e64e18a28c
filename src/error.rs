//! Error types for the storage engine.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, EngineError>;

/// All errors the engine surfaces at the reply layer. Errors are never retried internally;
/// the caller re-issues the command.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    /// Argument-vector shape did not match the command's grammar.
    #[error("syntax error: {0}")]
    SyntaxError(String),

    /// Table or column name unknown to the catalog.
    #[error("catalog miss: {0}")]
    CatalogMiss(String),

    /// A value fell outside the domain its column type allows.
    #[error("domain error: {0}")]
    DomainError(String),

    /// A write would overwrite an existing row without permission to do so.
    #[error("conflict: {0}")]
    ConflictError(String),

    /// An ordering constraint would be violated by this write.
    #[error("constraint violation: {0}")]
    ConstraintViolation(String),

    /// A range-shaped predicate had no index available to satisfy it.
    #[error("plan error: {0}")]
    PlanError(String),

    /// An allocation or invariant failure internal to the engine; fatal for the command.
    #[error("internal error: {0}")]
    InternalError(String),

    /// An integer key/value was at or beyond 2^32.
    #[error("value too large: {0}")]
    ValueTooLarge(String),

    /// The catalog is at capacity for tables or indexes.
    #[error("resource exhausted: {0}")]
    ResourceExhausted(String),
}

impl EngineError {
    pub fn syntax(msg: impl Into<String>) -> Self {
        EngineError::SyntaxError(msg.into())
    }

    pub fn catalog_miss(msg: impl Into<String>) -> Self {
        EngineError::CatalogMiss(msg.into())
    }

    pub fn domain(msg: impl Into<String>) -> Self {
        EngineError::DomainError(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        EngineError::ConflictError(msg.into())
    }

    pub fn constraint(msg: impl Into<String>) -> Self {
        EngineError::ConstraintViolation(msg.into())
    }

    pub fn plan(msg: impl Into<String>) -> Self {
        EngineError::PlanError(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        EngineError::InternalError(msg.into())
    }
}
