//! Domain error model.

use thiserror::Error;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error.
///
/// One variant per outcome a caller has to tell apart. Input validation failures
/// (`InvalidCity`, `InvalidProductType`) are raised before any collaborator is
/// consulted; `Internal` wraps a persistence failure of unknown cause.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// City is outside the allowed set.
    #[error("invalid city: {0}")]
    InvalidCity(String),

    /// Product type is outside the allowed set.
    #[error("invalid product type: {0}")]
    InvalidProductType(String),

    /// Referenced pickup point does not exist.
    #[error("pickup point not found")]
    PvzNotFound,

    /// The pickup point has no reception to act on.
    #[error("reception not found")]
    ReceptionNotFound,

    /// Opening was requested while a reception is still open.
    #[error("reception already open")]
    ReceptionAlreadyOpen,

    /// The most recent reception is closed.
    #[error("reception already closed")]
    ReceptionAlreadyClosed,

    /// The open reception has no products to remove.
    #[error("product not found")]
    ProductNotFound,

    /// An identifier was invalid (e.g. parse failure).
    #[error("invalid identifier: {0}")]
    InvalidId(String),

    /// Query parameters failed validation (e.g. `page = 0`).
    #[error("validation failed: {0}")]
    Validation(String),

    /// Collaborator failure of unknown cause. Safe for the caller to retry.
    #[error("internal error: {0}")]
    Internal(String),
}

impl DomainError {
    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Stable machine-readable code for transport layers.
    pub fn code(&self) -> &'static str {
        match self {
            DomainError::InvalidCity(_) => "InvalidCity",
            DomainError::InvalidProductType(_) => "InvalidProductType",
            DomainError::PvzNotFound => "PVZNotFound",
            DomainError::ReceptionNotFound => "ReceptionDontExist",
            DomainError::ReceptionAlreadyOpen => "ReceptionAlreadyExist",
            DomainError::ReceptionAlreadyClosed => "ReceptionAlreadyClosed",
            DomainError::ProductNotFound => "ProductNotFound",
            DomainError::InvalidId(_) => "InvalidId",
            DomainError::Validation(_) => "ValidationError",
            DomainError::Internal(_) => "InternalError",
        }
    }

    /// Whether the caller may retry the same request unchanged.
    pub fn is_retryable(&self) -> bool {
        matches!(self, DomainError::Internal(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_and_close_conflicts_have_distinct_codes() {
        assert_ne!(
            DomainError::ReceptionAlreadyOpen.code(),
            DomainError::ReceptionAlreadyClosed.code()
        );
    }

    #[test]
    fn only_internal_is_retryable() {
        assert!(DomainError::internal("db down").is_retryable());
        assert!(!DomainError::PvzNotFound.is_retryable());
        assert!(!DomainError::InvalidCity("Тверь".into()).is_retryable());
    }
}
