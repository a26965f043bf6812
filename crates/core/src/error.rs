//! Domain error model.

use thiserror::Error;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error.
///
/// Keep this focused on deterministic business/domain failures (validation,
/// invariants, conflicts) plus the two infrastructure outcomes the ledger
/// core must surface rather than swallow.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A value failed validation (e.g. malformed input, zero quantity).
    #[error("validation failed: {0}")]
    Validation(String),

    /// A referenced BOM/warehouse/product/lot/order does not exist.
    #[error("reference not found: {0}")]
    ReferenceNotFound(String),

    /// A bill of materials violates its invariants (non-positive batch size
    /// or line quantity, wrong product types, empty line set).
    #[error("invalid BOM: {0}")]
    InvalidBom(String),

    /// A production order status change is not permitted from the current state.
    #[error("invalid transition: {from} -> {to}")]
    InvalidTransition { from: String, to: String },

    /// An optimistic write lost a race (stale version). The ledger retries a
    /// bounded number of times before surfacing this to the caller.
    #[error("concurrency conflict: {0}")]
    ConcurrencyConflict(String),

    /// Underlying storage is unavailable or corrupt. Never swallowed.
    #[error("persistence failure: {0}")]
    Persistence(String),
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn reference_not_found(msg: impl Into<String>) -> Self {
        Self::ReferenceNotFound(msg.into())
    }

    pub fn invalid_bom(msg: impl Into<String>) -> Self {
        Self::InvalidBom(msg.into())
    }

    pub fn invalid_transition(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self::InvalidTransition {
            from: from.into(),
            to: to.into(),
        }
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::ConcurrencyConflict(msg.into())
    }

    pub fn persistence(msg: impl Into<String>) -> Self {
        Self::Persistence(msg.into())
    }
}
