//! Domain error model.

use thiserror::Error;
use uuid::Uuid;

use crate::money::Money;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error.
///
/// Keep this focused on deterministic business failures (validation, guards,
/// conflicts). Infrastructure concerns belong to the adapters. Every variant
/// carries enough structured detail for the caller to act without
/// re-querying.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A value failed validation (e.g. malformed input).
    #[error("validation failed: {0}")]
    Validation(String),

    /// A line-item quantity below one.
    #[error("invalid quantity: {quantity} (must be at least 1)")]
    InvalidQuantity { quantity: i64 },

    /// A negative line-item discount.
    #[error("invalid discount: {discount} (must not be negative)")]
    InvalidDiscount { discount: Money },

    /// A referenced record is absent.
    #[error("{resource} not found: {id}")]
    NotFound { resource: &'static str, id: Uuid },

    /// A unique business key is already taken.
    #[error("{resource} with {field} '{value}' already exists")]
    AlreadyExists {
        resource: &'static str,
        field: &'static str,
        value: String,
    },

    /// Requested quantity exceeds the available stock.
    #[error(
        "insufficient stock for product '{name}' ({product_id}): \
         available {available}, requested {requested}"
    )]
    InsufficientStock {
        product_id: Uuid,
        name: String,
        available: i64,
        requested: i64,
    },

    /// A status guard rejected the attempted operation.
    #[error("cannot {attempted} an order in status '{current}'")]
    InvalidTransition {
        current: String,
        attempted: &'static str,
    },

    /// A concurrent mutation on the same record; surfaced to callers only
    /// after bounded internal retries are exhausted.
    #[error("conflicting update on {resource} {id}")]
    ConflictingUpdate { resource: &'static str, id: Uuid },

    /// The cancellation itself committed, but returning reserved stock to the
    /// ledger partially failed.
    #[error("order {order_id} cancelled, but stock release incomplete: {detail}")]
    ReleaseIncomplete { order_id: Uuid, detail: String },
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn not_found(resource: &'static str, id: impl Into<Uuid>) -> Self {
        Self::NotFound {
            resource,
            id: id.into(),
        }
    }

    pub fn already_exists(
        resource: &'static str,
        field: &'static str,
        value: impl Into<String>,
    ) -> Self {
        Self::AlreadyExists {
            resource,
            field,
            value: value.into(),
        }
    }

    pub fn conflicting_update(resource: &'static str, id: impl Into<Uuid>) -> Self {
        Self::ConflictingUpdate {
            resource,
            id: id.into(),
        }
    }
}
