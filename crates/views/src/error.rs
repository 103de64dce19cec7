//! View error types.

use common::OrderId;
use order_store::StoreError;
use thiserror::Error;

/// Errors that can occur while composing views.
#[derive(Debug, Error)]
pub enum ViewError {
    /// The order does not exist or is not visible to the caller.
    #[error("Order not found: {0}")]
    NotFound(OrderId),

    /// Storage failure.
    #[error("Repository error: {0}")]
    Repository(#[from] StoreError),
}

/// Result type for view operations.
pub type Result<T> = std::result::Result<T, ViewError>;
