use thiserror::Error;

use crate::{OrderId, ProductId, UserId, Version};

/// Errors that can occur when interacting with the order store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No item exists for the (order, product) pair.
    #[error("Order item not found: order {order_id}, product {product_id}")]
    ItemNotFound {
        order_id: OrderId,
        product_id: ProductId,
    },

    /// The item changed since it was read; the compare-and-set was rejected.
    #[error(
        "Stale order item {order_id}/{product_id}: expected version {expected}, found {actual}"
    )]
    StaleItem {
        order_id: OrderId,
        product_id: ProductId,
        expected: Version,
        actual: Version,
    },

    /// The buyer's cart no longer holds the lines the order was built from,
    /// typically because another checkout consumed them first.
    #[error("Cart of buyer {buyer_id} changed during checkout")]
    CartChanged { buyer_id: UserId },

    /// An order must be written with at least one item.
    #[error("Cannot place an order without items")]
    EmptyOrder,

    /// A persisted row could not be decoded.
    #[error("Corrupt row: {0}")]
    Corrupt(String),

    /// The backend refused the operation.
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Result type for order store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
