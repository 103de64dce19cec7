//! Order error taxonomy.

use common::{ItemStatus, OrderId, ProductId};
use order_store::StoreError;
use thiserror::Error;

use crate::collaborators::CollaboratorError;

/// Errors that can occur during order operations.
#[derive(Debug, Error)]
pub enum OrderError {
    /// Missing or malformed input. The message names the offending field.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Checkout was attempted with nothing in the cart.
    #[error("Cart is empty")]
    EmptyCart,

    /// A cart line references a product that no longer exists.
    #[error("Product not found: {0}")]
    ProductNotFound(ProductId),

    /// No item with this product exists in the order.
    #[error("Item not found: product {product_id} in order {order_id}")]
    ItemNotFound {
        order_id: OrderId,
        product_id: ProductId,
    },

    /// The actor is not allowed to make this transition.
    #[error("Forbidden transition: {reason}")]
    ForbiddenTransition { reason: String },

    /// The target status is not reachable from the current one.
    #[error("Illegal transition: cannot move from {from} to {to}")]
    IllegalTransition { from: ItemStatus, to: ItemStatus },

    /// The target status is not reachable, reported to an actor who is not
    /// a party to the order and so is not told the current status.
    #[error("Illegal transition: this item cannot move to {to}")]
    TransitionRejected { to: ItemStatus },

    /// The cart changed between being read and being turned into an order,
    /// for example because another checkout of the same cart won.
    #[error("Cart changed during checkout, please retry")]
    CartChanged,

    /// The order does not exist or belongs to someone else.
    #[error("Order not found: {0}")]
    NotFound(OrderId),

    /// The buyer account does not exist or is blocked.
    #[error("Buyer account unavailable")]
    BuyerUnavailable,

    /// A collaborator service failed.
    #[error("Collaborator error: {0}")]
    Collaborator(String),

    /// Storage failure.
    #[error("Repository error: {0}")]
    Repository(#[from] StoreError),
}

impl From<CollaboratorError> for OrderError {
    fn from(e: CollaboratorError) -> Self {
        match e {
            CollaboratorError::ProductNotFound(id) => OrderError::ProductNotFound(id),
            CollaboratorError::Unavailable(msg) => OrderError::Collaborator(msg),
        }
    }
}

impl OrderError {
    /// Returns true if the caller can fix the request and retry.
    pub fn is_client_error(&self) -> bool {
        !matches!(self, OrderError::Collaborator(_) | OrderError::Repository(_))
    }
}
