use async_trait::async_trait;

use crate::{
    CartLine, ItemTransition, LocatedItem, NewOrder, OrderId, OrderItemRecord, OrderQuery,
    OrderWithItems, ProductId, Result, UserId,
};

/// Read/clear access to buyer carts.
///
/// The cart belongs to another service; the order core never adds to it and
/// only clears it as part of checkout.
#[async_trait]
pub trait CartStore: Send + Sync {
    /// Returns the buyer's cart lines in the order they were added.
    async fn read_cart_lines(&self, buyer_id: UserId) -> Result<Vec<CartLine>>;

    /// Removes every line from the buyer's cart.
    async fn clear_cart(&self, buyer_id: UserId) -> Result<()>;
}

/// Durable storage for orders and their items.
///
/// This is the only component that mutates order state. All
/// implementations must be thread-safe (Send + Sync).
#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Writes the order, every item and removes `order.cart_lines` from the
    /// buyer's cart as one unit.
    ///
    /// Either all three happen or none do. The cart is locked for the
    /// duration, and fails with `CartChanged` if any consumed line is
    /// missing or no longer matches, so a cart is only ever turned into one
    /// order. Fails with `EmptyOrder` if `order.items` is empty.
    async fn place_order(&self, order: NewOrder) -> Result<OrderWithItems>;

    /// Looks up one item and the buyer of its order.
    async fn find_item(
        &self,
        order_id: OrderId,
        product_id: ProductId,
    ) -> Result<Option<LocatedItem>>;

    /// Applies a status change if the item is still at `expected_version`.
    ///
    /// On success the item version is incremented and both the item's and
    /// the parent order's `updated_at` are set to `transition.at`.
    /// Fails with `StaleItem` when another writer got there first.
    async fn transition_item(&self, transition: ItemTransition) -> Result<OrderItemRecord>;

    /// Retrieves orders matching a query, newest first.
    async fn find_orders(&self, query: OrderQuery) -> Result<Vec<OrderWithItems>>;
}
