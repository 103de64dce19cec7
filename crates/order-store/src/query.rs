use crate::{OrderId, UserId};

/// Builder for constructing order queries.
///
/// Filters combine with AND. A `seller_id` filter is special: it selects
/// orders holding at least one of that seller's items and also restricts
/// each returned order's item list to that seller's items.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderQuery {
    /// Filter by owning buyer.
    pub buyer_id: Option<UserId>,

    /// Filter by seller, scoping the returned items.
    pub seller_id: Option<UserId>,

    /// Filter by a single order.
    pub order_id: Option<OrderId>,

    /// Maximum number of orders to return.
    pub limit: Option<usize>,

    /// Number of orders to skip.
    pub offset: Option<usize>,
}

impl OrderQuery {
    /// Creates a new empty query.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a query for a buyer's orders.
    pub fn for_buyer(buyer_id: UserId) -> Self {
        Self {
            buyer_id: Some(buyer_id),
            ..Default::default()
        }
    }

    /// Creates a query for the orders a seller has to fulfill.
    pub fn for_seller(seller_id: UserId) -> Self {
        Self {
            seller_id: Some(seller_id),
            ..Default::default()
        }
    }

    /// Filters by order ID.
    pub fn order_id(mut self, order_id: OrderId) -> Self {
        self.order_id = Some(order_id);
        self
    }

    /// Filters by buyer.
    pub fn buyer_id(mut self, buyer_id: UserId) -> Self {
        self.buyer_id = Some(buyer_id);
        self
    }

    /// Limits the number of results.
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Skips the first N results.
    pub fn offset(mut self, offset: usize) -> Self {
        self.offset = Some(offset);
        self
    }
}
