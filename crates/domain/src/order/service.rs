//! Order service wiring the store to its collaborators.

use std::sync::Arc;

use order_store::{CartStore, OrderRepository};

use crate::collaborators::{AccountDirectory, CatalogReader};
use crate::notifications::{FanoutPolicy, NotificationDispatcher};

/// Days between checkout and the promised delivery date.
pub const ESTIMATED_DELIVERY_DAYS: i64 = 5;

/// Service for creating orders and moving their items through fulfillment.
///
/// The store is the only thing that gets mutated. Collaborators are read
/// (catalog, accounts) or told (notifications) and never roll anything back.
pub struct OrderService<S> {
    pub(super) store: S,
    pub(super) catalog: Arc<dyn CatalogReader>,
    pub(super) accounts: Arc<dyn AccountDirectory>,
    pub(super) notifications: NotificationDispatcher,
    pub(super) fanout: FanoutPolicy,
}

impl<S: OrderRepository + CartStore> OrderService<S> {
    /// Creates a new order service with per-item seller notifications.
    pub fn new(
        store: S,
        catalog: Arc<dyn CatalogReader>,
        accounts: Arc<dyn AccountDirectory>,
        notifications: NotificationDispatcher,
    ) -> Self {
        Self {
            store,
            catalog,
            accounts,
            notifications,
            fanout: FanoutPolicy::default(),
        }
    }

    /// Sets how sellers are notified about new orders.
    pub fn with_fanout(mut self, fanout: FanoutPolicy) -> Self {
        self.fanout = fanout;
        self
    }

    /// Returns the seller notification policy in effect.
    pub fn fanout(&self) -> FanoutPolicy {
        self.fanout
    }
}
