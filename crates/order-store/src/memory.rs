use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::{
    CartLine, ItemTransition, LocatedItem, NewOrder, OrderId, OrderItemRecord, OrderQuery,
    OrderRecord, OrderWithItems, ProductId, Result, StoreError, UserId,
    store::{CartStore, OrderRepository},
};

#[derive(Default)]
struct MemoryState {
    orders: HashMap<OrderId, OrderRecord>,
    /// Items per order, kept in `line_no` order.
    items: HashMap<OrderId, Vec<OrderItemRecord>>,
    carts: HashMap<UserId, Vec<CartLine>>,
    fail_on_place: bool,
}

impl MemoryState {
    fn clear_cart(&mut self, buyer_id: UserId) {
        self.carts.remove(&buyer_id);
    }

    /// Removes `lines` from the buyer's cart if every one is still there
    /// unchanged. Leaves the cart untouched otherwise.
    fn claim_cart_lines(&mut self, buyer_id: UserId, lines: &[CartLine]) -> Result<()> {
        if lines.is_empty() {
            return Ok(());
        }

        let cart = self.carts.get_mut(&buyer_id);
        let Some(cart) = cart.filter(|cart| lines.iter().all(|line| cart.contains(line))) else {
            return Err(StoreError::CartChanged { buyer_id });
        };

        cart.retain(|line| !lines.iter().any(|l| l.product_id == line.product_id));
        if cart.is_empty() {
            self.clear_cart(buyer_id);
        }
        Ok(())
    }

    fn item_mut(&mut self, order_id: OrderId, product_id: ProductId) -> Option<&mut OrderItemRecord> {
        self.items
            .get_mut(&order_id)?
            .iter_mut()
            .find(|item| item.product_id == product_id)
    }
}

/// In-memory order store for testing and local runs.
///
/// Orders, items and carts share one lock, so every mutating call is a
/// single atomic step, and concurrent transitions on the same item are
/// serialized.
#[derive(Clone, Default)]
pub struct InMemoryOrderStore {
    state: Arc<RwLock<MemoryState>>,
}

impl InMemoryOrderStore {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a line to a buyer's cart, replacing any line for the same product.
    pub async fn put_cart_line(&self, line: CartLine) {
        let mut state = self.state.write().await;
        let cart = state.carts.entry(line.buyer_id).or_default();
        match cart.iter_mut().find(|l| l.product_id == line.product_id) {
            Some(existing) => *existing = line,
            None => cart.push(line),
        }
    }

    /// Makes the next `place_order` calls fail before writing anything.
    pub async fn set_fail_on_place(&self, fail: bool) {
        self.state.write().await.fail_on_place = fail;
    }

    /// Returns the number of stored orders.
    pub async fn order_count(&self) -> usize {
        self.state.read().await.orders.len()
    }

    /// Returns the number of stored order items.
    pub async fn item_count(&self) -> usize {
        self.state.read().await.items.values().map(Vec::len).sum()
    }
}

#[async_trait]
impl CartStore for InMemoryOrderStore {
    async fn read_cart_lines(&self, buyer_id: UserId) -> Result<Vec<CartLine>> {
        let state = self.state.read().await;
        Ok(state.carts.get(&buyer_id).cloned().unwrap_or_default())
    }

    async fn clear_cart(&self, buyer_id: UserId) -> Result<()> {
        self.state.write().await.clear_cart(buyer_id);
        Ok(())
    }
}

#[async_trait]
impl OrderRepository for InMemoryOrderStore {
    async fn place_order(&self, order: NewOrder) -> Result<OrderWithItems> {
        if order.items.is_empty() {
            return Err(StoreError::EmptyOrder);
        }

        let mut state = self.state.write().await;

        if state.fail_on_place {
            return Err(StoreError::Unavailable(
                "injected failure on place_order".to_string(),
            ));
        }

        state.claim_cart_lines(order.buyer_id, &order.cart_lines)?;

        let records = order.to_records();
        state.orders.insert(order.id, records.order.clone());
        state.items.insert(order.id, records.items.clone());

        Ok(records)
    }

    async fn find_item(
        &self,
        order_id: OrderId,
        product_id: ProductId,
    ) -> Result<Option<LocatedItem>> {
        let state = self.state.read().await;

        let Some(order) = state.orders.get(&order_id) else {
            return Ok(None);
        };

        let item = state
            .items
            .get(&order_id)
            .and_then(|items| items.iter().find(|i| i.product_id == product_id))
            .cloned();

        Ok(item.map(|item| LocatedItem {
            buyer_id: order.buyer_id,
            item,
        }))
    }

    async fn transition_item(&self, transition: ItemTransition) -> Result<OrderItemRecord> {
        let ItemTransition {
            order_id,
            product_id,
            expected_version,
            status,
            cancel_reason,
            at,
        } = transition;

        let mut state = self.state.write().await;

        let item = state
            .item_mut(order_id, product_id)
            .ok_or(StoreError::ItemNotFound {
                order_id,
                product_id,
            })?;

        if item.version != expected_version {
            return Err(StoreError::StaleItem {
                order_id,
                product_id,
                expected: expected_version,
                actual: item.version,
            });
        }

        item.status = status;
        item.cancel_reason = cancel_reason;
        item.version = item.version.next();
        item.updated_at = at;
        let updated = item.clone();

        if let Some(order) = state.orders.get_mut(&order_id) {
            order.updated_at = at;
        }

        Ok(updated)
    }

    async fn find_orders(&self, query: OrderQuery) -> Result<Vec<OrderWithItems>> {
        let state = self.state.read().await;

        let mut orders: Vec<OrderWithItems> = state
            .orders
            .values()
            .filter(|order| {
                if let Some(id) = query.order_id
                    && order.id != id
                {
                    return false;
                }
                if let Some(buyer) = query.buyer_id
                    && order.buyer_id != buyer
                {
                    return false;
                }
                true
            })
            .filter_map(|order| {
                let items: Vec<OrderItemRecord> = state
                    .items
                    .get(&order.id)
                    .into_iter()
                    .flatten()
                    .filter(|item| query.seller_id.is_none_or(|s| item.seller_id == s))
                    .cloned()
                    .collect();

                // A seller only sees orders they have a stake in.
                if query.seller_id.is_some() && items.is_empty() {
                    return None;
                }

                Some(OrderWithItems {
                    order: order.clone(),
                    items,
                })
            })
            .collect();

        orders.sort_by(|a, b| {
            b.order
                .created_at
                .cmp(&a.order.created_at)
                .then(a.order.id.cmp(&b.order.id))
        });

        let offset = query.offset.unwrap_or(0);
        let limit = query.limit.unwrap_or(usize::MAX);

        Ok(orders.into_iter().skip(offset).take(limit).collect())
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};

    use super::*;
    use crate::{DeliveryDetails, ItemStatus, Money, NewOrderItem, Version};

    fn delivery() -> DeliveryDetails {
        DeliveryDetails {
            address: "1 Market St".to_string(),
            phone: "555-0100".to_string(),
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            city: "London".to_string(),
            region: "Greater London".to_string(),
        }
    }

    fn new_item(seller_id: UserId, cents: i64) -> NewOrderItem {
        NewOrderItem {
            product_id: ProductId::new(),
            seller_id,
            product_name: "Widget".to_string(),
            image_urls: vec![],
            variant: None,
            quantity: 1,
            unit_price: Money::from_cents(cents),
        }
    }

    fn new_order(buyer_id: UserId, items: Vec<NewOrderItem>) -> NewOrder {
        let now = Utc::now();
        NewOrder {
            id: OrderId::new(),
            buyer_id,
            delivery: delivery(),
            estimated_delivery: now + Duration::days(5),
            created_at: now,
            items,
            cart_lines: vec![],
        }
    }

    /// An order consuming exactly `lines`.
    fn order_from_cart(buyer_id: UserId, lines: Vec<CartLine>) -> NewOrder {
        let items = lines
            .iter()
            .map(|line| NewOrderItem {
                product_id: line.product_id,
                variant: line.variant.clone(),
                quantity: line.quantity,
                ..new_item(UserId::new(), 100)
            })
            .collect();
        NewOrder {
            cart_lines: lines,
            ..new_order(buyer_id, items)
        }
    }

    #[tokio::test]
    async fn place_order_writes_rows_and_clears_cart() {
        let store = InMemoryOrderStore::new();
        let buyer = UserId::new();
        let line = CartLine::new(buyer, ProductId::new(), 1);
        store.put_cart_line(line.clone()).await;

        let placed = store
            .place_order(order_from_cart(buyer, vec![line]))
            .await
            .unwrap();

        assert_eq!(placed.items.len(), 1);
        assert_eq!(store.order_count().await, 1);
        assert_eq!(store.item_count().await, 1);
        assert!(store.read_cart_lines(buyer).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn cart_is_consumed_by_one_order_only() {
        let store = InMemoryOrderStore::new();
        let buyer = UserId::new();
        let line = CartLine::new(buyer, ProductId::new(), 2);
        store.put_cart_line(line.clone()).await;

        store
            .place_order(order_from_cart(buyer, vec![line.clone()]))
            .await
            .unwrap();
        let second = store.place_order(order_from_cart(buyer, vec![line])).await;

        assert!(matches!(second, Err(StoreError::CartChanged { buyer_id }) if buyer_id == buyer));
        assert_eq!(store.order_count().await, 1);
        assert_eq!(store.item_count().await, 1);
    }

    #[tokio::test]
    async fn line_added_after_read_stays_in_cart() {
        let store = InMemoryOrderStore::new();
        let buyer = UserId::new();
        let first = CartLine::new(buyer, ProductId::new(), 1);
        let late = CartLine::new(buyer, ProductId::new(), 1);
        store.put_cart_line(first.clone()).await;
        store.put_cart_line(late.clone()).await;

        let placed = store
            .place_order(order_from_cart(buyer, vec![first]))
            .await
            .unwrap();

        assert_eq!(placed.items.len(), 1);
        assert_eq!(store.read_cart_lines(buyer).await.unwrap(), vec![late]);
    }

    #[tokio::test]
    async fn changed_quantity_rejects_order_and_keeps_cart() {
        let store = InMemoryOrderStore::new();
        let buyer = UserId::new();
        let product = ProductId::new();
        let read = CartLine::new(buyer, product, 1);
        store.put_cart_line(read.clone()).await;
        store.put_cart_line(CartLine::new(buyer, product, 3)).await;

        let result = store.place_order(order_from_cart(buyer, vec![read])).await;

        assert!(matches!(result, Err(StoreError::CartChanged { .. })));
        assert_eq!(store.order_count().await, 0);
        assert_eq!(store.read_cart_lines(buyer).await.unwrap()[0].quantity, 3);
    }

    #[tokio::test]
    async fn place_order_rejects_empty_order() {
        let store = InMemoryOrderStore::new();
        let result = store.place_order(new_order(UserId::new(), vec![])).await;
        assert!(matches!(result, Err(StoreError::EmptyOrder)));
        assert_eq!(store.order_count().await, 0);
    }

    #[tokio::test]
    async fn injected_failure_leaves_cart_and_orders_untouched() {
        let store = InMemoryOrderStore::new();
        let buyer = UserId::new();
        let line = CartLine::new(buyer, ProductId::new(), 1);
        store.put_cart_line(line.clone()).await;
        store.set_fail_on_place(true).await;

        let result = store.place_order(order_from_cart(buyer, vec![line])).await;

        assert!(matches!(result, Err(StoreError::Unavailable(_))));
        assert_eq!(store.order_count().await, 0);
        assert_eq!(store.item_count().await, 0);
        assert_eq!(store.read_cart_lines(buyer).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn put_cart_line_replaces_same_product() {
        let store = InMemoryOrderStore::new();
        let buyer = UserId::new();
        let product = ProductId::new();
        store.put_cart_line(CartLine::new(buyer, product, 1)).await;
        store.put_cart_line(CartLine::new(buyer, product, 4)).await;

        let lines = store.read_cart_lines(buyer).await.unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].quantity, 4);

        store.clear_cart(buyer).await.unwrap();
        assert!(store.read_cart_lines(buyer).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn transition_item_applies_compare_and_set() {
        let store = InMemoryOrderStore::new();
        let buyer = UserId::new();
        let placed = store
            .place_order(new_order(buyer, vec![new_item(UserId::new(), 100)]))
            .await
            .unwrap();
        let item = &placed.items[0];
        let later = item.updated_at + Duration::seconds(1);

        let updated = store
            .transition_item(ItemTransition {
                order_id: item.order_id,
                product_id: item.product_id,
                expected_version: Version::first(),
                status: ItemStatus::Paid,
                cancel_reason: None,
                at: later,
            })
            .await
            .unwrap();
        assert_eq!(updated.status, ItemStatus::Paid);
        assert_eq!(updated.version, Version::new(2));

        let orders = store
            .find_orders(OrderQuery::new().order_id(item.order_id))
            .await
            .unwrap();
        assert_eq!(orders[0].order.updated_at, later);

        let stale = store
            .transition_item(ItemTransition {
                order_id: item.order_id,
                product_id: item.product_id,
                expected_version: Version::first(),
                status: ItemStatus::Paid,
                cancel_reason: None,
                at: later,
            })
            .await;
        assert!(matches!(
            stale,
            Err(StoreError::StaleItem { actual, .. }) if actual == Version::new(2)
        ));
    }

    #[tokio::test]
    async fn transition_unknown_item_fails() {
        let store = InMemoryOrderStore::new();
        let result = store
            .transition_item(ItemTransition {
                order_id: OrderId::new(),
                product_id: ProductId::new(),
                expected_version: Version::first(),
                status: ItemStatus::Paid,
                cancel_reason: None,
                at: Utc::now(),
            })
            .await;
        assert!(matches!(result, Err(StoreError::ItemNotFound { .. })));
    }

    #[tokio::test]
    async fn find_item_returns_buyer() {
        let store = InMemoryOrderStore::new();
        let buyer = UserId::new();
        let placed = store
            .place_order(new_order(buyer, vec![new_item(UserId::new(), 100)]))
            .await
            .unwrap();
        let item = &placed.items[0];

        let located = store
            .find_item(item.order_id, item.product_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(located.buyer_id, buyer);
        assert_eq!(&located.item, item);

        let missing = store
            .find_item(item.order_id, ProductId::new())
            .await
            .unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn seller_query_scopes_items() {
        let store = InMemoryOrderStore::new();
        let buyer = UserId::new();
        let s1 = UserId::new();
        let s2 = UserId::new();
        let s3 = UserId::new();
        store
            .place_order(new_order(
                buyer,
                vec![new_item(s1, 1000), new_item(s2, 500), new_item(s1, 300)],
            ))
            .await
            .unwrap();

        let for_s1 = store.find_orders(OrderQuery::for_seller(s1)).await.unwrap();
        assert_eq!(for_s1.len(), 1);
        assert_eq!(for_s1[0].items.len(), 2);
        assert!(for_s1[0].items.iter().all(|i| i.seller_id == s1));
        assert_eq!(for_s1[0].total().cents(), 1300);

        let for_s3 = store.find_orders(OrderQuery::for_seller(s3)).await.unwrap();
        assert!(for_s3.is_empty());
    }

    #[tokio::test]
    async fn buyer_query_is_newest_first_with_paging() {
        let store = InMemoryOrderStore::new();
        let buyer = UserId::new();
        let mut ids = Vec::new();
        for offset in 0..3 {
            let mut order = new_order(buyer, vec![new_item(UserId::new(), 100)]);
            order.created_at = order.created_at + Duration::minutes(offset);
            ids.push(order.id);
            store.place_order(order).await.unwrap();
        }
        store
            .place_order(new_order(UserId::new(), vec![new_item(UserId::new(), 100)]))
            .await
            .unwrap();

        let all = store.find_orders(OrderQuery::for_buyer(buyer)).await.unwrap();
        let got: Vec<OrderId> = all.iter().map(|o| o.order.id).collect();
        assert_eq!(got, vec![ids[2], ids[1], ids[0]]);

        let page = store
            .find_orders(OrderQuery::for_buyer(buyer).offset(1).limit(1))
            .await
            .unwrap();
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].order.id, ids[1]);
    }
}
