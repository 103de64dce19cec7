//! Order view composition over the order repository.

use common::{OrderId, UserId};
use order_store::{OrderQuery, OrderRepository};

use crate::model::{OrderView, Page};
use crate::{Result, ViewError};

/// Builds buyer and seller order views.
///
/// Lists are ordered newest first, ties broken by order id. Item lines keep
/// the order of the cart they came from.
#[derive(Clone)]
pub struct OrderViewComposer<S> {
    store: S,
}

impl<S: OrderRepository> OrderViewComposer<S> {
    /// Creates a new composer reading from `store`.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Returns the buyer's orders with every item.
    #[tracing::instrument(skip(self))]
    pub async fn orders_for_buyer(&self, buyer_id: UserId, page: Page) -> Result<Vec<OrderView>> {
        let query = OrderQuery::for_buyer(buyer_id)
            .limit(page.limit)
            .offset(page.offset);
        self.compose(query).await
    }

    /// Returns the orders holding at least one of the seller's items, each
    /// restricted to that seller's items.
    #[tracing::instrument(skip(self))]
    pub async fn orders_for_seller(
        &self,
        seller_id: UserId,
        page: Page,
    ) -> Result<Vec<OrderView>> {
        let query = OrderQuery::for_seller(seller_id)
            .limit(page.limit)
            .offset(page.offset);
        self.compose(query).await
    }

    /// Returns one order if it belongs to `buyer_id`.
    ///
    /// A missing order and someone else's order both yield `NotFound`.
    #[tracing::instrument(skip(self))]
    pub async fn order_for_buyer(&self, order_id: OrderId, buyer_id: UserId) -> Result<OrderView> {
        let query = OrderQuery::for_buyer(buyer_id).order_id(order_id).limit(1);
        self.compose(query)
            .await?
            .into_iter()
            .next()
            .ok_or(ViewError::NotFound(order_id))
    }

    async fn compose(&self, query: OrderQuery) -> Result<Vec<OrderView>> {
        let orders = self.store.find_orders(query).await?;
        tracing::debug!(count = orders.len(), "composed order views");
        Ok(orders.into_iter().map(OrderView::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use common::{Money, ProductId};
    use order_store::{DeliveryDetails, InMemoryOrderStore, NewOrder, NewOrderItem};

    fn new_order(buyer_id: UserId, minutes: i64, items: &[(UserId, i64, u32)]) -> NewOrder {
        let created_at = Utc::now() + Duration::minutes(minutes);
        NewOrder {
            id: OrderId::new(),
            buyer_id,
            delivery: DeliveryDetails {
                address: "1 Market St".to_string(),
                phone: "555-0100".to_string(),
                first_name: "Ada".to_string(),
                last_name: "Lovelace".to_string(),
                city: "London".to_string(),
                region: "Greater London".to_string(),
            },
            estimated_delivery: created_at + Duration::days(5),
            created_at,
            items: items
                .iter()
                .map(|(seller_id, cents, quantity)| NewOrderItem {
                    product_id: ProductId::new(),
                    seller_id: *seller_id,
                    product_name: "Widget".to_string(),
                    image_urls: vec![],
                    variant: None,
                    quantity: *quantity,
                    unit_price: Money::from_cents(*cents),
                })
                .collect(),
            cart_lines: vec![],
        }
    }

    #[tokio::test]
    async fn buyer_sees_newest_first_with_all_items() {
        let store = InMemoryOrderStore::new();
        let composer = OrderViewComposer::new(store.clone());
        let buyer = UserId::new();

        let older = store
            .place_order(new_order(buyer, 0, &[(UserId::new(), 1000, 2)]))
            .await
            .unwrap();
        let newer = store
            .place_order(new_order(
                buyer,
                1,
                &[(UserId::new(), 1000, 2), (UserId::new(), 500, 1)],
            ))
            .await
            .unwrap();

        let views = composer
            .orders_for_buyer(buyer, Page::default())
            .await
            .unwrap();

        assert_eq!(views.len(), 2);
        assert_eq!(views[0].id, newer.order.id);
        assert_eq!(views[0].items.len(), 2);
        assert_eq!(views[0].total.cents(), 2500);
        assert_eq!(views[1].id, older.order.id);
    }

    #[tokio::test]
    async fn seller_total_covers_only_their_items() {
        let store = InMemoryOrderStore::new();
        let composer = OrderViewComposer::new(store.clone());
        let s1 = UserId::new();
        let s2 = UserId::new();

        store
            .place_order(new_order(UserId::new(), 0, &[(s1, 1000, 2), (s2, 500, 1)]))
            .await
            .unwrap();

        let views = composer.orders_for_seller(s2, Page::default()).await.unwrap();

        assert_eq!(views.len(), 1);
        assert_eq!(views[0].items.len(), 1);
        assert_eq!(views[0].items[0].seller_id, s2);
        assert_eq!(views[0].total.cents(), 500);
    }

    #[tokio::test]
    async fn detail_is_hidden_from_other_buyers() {
        let store = InMemoryOrderStore::new();
        let composer = OrderViewComposer::new(store.clone());
        let buyer = UserId::new();
        let placed = store
            .place_order(new_order(buyer, 0, &[(UserId::new(), 100, 1)]))
            .await
            .unwrap();

        let mine = composer.order_for_buyer(placed.order.id, buyer).await.unwrap();
        assert_eq!(mine.id, placed.order.id);

        let theirs = composer
            .order_for_buyer(placed.order.id, UserId::new())
            .await;
        assert!(matches!(theirs, Err(ViewError::NotFound(id)) if id == placed.order.id));

        let missing = composer.order_for_buyer(OrderId::new(), buyer).await;
        assert!(matches!(missing, Err(ViewError::NotFound(_))));
    }

    #[tokio::test]
    async fn paging_applies_after_sorting() {
        let store = InMemoryOrderStore::new();
        let composer = OrderViewComposer::new(store.clone());
        let buyer = UserId::new();
        let mut ids = Vec::new();
        for minutes in 0..3 {
            let placed = store
                .place_order(new_order(buyer, minutes, &[(UserId::new(), 100, 1)]))
                .await
                .unwrap();
            ids.push(placed.order.id);
        }

        let page = composer
            .orders_for_buyer(buyer, Page::new(2, 1))
            .await
            .unwrap();

        let got: Vec<OrderId> = page.iter().map(|v| v.id).collect();
        assert_eq!(got, vec![ids[1], ids[0]]);
    }
}
