//! Cart to order conversion.

use std::time::Instant;

use chrono::{Duration, Utc};
use common::{OrderId, UserId};
use order_store::{
    CartStore, NewOrder, NewOrderItem, OrderRepository, OrderWithItems, StoreError,
};

use crate::collaborators::Notification;
use crate::error::OrderError;
use crate::notifications::FanoutPolicy;

use super::service::ESTIMATED_DELIVERY_DAYS;
use super::{CreateOrder, OrderService, messages};

impl<S: OrderRepository + CartStore> OrderService<S> {
    /// Converts the buyer's cart into an order.
    ///
    /// Every cart line is resolved against the catalog before anything is
    /// written, so a delisted product aborts checkout with the cart intact.
    /// The order, its items and the removal of the lines read are committed
    /// together. If another checkout consumed those lines first, or the cart
    /// changed under them, nothing is written and `CartChanged` is returned.
    /// Notifications go out after the commit and cannot fail the call.
    #[tracing::instrument(skip(self, cmd), fields(buyer_id = %cmd.buyer_id))]
    pub async fn create_order(&self, cmd: CreateOrder) -> Result<OrderWithItems, OrderError> {
        let started = Instant::now();
        let delivery = cmd.validated_delivery()?;

        match self.accounts.find_account(cmd.buyer_id).await? {
            Some(account) if account.is_active() => {}
            _ => return Err(OrderError::BuyerUnavailable),
        }

        let lines = self.store.read_cart_lines(cmd.buyer_id).await?;
        if lines.is_empty() {
            return Err(OrderError::EmptyCart);
        }

        let mut items = Vec::with_capacity(lines.len());
        for line in &lines {
            if line.quantity == 0 {
                return Err(OrderError::Validation(format!(
                    "quantity for product {} must be at least 1",
                    line.product_id
                )));
            }

            let product = self.catalog.resolve_for_order(line.product_id).await?;
            items.push(NewOrderItem {
                product_id: line.product_id,
                seller_id: product.seller_id,
                product_name: product.name,
                image_urls: product.image_urls,
                variant: line.variant.clone(),
                quantity: line.quantity,
                unit_price: product.unit_price,
            });
        }

        let now = Utc::now();
        let placed = self
            .store
            .place_order(NewOrder {
                id: OrderId::new(),
                buyer_id: cmd.buyer_id,
                delivery,
                estimated_delivery: now + Duration::days(ESTIMATED_DELIVERY_DAYS),
                created_at: now,
                items,
                cart_lines: lines,
            })
            .await
            .map_err(|e| match e {
                StoreError::CartChanged { .. } => OrderError::CartChanged,
                e => e.into(),
            })?;

        let duration = started.elapsed().as_secs_f64();
        metrics::counter!("orders_created_total").increment(1);
        metrics::counter!("order_items_created_total").increment(placed.items.len() as u64);
        metrics::histogram!("order_creation_duration_seconds").record(duration);
        tracing::info!(
            order_id = %placed.order.id,
            items = placed.items.len(),
            total = %placed.total(),
            "order created"
        );

        self.notifications
            .dispatch_all(creation_notices(&placed, self.fanout))
            .await;

        Ok(placed)
    }
}

/// Builds the buyer notice followed by the seller notices for a new order.
fn creation_notices(placed: &OrderWithItems, fanout: FanoutPolicy) -> Vec<Notification> {
    let order_id = placed.order.id;
    let mut notices = vec![Notification::new(
        placed.order.buyer_id,
        messages::order_created(order_id),
    )];

    match fanout {
        FanoutPolicy::PerItem => {
            notices.extend(placed.items.iter().map(|item| {
                Notification::new(
                    item.seller_id,
                    messages::new_order_for_product(order_id, &item.product_name),
                )
            }));
        }
        FanoutPolicy::PerSeller => {
            // Sellers in order of their first item.
            let mut sellers: Vec<(UserId, usize)> = Vec::new();
            for item in &placed.items {
                match sellers.iter_mut().find(|(id, _)| *id == item.seller_id) {
                    Some((_, count)) => *count += 1,
                    None => sellers.push((item.seller_id, 1)),
                }
            }
            notices.extend(sellers.into_iter().map(|(seller_id, count)| {
                Notification::new(seller_id, messages::new_order_for_seller(order_id, count))
            }));
        }
    }

    notices
}
