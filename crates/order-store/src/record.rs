//! Rows held by the order store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{ItemStatus, Money, OrderId, ProductId, UserId, Version};

/// Where and to whom an order is delivered. Captured once at checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryDetails {
    pub address: String,
    pub phone: String,
    pub first_name: String,
    pub last_name: String,
    pub city: String,
    pub region: String,
}

/// A persisted order. Only `updated_at` changes after insertion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderRecord {
    pub id: OrderId,
    pub buyer_id: UserId,
    pub delivery: DeliveryDetails,
    pub estimated_delivery: DateTime<Utc>,

    /// Informational label written at creation. Item rows carry the
    /// authoritative status.
    pub status: ItemStatus,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A persisted order line, keyed by `(order_id, product_id)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItemRecord {
    pub order_id: OrderId,
    pub product_id: ProductId,

    /// Owner of the product at checkout time.
    pub seller_id: UserId,
    pub product_name: String,
    pub image_urls: Vec<String>,
    pub variant: Option<String>,
    pub quantity: u32,

    /// Price per unit at checkout time.
    pub unit_price: Money,
    pub status: ItemStatus,
    pub cancel_reason: Option<String>,

    /// Position of the originating cart line.
    pub line_no: i32,
    pub version: Version,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl OrderItemRecord {
    /// Returns `unit_price * quantity`.
    pub fn line_total(&self) -> Money {
        self.unit_price.multiply(self.quantity)
    }
}

/// An order together with the item rows visible to the reader that asked for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderWithItems {
    pub order: OrderRecord,
    pub items: Vec<OrderItemRecord>,
}

impl OrderWithItems {
    /// Sum of the line totals of the contained items.
    pub fn total(&self) -> Money {
        self.items.iter().map(OrderItemRecord::line_total).sum()
    }
}

/// An item plus the buyer of the order it belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocatedItem {
    pub buyer_id: UserId,
    pub item: OrderItemRecord,
}

/// One line of a buyer's cart, owned by the cart service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub buyer_id: UserId,
    pub product_id: ProductId,
    pub quantity: u32,
    pub variant: Option<String>,
}

impl CartLine {
    pub fn new(buyer_id: UserId, product_id: ProductId, quantity: u32) -> Self {
        Self {
            buyer_id,
            product_id,
            quantity,
            variant: None,
        }
    }

    /// Sets the variant selector.
    pub fn with_variant(mut self, variant: impl Into<String>) -> Self {
        self.variant = Some(variant.into());
        self
    }
}

/// An order ready to be written by [`crate::OrderRepository::place_order`].
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub id: OrderId,
    pub buyer_id: UserId,
    pub delivery: DeliveryDetails,
    pub estimated_delivery: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub items: Vec<NewOrderItem>,

    /// Cart lines the items were built from. They must still be in the
    /// buyer's cart, unchanged, when the order is written, and are removed
    /// with it. Lines added to the cart in the meantime are left alone.
    pub cart_lines: Vec<CartLine>,
}

/// A resolved cart line with its price and seller snapshot.
#[derive(Debug, Clone)]
pub struct NewOrderItem {
    pub product_id: ProductId,
    pub seller_id: UserId,
    pub product_name: String,
    pub image_urls: Vec<String>,
    pub variant: Option<String>,
    pub quantity: u32,
    pub unit_price: Money,
}

impl NewOrder {
    /// Builds the rows this order will occupy once written.
    pub fn to_records(&self) -> OrderWithItems {
        let order = OrderRecord {
            id: self.id,
            buyer_id: self.buyer_id,
            delivery: self.delivery.clone(),
            estimated_delivery: self.estimated_delivery,
            status: ItemStatus::Registered,
            created_at: self.created_at,
            updated_at: self.created_at,
        };

        let items = self
            .items
            .iter()
            .zip(0..)
            .map(|(item, line_no)| OrderItemRecord {
                order_id: self.id,
                product_id: item.product_id,
                seller_id: item.seller_id,
                product_name: item.product_name.clone(),
                image_urls: item.image_urls.clone(),
                variant: item.variant.clone(),
                quantity: item.quantity,
                unit_price: item.unit_price,
                status: ItemStatus::Registered,
                cancel_reason: None,
                line_no,
                version: Version::first(),
                created_at: self.created_at,
                updated_at: self.created_at,
            })
            .collect();

        OrderWithItems { order, items }
    }
}

/// A compare-and-set status change for one item.
#[derive(Debug, Clone)]
pub struct ItemTransition {
    pub order_id: OrderId,
    pub product_id: ProductId,

    /// The version the caller read. The write is rejected if the row moved on.
    pub expected_version: Version,
    pub status: ItemStatus,
    pub cancel_reason: Option<String>,
    pub at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

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

    #[test]
    fn to_records_snapshots_every_line_as_registered() {
        let now = Utc::now();
        let new_order = NewOrder {
            id: OrderId::new(),
            buyer_id: UserId::new(),
            delivery: delivery(),
            estimated_delivery: now,
            created_at: now,
            items: vec![
                NewOrderItem {
                    product_id: ProductId::new(),
                    seller_id: UserId::new(),
                    product_name: "Widget".to_string(),
                    image_urls: vec![],
                    variant: Some("blue".to_string()),
                    quantity: 2,
                    unit_price: Money::from_cents(1000),
                },
                NewOrderItem {
                    product_id: ProductId::new(),
                    seller_id: UserId::new(),
                    product_name: "Gadget".to_string(),
                    image_urls: vec!["https://img/g.png".to_string()],
                    variant: None,
                    quantity: 1,
                    unit_price: Money::from_cents(500),
                },
            ],
            cart_lines: vec![],
        };

        let records = new_order.to_records();

        assert_eq!(records.order.status, ItemStatus::Registered);
        assert_eq!(records.items.len(), 2);
        assert_eq!(records.items[0].line_no, 0);
        assert_eq!(records.items[1].line_no, 1);
        assert!(records.items.iter().all(|i| i.version == Version::first()));
        assert!(records.items.iter().all(|i| i.status == ItemStatus::Registered));
        assert_eq!(records.total().cents(), 2500);
    }
}
