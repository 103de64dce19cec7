//! View shapes returned to buyers and sellers.

use chrono::{DateTime, Utc};
use common::{ItemStatus, Money, OrderId, ProductId, UserId};
use order_store::{DeliveryDetails, OrderItemRecord, OrderWithItems};
use serde::{Deserialize, Serialize};

/// Window into a list of orders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    pub limit: usize,
    pub offset: usize,
}

impl Page {
    pub const DEFAULT_LIMIT: usize = 50;
    pub const MAX_LIMIT: usize = 200;

    /// Creates a page, clamping `limit` to `1..=MAX_LIMIT`.
    pub fn new(limit: usize, offset: usize) -> Self {
        Self {
            limit: limit.clamp(1, Self::MAX_LIMIT),
            offset,
        }
    }

    /// Builds a page from optional query parameters.
    pub fn from_params(limit: Option<usize>, offset: Option<usize>) -> Self {
        Self::new(
            limit.unwrap_or(Self::DEFAULT_LIMIT),
            offset.unwrap_or_default(),
        )
    }
}

impl Default for Page {
    fn default() -> Self {
        Self::new(Self::DEFAULT_LIMIT, 0)
    }
}

/// One item line as shown to its buyer or seller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItemView {
    pub product_id: ProductId,
    pub seller_id: UserId,
    pub product_name: String,
    pub image_urls: Vec<String>,
    pub variant: Option<String>,
    pub quantity: u32,
    pub unit_price: Money,
    pub line_total: Money,
    pub status: ItemStatus,
    pub cancel_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<OrderItemRecord> for OrderItemView {
    fn from(item: OrderItemRecord) -> Self {
        Self {
            line_total: item.line_total(),
            product_id: item.product_id,
            seller_id: item.seller_id,
            product_name: item.product_name,
            image_urls: item.image_urls,
            variant: item.variant,
            quantity: item.quantity,
            unit_price: item.unit_price,
            status: item.status,
            cancel_reason: item.cancel_reason,
            created_at: item.created_at,
            updated_at: item.updated_at,
        }
    }
}

/// An order with the items visible to the reader.
///
/// `total` covers only `items`, so a seller's total is the value of that
/// seller's share of the order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderView {
    pub id: OrderId,
    pub buyer_id: UserId,

    /// Label written at checkout. Item statuses are authoritative.
    pub status: ItemStatus,
    pub delivery: DeliveryDetails,
    pub estimated_delivery: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub items: Vec<OrderItemView>,
    pub total: Money,
}

impl From<OrderWithItems> for OrderView {
    fn from(order: OrderWithItems) -> Self {
        let total = order.total();
        let OrderWithItems { order, items } = order;

        Self {
            id: order.id,
            buyer_id: order.buyer_id,
            status: order.status,
            delivery: order.delivery,
            estimated_delivery: order.estimated_delivery,
            created_at: order.created_at,
            updated_at: order.updated_at,
            items: items.into_iter().map(OrderItemView::from).collect(),
            total,
        }
    }
}
