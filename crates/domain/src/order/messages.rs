//! Notification wording.

use common::{ItemStatus, OrderId};

pub fn order_created(order_id: OrderId) -> String {
    format!("Your order #{order_id} has been created")
}

pub fn new_order_for_product(order_id: OrderId, product_name: &str) -> String {
    format!("New order #{order_id} for product {product_name}")
}

pub fn new_order_for_seller(order_id: OrderId, item_count: usize) -> String {
    let noun = if item_count == 1 { "item" } else { "items" };
    format!("New order #{order_id} with {item_count} of your {noun}")
}

pub fn status_changed(order_id: OrderId, product_name: &str, status: ItemStatus) -> String {
    format!("Your item {product_name} in order #{order_id} is now {status}")
}

pub fn cancelled_by_buyer(order_id: OrderId, product_name: &str, reason: &str) -> String {
    format!("The buyer cancelled {product_name} in order #{order_id}: {reason}")
}

pub fn cancelled_by_seller(order_id: OrderId, product_name: &str, reason: &str) -> String {
    format!("The seller cancelled {product_name} in order #{order_id}: {reason}")
}
