//! Order commands.

use std::str::FromStr;

use common::{ItemStatus, OrderId, ProductId, UserId};
use order_store::DeliveryDetails;
use serde::{Deserialize, Serialize};

use crate::error::OrderError;

/// Command to turn a buyer's cart into an order.
#[derive(Debug, Clone)]
pub struct CreateOrder {
    /// The buyer checking out.
    pub buyer_id: UserId,

    /// Delivery details as entered. Trimmed during validation.
    pub delivery: DeliveryDetails,
}

impl CreateOrder {
    /// Creates a new CreateOrder command.
    pub fn new(buyer_id: UserId, delivery: DeliveryDetails) -> Self {
        Self { buyer_id, delivery }
    }

    /// Returns the trimmed delivery details, or a validation error naming
    /// the first empty field.
    pub fn validated_delivery(&self) -> Result<DeliveryDetails, OrderError> {
        let d = &self.delivery;
        Ok(DeliveryDetails {
            address: required("delivery_address", &d.address)?,
            phone: required("phone", &d.phone)?,
            first_name: required("first_name", &d.first_name)?,
            last_name: required("last_name", &d.last_name)?,
            city: required("city", &d.city)?,
            region: required("region", &d.region)?,
        })
    }
}

fn required(field: &str, value: &str) -> Result<String, OrderError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(OrderError::Validation(format!("{field} is required")));
    }
    Ok(trimmed.to_string())
}

/// Which side of the order an actor is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActorRole {
    Buyer,
    Seller,
}

impl ActorRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActorRole::Buyer => "buyer",
            ActorRole::Seller => "seller",
        }
    }
}

impl std::fmt::Display for ActorRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActorRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "buyer" => Ok(ActorRole::Buyer),
            "seller" => Ok(ActorRole::Seller),
            other => Err(format!("unknown role: {other}")),
        }
    }
}

/// The authenticated user issuing a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub id: UserId,
    pub role: ActorRole,
}

impl Actor {
    pub fn buyer(id: UserId) -> Self {
        Self {
            id,
            role: ActorRole::Buyer,
        }
    }

    pub fn seller(id: UserId) -> Self {
        Self {
            id,
            role: ActorRole::Seller,
        }
    }
}

/// Command to move one order item to a new status.
#[derive(Debug, Clone)]
pub struct AdvanceStatus {
    /// The order containing the item.
    pub order_id: OrderId,

    /// The product identifying the item within the order.
    pub product_id: ProductId,

    /// Who is asking.
    pub actor: Actor,

    /// The requested status.
    pub target: ItemStatus,

    /// Required for cancellations, ignored otherwise.
    pub cancel_reason: Option<String>,
}

impl AdvanceStatus {
    /// Creates a new AdvanceStatus command without a reason.
    pub fn new(order_id: OrderId, product_id: ProductId, actor: Actor, target: ItemStatus) -> Self {
        Self {
            order_id,
            product_id,
            actor,
            target,
            cancel_reason: None,
        }
    }

    /// Attaches a cancellation reason.
    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.cancel_reason = Some(reason.into());
        self
    }
}
