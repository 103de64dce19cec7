//! Order creation and fulfillment.

mod checkout;
mod commands;
mod fulfillment;
pub mod messages;
mod service;

pub use commands::{Actor, ActorRole, AdvanceStatus, CreateOrder};
pub use fulfillment::{authorize, ensure_legal};
pub use service::{ESTIMATED_DELIVERY_DAYS, OrderService};
