//! Durable storage for orders and order items, plus the buyer cart table
//! that checkout consumes inside the same transaction.

pub mod error;
pub mod memory;
pub mod postgres;
pub mod query;
pub mod record;
pub mod store;
pub mod version;

pub use common::{ItemStatus, Money, OrderId, ProductId, UserId};
pub use error::{Result, StoreError};
pub use memory::InMemoryOrderStore;
pub use postgres::PostgresOrderStore;
pub use query::OrderQuery;
pub use record::{
    CartLine, DeliveryDetails, ItemTransition, LocatedItem, NewOrder, NewOrderItem, OrderItemRecord,
    OrderRecord, OrderWithItems,
};
pub use store::{CartStore, OrderRepository};
pub use version::Version;
