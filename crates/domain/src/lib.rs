//! Domain layer for the marketplace order core.
//!
//! This crate provides:
//! - `OrderService::create_order`, turning a buyer's cart into a multi-seller order
//! - `OrderService::advance_status`, the per-item fulfillment state machine
//! - Collaborator traits for the catalog, account directory and notification emitter
//! - Best-effort notification dispatch, inline or through a background queue

pub mod collaborators;
pub mod error;
pub mod notifications;
pub mod order;

pub use collaborators::{
    Account, AccountDirectory, CatalogReader, CollaboratorError, InMemoryAccountDirectory,
    InMemoryCatalog, Notification, NotificationEmitter, ProductSnapshot, RecordingNotifier,
};
pub use error::OrderError;
pub use notifications::{FanoutPolicy, NotificationDispatcher};
pub use order::{
    Actor, ActorRole, AdvanceStatus, CreateOrder, ESTIMATED_DELIVERY_DAYS, OrderService,
    authorize, ensure_legal,
};
