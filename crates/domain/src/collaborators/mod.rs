//! Services the order core consumes but does not own.

pub mod accounts;
pub mod catalog;
pub mod notify;

use common::ProductId;
use thiserror::Error;

pub use accounts::{Account, AccountDirectory, InMemoryAccountDirectory};
pub use catalog::{CatalogReader, InMemoryCatalog, ProductSnapshot};
pub use notify::{Notification, NotificationEmitter, RecordingNotifier};

/// Errors reported by collaborator services.
#[derive(Debug, Error)]
pub enum CollaboratorError {
    /// The product is no longer listed.
    #[error("Product not found: {0}")]
    ProductNotFound(ProductId),

    /// The service could not be reached or failed internally.
    #[error("Collaborator unavailable: {0}")]
    Unavailable(String),
}
