//! Shared types for the marketplace order core.

mod money;
mod status;
mod types;

pub use money::Money;
pub use status::{ItemStatus, UnknownStatus};
pub use types::{OrderId, ProductId, UserId};
