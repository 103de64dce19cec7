//! Read side of the order core.
//!
//! - [`OrderViewComposer`] builds buyer and seller order lists and buyer detail
//! - [`OrderView`] and [`OrderItemView`] are the nested shapes returned to callers
//!
//! Seller views are scoped by the store query itself, so another seller's
//! items are never loaded.

pub mod composer;
pub mod error;
pub mod model;

pub use composer::OrderViewComposer;
pub use error::{Result, ViewError};
pub use model::{OrderItemView, OrderView, Page};
