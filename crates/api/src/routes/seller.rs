//! Seller fulfillment list.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Query, State};
use order_store::{CartStore, OrderRepository};
use views::OrderView;

use super::PageParams;
use super::orders::AppState;
use crate::auth::Caller;
use crate::error::ApiError;

/// GET /seller/orders: orders holding the caller's items, showing only those items.
#[tracing::instrument(skip(state))]
pub async fn list<S: OrderRepository + CartStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    caller: Caller,
    Query(params): Query<PageParams>,
) -> Result<Json<Vec<OrderView>>, ApiError> {
    let seller_id = caller.seller_id()?;
    let orders = state
        .views
        .orders_for_seller(seller_id, params.into())
        .await?;
    Ok(Json(orders))
}
