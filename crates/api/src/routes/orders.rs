//! Buyer order endpoints and item status changes.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use common::{ItemStatus, OrderId, ProductId};
use domain::{AdvanceStatus, CreateOrder, OrderService};
use order_store::{CartStore, DeliveryDetails, OrderRepository};
use serde::Deserialize;
use views::{OrderItemView, OrderView, OrderViewComposer};

use super::PageParams;
use crate::auth::Caller;
use crate::error::ApiError;

/// Shared application state accessible from all handlers.
pub struct AppState<S> {
    pub order_service: OrderService<S>,
    pub views: OrderViewComposer<S>,
}

// -- Request types --

/// Delivery details for checkout. Missing fields arrive as empty strings
/// and are rejected by validation with the field name.
#[derive(Debug, Deserialize)]
pub struct CreateOrderRequest {
    #[serde(default)]
    pub delivery_address: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub region: String,
}

impl From<CreateOrderRequest> for DeliveryDetails {
    fn from(req: CreateOrderRequest) -> Self {
        DeliveryDetails {
            address: req.delivery_address,
            phone: req.phone,
            first_name: req.first_name,
            last_name: req.last_name,
            city: req.city,
            region: req.region,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct AdvanceStatusRequest {
    pub order_id: String,
    pub product_id: String,
    pub status: String,
    pub cancel_reason: Option<String>,
}

// -- Handlers --

/// POST /orders: check out the caller's cart.
#[tracing::instrument(skip(state, req), fields(buyer_id = %caller.actor().id))]
pub async fn create<S: OrderRepository + CartStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    caller: Caller,
    Json(req): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<OrderView>), ApiError> {
    let buyer_id = caller.buyer_id()?;
    let placed = state
        .order_service
        .create_order(CreateOrder::new(buyer_id, req.into()))
        .await?;

    Ok((StatusCode::CREATED, Json(OrderView::from(placed))))
}

/// GET /orders: the caller's orders, newest first.
#[tracing::instrument(skip(state))]
pub async fn list<S: OrderRepository + CartStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    caller: Caller,
    Query(params): Query<PageParams>,
) -> Result<Json<Vec<OrderView>>, ApiError> {
    let buyer_id = caller.buyer_id()?;
    let orders = state
        .views
        .orders_for_buyer(buyer_id, params.into())
        .await?;
    Ok(Json(orders))
}

/// GET /orders/{id}: one of the caller's orders.
#[tracing::instrument(skip(state))]
pub async fn get<S: OrderRepository + CartStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    caller: Caller,
    Path(id): Path<String>,
) -> Result<Json<OrderView>, ApiError> {
    let buyer_id = caller.buyer_id()?;
    let order_id = parse_order_id(&id)?;
    let order = state.views.order_for_buyer(order_id, buyer_id).await?;
    Ok(Json(order))
}

/// POST /orders/items/status: move one item to a new status.
///
/// Open to both roles; the state machine decides who may do what.
#[tracing::instrument(skip(state, req))]
pub async fn advance_status<S: OrderRepository + CartStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    caller: Caller,
    Json(req): Json<AdvanceStatusRequest>,
) -> Result<Json<OrderItemView>, ApiError> {
    let order_id = parse_order_id(&req.order_id)?;
    let product_id: ProductId = req
        .product_id
        .parse()
        .map_err(|e| ApiError::BadRequest(format!("Invalid product_id: {e}")))?;
    let target: ItemStatus = req
        .status
        .parse()
        .map_err(|e| ApiError::BadRequest(format!("{e}")))?;

    let mut cmd = AdvanceStatus::new(order_id, product_id, caller.actor(), target);
    cmd.cancel_reason = req.cancel_reason;

    let item = state.order_service.advance_status(cmd).await?;
    Ok(Json(OrderItemView::from(item)))
}

fn parse_order_id(id: &str) -> Result<OrderId, ApiError> {
    id.parse()
        .map_err(|e| ApiError::BadRequest(format!("Invalid order id: {e}")))
}
