//! HTTP API server with observability for the marketplace order core.
//!
//! Provides REST endpoints for checkout, item status changes and the buyer
//! and seller order views, with structured logging (tracing) and
//! Prometheus metrics.

pub mod adapters;
pub mod auth;
pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use domain::{
    AccountDirectory, CatalogReader, FanoutPolicy, InMemoryAccountDirectory, InMemoryCatalog,
    NotificationDispatcher, OrderService, RecordingNotifier,
};
use metrics_exporter_prometheus::PrometheusHandle;
use order_store::{CartStore, OrderRepository};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use views::OrderViewComposer;

use routes::orders::AppState;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S: OrderRepository + CartStore + Clone + 'static>(
    state: Arc<AppState<S>>,
    metrics_handle: PrometheusHandle,
) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route("/orders", post(routes::orders::create::<S>))
        .route("/orders", get(routes::orders::list::<S>))
        .route("/orders/{id}", get(routes::orders::get::<S>))
        .route(
            "/orders/items/status",
            post(routes::orders::advance_status::<S>),
        )
        .route("/seller/orders", get(routes::seller::list::<S>))
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Builds the application state from a store and its collaborators.
pub fn create_state<S: OrderRepository + CartStore + Clone + 'static>(
    store: S,
    catalog: Arc<dyn CatalogReader>,
    accounts: Arc<dyn AccountDirectory>,
    notifications: NotificationDispatcher,
    fanout: FanoutPolicy,
) -> Arc<AppState<S>> {
    let order_service =
        OrderService::new(store.clone(), catalog, accounts, notifications).with_fanout(fanout);
    let views = OrderViewComposer::new(store);

    Arc::new(AppState {
        order_service,
        views,
    })
}

/// In-memory collaborators handed back by [`create_default_state`] so
/// callers can seed products and accounts and inspect notifications.
#[derive(Clone, Default)]
pub struct LocalCollaborators {
    pub catalog: InMemoryCatalog,
    pub accounts: InMemoryAccountDirectory,
    pub notifier: RecordingNotifier,
}

/// Creates application state backed by in-memory collaborators with inline
/// notification delivery.
pub fn create_default_state<S: OrderRepository + CartStore + Clone + 'static>(
    store: S,
) -> (Arc<AppState<S>>, LocalCollaborators) {
    let local = LocalCollaborators::default();

    let state = create_state(
        store,
        Arc::new(local.catalog.clone()),
        Arc::new(local.accounts.clone()),
        NotificationDispatcher::inline(Arc::new(local.notifier.clone())),
        FanoutPolicy::default(),
    );

    (state, local)
}
