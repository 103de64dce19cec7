//! API server entry point.

use std::sync::Arc;
use std::time::Duration;

use api::LocalCollaborators;
use api::adapters::{PgAccountDirectory, PgCatalogReader, TracingNotifier};
use api::config::{Config, LogFormat};
use domain::{AccountDirectory, CatalogReader, NotificationDispatcher, NotificationEmitter};
use metrics_exporter_prometheus::PrometheusHandle;
use order_store::{CartStore, InMemoryOrderStore, OrderRepository, PostgresOrderStore};
use sqlx::postgres::PgPoolOptions;
use tokio::signal;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// How long shutdown waits for queued notifications to drain.
const NOTIFICATION_DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

/// Waits for a shutdown signal (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install SIGINT handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("received SIGINT, starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("received SIGTERM, starting graceful shutdown");
        }
    }
}

fn init_tracing(config: &Config) {
    let filter = EnvFilter::try_new(&config.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    match config.log_format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Text => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

async fn serve<S: OrderRepository + CartStore + Clone + 'static>(
    config: Config,
    store: S,
    catalog: Arc<dyn CatalogReader>,
    accounts: Arc<dyn AccountDirectory>,
    metrics_handle: PrometheusHandle,
) {
    let emitter: Arc<dyn NotificationEmitter> = Arc::new(TracingNotifier);
    let (notifications, worker) = if config.notification_queue_capacity > 0 {
        let (dispatcher, worker) =
            NotificationDispatcher::queued(emitter, config.notification_queue_capacity);
        (dispatcher, Some(worker))
    } else {
        (NotificationDispatcher::inline(emitter), None)
    };
    tracing::info!(
        fanout = ?config.notification_fanout,
        queued = notifications.is_queued(),
        "notification delivery configured"
    );

    let state = api::create_state(
        store,
        catalog,
        accounts,
        notifications,
        config.notification_fanout,
    );
    let app = api::create_app(state, metrics_handle);

    let addr = config.addr();
    tracing::info!(%addr, "starting API server");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("failed to bind address");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server error");

    // The router owned the last dispatcher, so the worker now drains and exits.
    if let Some(worker) = worker
        && tokio::time::timeout(NOTIFICATION_DRAIN_TIMEOUT, worker)
            .await
            .is_err()
    {
        tracing::warn!("notification queue not drained before shutdown");
    }
}

#[tokio::main]
async fn main() {
    // 1. Load configuration and initialize tracing
    let config = Config::from_env();
    init_tracing(&config);

    // 2. Install Prometheus metrics recorder
    let prometheus_builder = metrics_exporter_prometheus::PrometheusBuilder::new();
    let metrics_handle = prometheus_builder
        .install_recorder()
        .expect("failed to install Prometheus recorder");

    // 3. Pick storage and collaborators, then serve
    match config.database_url.clone() {
        Some(url) => {
            let pool = PgPoolOptions::new()
                .max_connections(10)
                .connect(&url)
                .await
                .expect("failed to connect to database");

            let store = PostgresOrderStore::new(pool.clone());
            store
                .run_migrations()
                .await
                .expect("failed to run migrations");
            tracing::info!("connected to PostgreSQL, migrations applied");

            serve(
                config,
                store,
                Arc::new(PgCatalogReader::new(pool.clone())),
                Arc::new(PgAccountDirectory::new(pool)),
                metrics_handle,
            )
            .await;
        }
        None => {
            tracing::warn!(
                "DATABASE_URL not set, using empty in-memory stores; \
                 checkout is unavailable until accounts, products and carts are seeded"
            );
            let local = LocalCollaborators::default();
            serve(
                config,
                InMemoryOrderStore::new(),
                Arc::new(local.catalog),
                Arc::new(local.accounts),
                metrics_handle,
            )
            .await;
        }
    }

    tracing::info!("server shut down gracefully");
}
