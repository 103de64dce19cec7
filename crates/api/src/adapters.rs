//! Collaborator implementations used by the server binary.

use async_trait::async_trait;
use common::{Money, ProductId, UserId};
use domain::{
    Account, AccountDirectory, CatalogReader, CollaboratorError, NotificationEmitter,
    ProductSnapshot,
};
use sqlx::{PgPool, Row};
use uuid::Uuid;

fn unavailable(e: sqlx::Error) -> CollaboratorError {
    CollaboratorError::Unavailable(e.to_string())
}

/// Reads products from the catalog service's `products` table.
#[derive(Clone)]
pub struct PgCatalogReader {
    pool: PgPool,
}

impl PgCatalogReader {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CatalogReader for PgCatalogReader {
    #[tracing::instrument(skip(self))]
    async fn resolve_for_order(
        &self,
        product_id: ProductId,
    ) -> Result<ProductSnapshot, CollaboratorError> {
        let row = sqlx::query(
            "SELECT seller_id, name, price_cents, image_urls FROM products WHERE id = $1",
        )
        .bind(product_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(unavailable)?
        .ok_or(CollaboratorError::ProductNotFound(product_id))?;

        Ok(ProductSnapshot {
            unit_price: Money::from_cents(row.try_get("price_cents").map_err(unavailable)?),
            seller_id: UserId::from_uuid(row.try_get::<Uuid, _>("seller_id").map_err(unavailable)?),
            name: row.try_get("name").map_err(unavailable)?,
            image_urls: row.try_get("image_urls").map_err(unavailable)?,
        })
    }
}

/// Reads accounts from the account service's `users` table.
#[derive(Clone)]
pub struct PgAccountDirectory {
    pool: PgPool,
}

impl PgAccountDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AccountDirectory for PgAccountDirectory {
    #[tracing::instrument(skip(self))]
    async fn find_account(&self, user_id: UserId) -> Result<Option<Account>, CollaboratorError> {
        let blocked: Option<bool> = sqlx::query_scalar("SELECT blocked FROM users WHERE id = $1")
            .bind(user_id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(unavailable)?;

        Ok(blocked.map(|blocked| Account {
            id: user_id,
            blocked,
        }))
    }
}

/// Emits each notification as a log event for a downstream shipper to pick up.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

#[async_trait]
impl NotificationEmitter for TracingNotifier {
    async fn notify(&self, user_id: UserId, message: &str) -> Result<(), CollaboratorError> {
        tracing::info!(target: "notifications", %user_id, message, "notification");
        Ok(())
    }
}
