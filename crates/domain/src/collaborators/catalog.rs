//! Catalog reader trait and in-memory implementation.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use async_trait::async_trait;
use common::{Money, ProductId, UserId};

use super::CollaboratorError;

/// Price and ownership of a product as of the moment it was read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductSnapshot {
    pub unit_price: Money,
    pub seller_id: UserId,
    pub name: String,
    pub image_urls: Vec<String>,
}

impl ProductSnapshot {
    pub fn new(seller_id: UserId, name: impl Into<String>, unit_price: Money) -> Self {
        Self {
            unit_price,
            seller_id,
            name: name.into(),
            image_urls: Vec::new(),
        }
    }

    /// Adds an image URL.
    pub fn with_image(mut self, url: impl Into<String>) -> Self {
        self.image_urls.push(url.into());
        self
    }
}

/// Resolves products at checkout time.
#[async_trait]
pub trait CatalogReader: Send + Sync {
    /// Returns the current price, seller and display data of a product.
    ///
    /// Fails with [`CollaboratorError::ProductNotFound`] if the product no
    /// longer exists.
    async fn resolve_for_order(
        &self,
        product_id: ProductId,
    ) -> Result<ProductSnapshot, CollaboratorError>;
}

#[derive(Debug, Default)]
struct InMemoryCatalogState {
    products: HashMap<ProductId, ProductSnapshot>,
    fail_on_resolve: bool,
}

/// In-memory catalog for tests and local runs.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCatalog {
    state: Arc<RwLock<InMemoryCatalogState>>,
}

impl InMemoryCatalog {
    /// Creates an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces a product.
    pub fn put_product(&self, product_id: ProductId, snapshot: ProductSnapshot) {
        self.state
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .products
            .insert(product_id, snapshot);
    }

    /// Removes a product, as if it had been delisted.
    pub fn remove_product(&self, product_id: ProductId) {
        self.state
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .products
            .remove(&product_id);
    }

    /// Changes the price of a listed product.
    pub fn set_price(&self, product_id: ProductId, unit_price: Money) {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(product) = state.products.get_mut(&product_id) {
            product.unit_price = unit_price;
        }
    }

    /// Configures the catalog to fail every resolve call.
    pub fn set_fail_on_resolve(&self, fail: bool) {
        self.state
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .fail_on_resolve = fail;
    }
}

#[async_trait]
impl CatalogReader for InMemoryCatalog {
    async fn resolve_for_order(
        &self,
        product_id: ProductId,
    ) -> Result<ProductSnapshot, CollaboratorError> {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);

        if state.fail_on_resolve {
            return Err(CollaboratorError::Unavailable(
                "catalog offline".to_string(),
            ));
        }

        state
            .products
            .get(&product_id)
            .cloned()
            .ok_or(CollaboratorError::ProductNotFound(product_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn resolves_listed_product() {
        let catalog = InMemoryCatalog::new();
        let product = ProductId::new();
        let seller = UserId::new();
        catalog.put_product(
            product,
            ProductSnapshot::new(seller, "Widget", Money::from_cents(1000)).with_image("a.png"),
        );

        let snapshot = catalog.resolve_for_order(product).await.unwrap();
        assert_eq!(snapshot.seller_id, seller);
        assert_eq!(snapshot.unit_price.cents(), 1000);
        assert_eq!(snapshot.image_urls, vec!["a.png".to_string()]);
    }

    #[tokio::test]
    async fn unknown_product_is_not_found() {
        let catalog = InMemoryCatalog::new();
        let product = ProductId::new();

        let result = catalog.resolve_for_order(product).await;
        assert!(matches!(result, Err(CollaboratorError::ProductNotFound(id)) if id == product));
    }

    #[tokio::test]
    async fn price_changes_are_visible_to_later_reads() {
        let catalog = InMemoryCatalog::new();
        let product = ProductId::new();
        catalog.put_product(
            product,
            ProductSnapshot::new(UserId::new(), "Widget", Money::from_cents(1000)),
        );
        catalog.set_price(product, Money::from_cents(1500));

        let snapshot = catalog.resolve_for_order(product).await.unwrap();
        assert_eq!(snapshot.unit_price.cents(), 1500);
    }

    #[tokio::test]
    async fn fail_on_resolve() {
        let catalog = InMemoryCatalog::new();
        catalog.set_fail_on_resolve(true);

        let result = catalog.resolve_for_order(ProductId::new()).await;
        assert!(matches!(result, Err(CollaboratorError::Unavailable(_))));
    }
}
