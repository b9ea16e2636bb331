use async_trait::async_trait;
use thiserror::Error;

use crate::models::{Location, MenuItem, NewOrder, Order, OrderStatus, Product};

/// Errors that can occur when reading or writing the data store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("SQLx error: {0}")]
    SqlxError(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    MigrateError(#[from] sqlx::migrate::MigrateError),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Conflict: {0}")]
    Conflict(String),
}

/// Persistent geocoding results keyed by address
#[async_trait]
pub trait LocationStore: Send + Sync {
    /// Cached locations whose address exactly matches one of `addresses`
    async fn find_locations(&self, addresses: &[String]) -> Result<Vec<Location>, StoreError>;

    /// Bulk insert, skipping addresses that are already stored
    ///
    /// Returns the number of rows actually written.
    async fn insert_locations(&self, locations: &[Location]) -> Result<u64, StoreError>;
}

/// Read access to restaurants, products and menus
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Available menu items with restaurant and product joined
    async fn available_menu_items(&self) -> Result<Vec<MenuItem>, StoreError>;

    /// Products stocked by at least one restaurant
    async fn available_products(&self) -> Result<Vec<Product>, StoreError>;

    async fn health_check(&self) -> Result<bool, StoreError>;
}

#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Store a new order, snapshotting current product prices
    ///
    /// Fails with [`StoreError::InvalidInput`] when a product does not exist.
    async fn create_order(&self, order: NewOrder) -> Result<Order, StoreError>;

    /// Orders with their line items
    ///
    /// With no status given, returns every order that is not yet done.
    async fn list_orders(&self, status: Option<OrderStatus>) -> Result<Vec<Order>, StoreError>;
}
