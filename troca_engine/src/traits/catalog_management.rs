use thiserror::Error;

use crate::db_types::{Category, NewProduct, Product, ProductImage};

#[derive(Debug, Clone, Error)]
pub enum CatalogApiError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Category {0} does not exist")]
    CategoryNotFound(i64),
}

impl From<sqlx::Error> for CatalogApiError {
    fn from(e: sqlx::Error) -> Self {
        CatalogApiError::DatabaseError(e.to_string())
    }
}

#[allow(async_fn_in_trait)]
pub trait CatalogManagement {
    /// Creates a product listing, including its image records.
    async fn create_product(&self, product: NewProduct) -> Result<Product, CatalogApiError>;

    /// Fetches the product with the given id, or None if no such product exists.
    async fn fetch_product(&self, id: i64) -> Result<Option<Product>, CatalogApiError>;

    /// Fetches the images of a product, in display order.
    async fn fetch_product_images(&self, product_id: i64) -> Result<Vec<ProductImage>, CatalogApiError>;

    /// Fetches every category, in seeding order. The list is fixed and small.
    async fn fetch_categories(&self) -> Result<Vec<Category>, CatalogApiError>;
}
