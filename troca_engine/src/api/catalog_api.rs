//! Read access to the product catalog.

use std::fmt::Debug;

use crate::{
    db_types::{Category, Product, ProductImage},
    traits::{CatalogApiError, CatalogManagement},
};

/// The `CatalogApi` serves the browsing side of the marketplace: the fixed category list and individual
/// listings with their images. Listings themselves are created through [`CatalogManagement::create_product`].
pub struct CatalogApi<B> {
    db: B,
}

impl<B: Debug> Debug for CatalogApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "CatalogApi ({:?})", self.db)
    }
}

impl<B> CatalogApi<B>
where B: CatalogManagement
{
    pub fn new(db: B) -> Self {
        Self { db }
    }

    /// Every category, in seeding order.
    pub async fn categories(&self) -> Result<Vec<Category>, CatalogApiError> {
        self.db.fetch_categories().await
    }

    /// A listing together with its images in display order, or `None` when no such product exists.
    pub async fn product_with_images(
        &self,
        product_id: i64,
    ) -> Result<Option<(Product, Vec<ProductImage>)>, CatalogApiError> {
        let Some(product) = self.db.fetch_product(product_id).await? else {
            return Ok(None);
        };
        let images = self.db.fetch_product_images(product_id).await?;
        Ok(Some((product, images)))
    }
}
