use log::debug;
use sqlx::SqliteConnection;

use super::categories;
use crate::{
    api::chat_objects::ProductSummary,
    db_types::{NewProduct, Product, ProductImage},
    traits::CatalogApiError,
};

/// Inserts a product listing and its image rows. This is not atomic on its own; callers wrap it in a
/// transaction and pass `&mut *tx` as the connection argument.
pub async fn insert_product(product: NewProduct, conn: &mut SqliteConnection) -> Result<Product, CatalogApiError> {
    let row: Product = sqlx::query_as(
        r#"
            INSERT INTO products (name, description, price, category_id, author_id, city, state)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *;
        "#,
    )
    .bind(product.name)
    .bind(product.description)
    .bind(product.price)
    .bind(product.category_id)
    .bind(product.author_id)
    .bind(product.city)
    .bind(product.state)
    .fetch_one(&mut *conn)
    .await?;
    for (position, path) in product.images.iter().enumerate() {
        sqlx::query("INSERT INTO product_images (product_id, path, position) VALUES ($1, $2, $3)")
            .bind(row.id)
            .bind(path)
            .bind(position as i64)
            .execute(&mut *conn)
            .await?;
    }
    debug!("📝️ Product #{} ({}) inserted with {} images", row.id, row.name, product.images.len());
    Ok(row)
}

pub async fn fetch_product(id: i64, conn: &mut SqliteConnection) -> Result<Option<Product>, sqlx::Error> {
    let product = sqlx::query_as("SELECT * FROM products WHERE id = $1").bind(id).fetch_optional(conn).await?;
    Ok(product)
}

/// Returns the images of a product in display order.
pub async fn fetch_product_images(
    product_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Vec<ProductImage>, sqlx::Error> {
    let images = sqlx::query_as("SELECT * FROM product_images WHERE product_id = $1 ORDER BY position, id")
        .bind(product_id)
        .fetch_all(conn)
        .await?;
    Ok(images)
}

/// Assembles the compact product view the chat screens use. Returns `None` when the product does not exist.
pub async fn fetch_product_summary(
    product_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Option<ProductSummary>, sqlx::Error> {
    let Some(product) = fetch_product(product_id, &mut *conn).await? else {
        return Ok(None);
    };
    let category =
        categories::fetch_category(product.category_id, &mut *conn).await?.ok_or(sqlx::Error::RowNotFound)?;
    let images = fetch_product_images(product_id, conn).await?;
    Ok(Some(ProductSummary::new(&product, &category, &images)))
}
