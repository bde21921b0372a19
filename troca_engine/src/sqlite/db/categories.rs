use sqlx::SqliteConnection;

use crate::db_types::Category;

/// Returns every category in seeding order. The category list is fixed and seeded by a migration.
pub async fn fetch_categories(conn: &mut SqliteConnection) -> Result<Vec<Category>, sqlx::Error> {
    let categories = sqlx::query_as("SELECT * FROM categories ORDER BY id").fetch_all(conn).await?;
    Ok(categories)
}

pub async fn fetch_category(id: i64, conn: &mut SqliteConnection) -> Result<Option<Category>, sqlx::Error> {
    let category = sqlx::query_as("SELECT * FROM categories WHERE id = $1").bind(id).fetch_optional(conn).await?;
    Ok(category)
}
