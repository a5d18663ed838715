//! Products repository: the catalog collaborator the engine resolves
//! product references against. The engine only reads id, kind, and pricing.

use sqlx::{Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::product::{CreateProduct, Product, ProductQuery},
};

#[derive(Clone)]
pub struct ProductsRepository {
    pool: Pool<Postgres>,
}

impl ProductsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get product by ID
    pub async fn get_by_id(&self, id: i32) -> AppResult<Product> {
        sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Product {} not found", id)))
    }

    /// Create a product; SKU collisions surface as Conflict
    pub async fn create(&self, data: &CreateProduct) -> AppResult<Product> {
        sqlx::query_as::<_, Product>(
            r#"
            INSERT INTO products (name, sku, description, kind, unit_price, daily_rate)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(&data.name)
        .bind(&data.sku)
        .bind(&data.description)
        .bind(data.kind)
        .bind(data.unit_price)
        .bind(data.daily_rate)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::conflict_on_unique(e, "Product SKU"))
    }

    /// List products with search and pagination
    pub async fn list(&self, query: &ProductQuery) -> AppResult<(Vec<Product>, i64)> {
        let page = query.page.unwrap_or(1).max(1);
        let per_page = query.per_page.unwrap_or(20).clamp(1, 100);
        let offset = (page - 1) * per_page;

        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM products
            WHERE ($1::text IS NULL OR name ILIKE '%' || $1 || '%' OR sku ILIKE '%' || $1 || '%')
              AND ($2::smallint IS NULL OR kind = $2)
            "#,
        )
        .bind(&query.search)
        .bind(query.kind)
        .fetch_one(&self.pool)
        .await?;

        let products = sqlx::query_as::<_, Product>(
            r#"
            SELECT * FROM products
            WHERE ($1::text IS NULL OR name ILIKE '%' || $1 || '%' OR sku ILIKE '%' || $1 || '%')
              AND ($2::smallint IS NULL OR kind = $2)
            ORDER BY name
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(&query.search)
        .bind(query.kind)
        .bind(per_page)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok((products, total))
    }
}
