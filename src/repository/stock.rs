//! Stock ledger repository.
//!
//! Every quantity mutation in the system goes through `upsert`, `adjust`, or
//! the transaction-scoped `try_adjust_on`/`restore_on` used by the sale
//! workflow. `adjust` is a single conditional UPDATE, so concurrent
//! adjustments can never drive a quantity negative.

use sqlx::{PgConnection, Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::stock::{StockEntry, StockQuery},
};

const SELECT_WITH_PRODUCT: &str = r#"
    SELECT s.*, p.name AS product_name, p.sku AS product_sku
    FROM stock_entries s
    JOIN products p ON p.id = s.product_id
"#;

#[derive(Clone)]
pub struct StockRepository {
    pool: Pool<Postgres>,
}

impl StockRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get the ledger entry for a product
    pub async fn get(&self, product_id: i32) -> AppResult<StockEntry> {
        self.find(product_id).await?.ok_or_else(|| {
            AppError::NotFound(format!("No stock entry for product {}", product_id))
        })
    }

    /// Get the ledger entry for a product, if any
    pub async fn find(&self, product_id: i32) -> AppResult<Option<StockEntry>> {
        let entry = sqlx::query_as::<_, StockEntry>(&format!(
            "{} WHERE s.product_id = $1",
            SELECT_WITH_PRODUCT
        ))
        .bind(product_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(entry)
    }

    /// Create the entry if absent, otherwise overwrite quantity/min_quantity
    pub async fn upsert(
        &self,
        product_id: i32,
        quantity: i32,
        min_quantity: i32,
        actor: &str,
    ) -> AppResult<StockEntry> {
        sqlx::query_as::<_, StockEntry>(
            r#"
            INSERT INTO stock_entries (product_id, quantity, min_quantity, last_modified_by)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (product_id) DO UPDATE
            SET quantity = EXCLUDED.quantity,
                min_quantity = EXCLUDED.min_quantity,
                last_modified_by = EXCLUDED.last_modified_by,
                updated_at = NOW()
            RETURNING *
            "#,
        )
        .bind(product_id)
        .bind(quantity)
        .bind(min_quantity)
        .bind(actor)
        .fetch_one(&self.pool)
        .await
        .map_err(AppError::from)
    }

    /// Apply a signed delta as one atomic check-and-set. An adjustment that
    /// would drive the quantity negative is rejected in full.
    pub async fn adjust(&self, product_id: i32, delta: i32, actor: &str) -> AppResult<StockEntry> {
        let updated = sqlx::query_as::<_, StockEntry>(
            r#"
            UPDATE stock_entries
            SET quantity = quantity + $2,
                last_modified_by = $3,
                updated_at = NOW()
            WHERE product_id = $1 AND quantity + $2 >= 0
            RETURNING *
            "#,
        )
        .bind(product_id)
        .bind(delta)
        .bind(actor)
        .fetch_optional(&self.pool)
        .await?;

        match updated {
            Some(entry) => Ok(entry),
            // The condition failed: either no entry, or not enough stock
            None => match self.find(product_id).await? {
                Some(entry) => Err(AppError::InsufficientStock(format!(
                    "Adjustment of {} would drive product {} below zero (current: {})",
                    delta, product_id, entry.quantity
                ))),
                None => Err(AppError::NotFound(format!(
                    "No stock entry for product {}",
                    product_id
                ))),
            },
        }
    }

    /// Conditional decrement/increment on a caller-owned transaction, used by
    /// the sale workflow so a multi-item commit is all-or-nothing. Returns
    /// false (without touching the row) when the guard fails.
    pub(crate) async fn try_adjust_on(
        &self,
        conn: &mut PgConnection,
        product_id: i32,
        delta: i32,
        actor: &str,
    ) -> AppResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE stock_entries
            SET quantity = quantity + $2,
                last_modified_by = $3,
                updated_at = NOW()
            WHERE product_id = $1 AND quantity + $2 >= 0
            "#,
        )
        .bind(product_id)
        .bind(delta)
        .bind(actor)
        .execute(conn)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    /// Add quantity back on a caller-owned transaction. Upserts so a ledger
    /// row removed since deduction cannot make the restore vanish.
    pub(crate) async fn restore_on(
        &self,
        conn: &mut PgConnection,
        product_id: i32,
        quantity: i32,
        actor: &str,
    ) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO stock_entries (product_id, quantity, min_quantity, last_modified_by)
            VALUES ($1, $2, 0, $3)
            ON CONFLICT (product_id) DO UPDATE
            SET quantity = stock_entries.quantity + EXCLUDED.quantity,
                last_modified_by = EXCLUDED.last_modified_by,
                updated_at = NOW()
            "#,
        )
        .bind(product_id)
        .bind(quantity)
        .bind(actor)
        .execute(conn)
        .await?;
        Ok(())
    }

    /// All entries at or below their minimum, most urgent first
    pub async fn list_low_stock(&self) -> AppResult<Vec<StockEntry>> {
        let entries = sqlx::query_as::<_, StockEntry>(&format!(
            "{} WHERE s.quantity <= s.min_quantity ORDER BY s.quantity ASC",
            SELECT_WITH_PRODUCT
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(entries)
    }

    /// List entries with search and pagination; the search predicate runs in
    /// SQL so totals and page boundaries stay correct
    pub async fn list(&self, query: &StockQuery) -> AppResult<(Vec<StockEntry>, i64)> {
        let page = query.page.unwrap_or(1).max(1);
        let per_page = query.per_page.unwrap_or(20).clamp(1, 100);
        let offset = (page - 1) * per_page;
        let low_only = query.low_stock_only.unwrap_or(false);

        const FILTER: &str = r#"
            WHERE ($1::text IS NULL
                   OR p.name ILIKE '%' || $1 || '%'
                   OR p.sku ILIKE '%' || $1 || '%')
              AND (NOT $2 OR s.quantity <= s.min_quantity)
        "#;

        let total: i64 = sqlx::query_scalar(&format!(
            "SELECT COUNT(*) FROM stock_entries s JOIN products p ON p.id = s.product_id {}",
            FILTER
        ))
        .bind(&query.search)
        .bind(low_only)
        .fetch_one(&self.pool)
        .await?;

        let entries = sqlx::query_as::<_, StockEntry>(&format!(
            "{} {} ORDER BY p.name LIMIT $3 OFFSET $4",
            SELECT_WITH_PRODUCT, FILTER
        ))
        .bind(&query.search)
        .bind(low_only)
        .bind(per_page)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok((entries, total))
    }
}
