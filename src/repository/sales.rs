//! Sales repository.
//!
//! Stock is validated at creation but only deducted when the sale completes;
//! the multi-item deduction runs inside one transaction, so the first item
//! that fails its conditional decrement rolls back every prior one.
//! Cancelling a completed sale restores the deducted quantities the same way.

use rust_decimal::Decimal;
use sqlx::{FromRow, PgConnection, Pool, Postgres};

use super::stock::StockRepository;
use crate::{
    error::{AppError, AppResult},
    models::sale::{CreateSale, Sale, SaleItem, SaleItemInput, SaleQuery, SaleStatus, SaleTotals},
};

#[derive(Clone)]
pub struct SalesRepository {
    pool: Pool<Postgres>,
    stock: StockRepository,
}

impl SalesRepository {
    pub fn new(pool: Pool<Postgres>, stock: StockRepository) -> Self {
        Self { pool, stock }
    }

    /// Get sale by ID, with its line items joined in
    pub async fn get_by_id(&self, id: i32) -> AppResult<Sale> {
        let mut sale = sqlx::query_as::<_, Sale>("SELECT * FROM sales WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Sale {} not found", id)))?;

        sale.items = sqlx::query_as::<_, SaleItem>(
            r#"
            SELECT si.*, p.name AS product_name
            FROM sale_items si
            JOIN products p ON p.id = si.product_id
            WHERE si.sale_id = $1
            ORDER BY si.id
            "#,
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        Ok(sale)
    }

    /// Persist a new pending sale with its items. No stock is deducted here;
    /// availability was validated by the service just before.
    pub async fn create(
        &self,
        data: &CreateSale,
        totals: &SaleTotals,
        bill_number: &str,
        actor: &str,
    ) -> AppResult<Sale> {
        let mut tx = self.pool.begin().await?;

        let sale = sqlx::query_as::<_, Sale>(
            r#"
            INSERT INTO sales (
                bill_number, customer_name, customer_email, customer_phone,
                subtotal, discount, tax, total_amount,
                payment_status, paid_amount, status, notes, created_by
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            RETURNING *
            "#,
        )
        .bind(bill_number)
        .bind(&data.customer_name)
        .bind(&data.customer_email)
        .bind(&data.customer_phone)
        .bind(totals.subtotal)
        .bind(data.discount.unwrap_or(Decimal::ZERO))
        .bind(data.tax.unwrap_or(Decimal::ZERO))
        .bind(totals.total_amount)
        .bind(
            data.payment_status
                .unwrap_or(crate::models::sale::PaymentStatus::Pending),
        )
        .bind(data.paid_amount.unwrap_or(Decimal::ZERO))
        .bind(SaleStatus::Pending)
        .bind(&data.notes)
        .bind(actor)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| AppError::conflict_on_unique(e, "Bill number"))?;

        Self::insert_items(&mut tx, sale.id, &data.items, &totals.line_totals).await?;

        tx.commit().await?;
        Ok(sale)
    }

    /// Update a pending sale. `sale` carries the merged field values; when
    /// `new_items` is given the line items are replaced wholesale.
    pub async fn update(
        &self,
        sale: &Sale,
        new_items: Option<(&[SaleItemInput], &[Decimal])>,
    ) -> AppResult<Sale> {
        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query_as::<_, Sale>(
            r#"
            UPDATE sales
            SET customer_name = $3, customer_email = $4, customer_phone = $5,
                subtotal = $6, discount = $7, tax = $8, total_amount = $9,
                payment_status = $10, paid_amount = $11, notes = $12, updated_at = NOW()
            WHERE id = $1 AND status = $2
            RETURNING *
            "#,
        )
        .bind(sale.id)
        .bind(SaleStatus::Pending)
        .bind(&sale.customer_name)
        .bind(&sale.customer_email)
        .bind(&sale.customer_phone)
        .bind(sale.subtotal)
        .bind(sale.discount)
        .bind(sale.tax)
        .bind(sale.total_amount)
        .bind(sale.payment_status)
        .bind(sale.paid_amount)
        .bind(&sale.notes)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| {
            AppError::Conflict(format!("Sale {} changed status concurrently", sale.id))
        })?;

        if let Some((items, line_totals)) = new_items {
            sqlx::query("DELETE FROM sale_items WHERE sale_id = $1")
                .bind(sale.id)
                .execute(&mut *tx)
                .await?;
            Self::insert_items(&mut tx, sale.id, items, line_totals).await?;
        }

        tx.commit().await?;
        Ok(updated)
    }

    /// Complete a pending sale: deduct stock per item through the ledger's
    /// conditional adjust, all inside one transaction. Any item that cannot
    /// be deducted aborts the whole transition with nothing applied.
    pub async fn complete(&self, id: i32, notes: Option<&str>, actor: &str) -> AppResult<Sale> {
        let mut tx = self.pool.begin().await?;

        let sale = sqlx::query_as::<_, Sale>(
            r#"
            UPDATE sales
            SET status = $3, notes = COALESCE($4, notes), updated_at = NOW()
            WHERE id = $1 AND status = $2
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(SaleStatus::Pending)
        .bind(SaleStatus::Completed)
        .bind(notes)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::Conflict(format!("Sale {} changed status concurrently", id)))?;

        let items = Self::items_on(&mut *tx, id).await?;
        for item in &items {
            let applied = self
                .stock
                .try_adjust_on(&mut *tx, item.product_id, -item.quantity, actor)
                .await?;
            if !applied {
                // Dropping the transaction rolls back the deductions so far
                return Err(AppError::InsufficientStock(format!(
                    "Not enough stock of product {} to complete sale {}",
                    item.product_id, sale.bill_number
                )));
            }
        }

        tx.commit().await?;
        Ok(sale)
    }

    /// Cancel a sale. A completed sale gets its deducted quantities restored;
    /// a pending one has no stock effect.
    pub async fn cancel(
        &self,
        id: i32,
        expected: SaleStatus,
        notes: Option<&str>,
        actor: &str,
    ) -> AppResult<Sale> {
        let mut tx = self.pool.begin().await?;

        let sale = sqlx::query_as::<_, Sale>(
            r#"
            UPDATE sales
            SET status = $3, notes = COALESCE($4, notes), updated_at = NOW()
            WHERE id = $1 AND status = $2
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(expected)
        .bind(SaleStatus::Cancelled)
        .bind(notes)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::Conflict(format!("Sale {} changed status concurrently", id)))?;

        if expected == SaleStatus::Completed {
            let items = Self::items_on(&mut *tx, id).await?;
            for item in &items {
                self.stock
                    .restore_on(&mut *tx, item.product_id, item.quantity, actor)
                    .await?;
            }
        }

        tx.commit().await?;
        Ok(sale)
    }

    /// Delete a pending sale; items go with it via cascade
    pub async fn delete(&self, id: i32) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM sales WHERE id = $1 AND status = $2")
            .bind(id)
            .bind(SaleStatus::Pending)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            let exists: bool =
                sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM sales WHERE id = $1)")
                    .bind(id)
                    .fetch_one(&self.pool)
                    .await?;
            if exists {
                return Err(AppError::InvalidState(format!(
                    "Sale {} is not pending; cancel it instead of deleting",
                    id
                )));
            }
            return Err(AppError::NotFound(format!("Sale {} not found", id)));
        }
        Ok(())
    }

    /// List sales with filters and pagination; items are batch-fetched for
    /// the page
    pub async fn list(&self, query: &SaleQuery) -> AppResult<(Vec<Sale>, i64)> {
        let page = query.page.unwrap_or(1).max(1);
        let per_page = query.per_page.unwrap_or(20).clamp(1, 100);
        let offset = (page - 1) * per_page;

        const FILTER: &str = r#"
            WHERE ($1::smallint IS NULL OR status = $1)
              AND ($2::smallint IS NULL OR payment_status = $2)
              AND ($3::text IS NULL OR customer_name ILIKE '%' || $3 || '%')
              AND ($4::timestamptz IS NULL OR created_at >= $4)
              AND ($5::timestamptz IS NULL OR created_at <= $5)
              AND ($6::text IS NULL
                   OR bill_number ILIKE '%' || $6 || '%'
                   OR customer_name ILIKE '%' || $6 || '%')
        "#;

        let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM sales {}", FILTER))
            .bind(query.status)
            .bind(query.payment_status)
            .bind(&query.customer_name)
            .bind(query.from)
            .bind(query.to)
            .bind(&query.search)
            .fetch_one(&self.pool)
            .await?;

        let mut sales = sqlx::query_as::<_, Sale>(&format!(
            "SELECT * FROM sales {} ORDER BY created_at DESC LIMIT $7 OFFSET $8",
            FILTER
        ))
        .bind(query.status)
        .bind(query.payment_status)
        .bind(&query.customer_name)
        .bind(query.from)
        .bind(query.to)
        .bind(&query.search)
        .bind(per_page)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        self.populate_items(&mut sales).await?;

        Ok((sales, total))
    }

    async fn insert_items(
        tx: &mut sqlx::Transaction<'_, Postgres>,
        sale_id: i32,
        items: &[SaleItemInput],
        line_totals: &[Decimal],
    ) -> AppResult<()> {
        let product_ids: Vec<i32> = items.iter().map(|i| i.product_id).collect();
        let quantities: Vec<i32> = items.iter().map(|i| i.quantity).collect();
        let unit_prices: Vec<Decimal> = items.iter().map(|i| i.unit_price).collect();

        sqlx::query(
            r#"
            INSERT INTO sale_items (sale_id, product_id, quantity, unit_price, line_total)
            SELECT $1, t.product_id, t.quantity, t.unit_price, t.line_total
            FROM UNNEST($2::int[], $3::int[], $4::numeric[], $5::numeric[])
                 AS t(product_id, quantity, unit_price, line_total)
            "#,
        )
        .bind(sale_id)
        .bind(&product_ids)
        .bind(&quantities)
        .bind(&unit_prices)
        .bind(line_totals)
        .execute(&mut **tx)
        .await?;
        Ok(())
    }

    /// Line items read on the caller's transaction
    async fn items_on(conn: &mut PgConnection, sale_id: i32) -> AppResult<Vec<SaleItem>> {
        let items = sqlx::query_as::<_, SaleItem>(
            "SELECT * FROM sale_items WHERE sale_id = $1 ORDER BY id",
        )
        .bind(sale_id)
        .fetch_all(conn)
        .await?;
        Ok(items)
    }

    /// Batch-fetch line items for a page of sales (one query, not N)
    async fn populate_items(&self, sales: &mut [Sale]) -> AppResult<()> {
        if sales.is_empty() {
            return Ok(());
        }
        let sale_ids: Vec<i32> = sales.iter().map(|s| s.id).collect();

        let rows = sqlx::query(
            r#"
            SELECT si.*, p.name AS product_name
            FROM sale_items si
            JOIN products p ON p.id = si.product_id
            WHERE si.sale_id = ANY($1)
            ORDER BY si.id
            "#,
        )
        .bind(&sale_ids)
        .fetch_all(&self.pool)
        .await?;

        for row in rows {
            let item = SaleItem::from_row(&row)?;
            if let Some(sale) = sales.iter_mut().find(|s| s.id == item.sale_id) {
                sale.items.push(item);
            }
        }
        Ok(())
    }
}
