//! Rentals repository.
//!
//! A rental and the statuses of its claimed units always move in one
//! transaction: create claims, complete/cancel release. Status changes are
//! compare-and-set on the previous status so concurrent transitions conflict
//! instead of double-applying their resource effects.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, PgConnection, Pool, Postgres, Row};

use super::assets::AssetsRepository;
use crate::{
    error::{AppError, AppResult},
    models::{
        asset::AssetUnit,
        rental::{CreateRental, Rental, RentalQuery, RentalStatus},
    },
};

#[derive(Clone)]
pub struct RentalsRepository {
    pool: Pool<Postgres>,
    assets: AssetsRepository,
}

impl RentalsRepository {
    pub fn new(pool: Pool<Postgres>, assets: AssetsRepository) -> Self {
        Self { pool, assets }
    }

    /// Get rental by ID, with its asset set joined in
    pub async fn get_by_id(&self, id: i32) -> AppResult<Rental> {
        let mut rental = sqlx::query_as::<_, Rental>("SELECT * FROM rentals WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Rental {} not found", id)))?;

        rental.assets = sqlx::query_as::<_, AssetUnit>(
            r#"
            SELECT a.*, p.name AS product_name
            FROM rental_assets ra
            JOIN asset_units a ON a.id = ra.asset_unit_id
            JOIN products p ON p.id = a.product_id
            WHERE ra.rental_id = $1
            ORDER BY a.id
            "#,
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rental)
    }

    /// Persist a new pending rental and claim its assets, atomically. A
    /// partially available asset set fails the whole creation.
    pub async fn create(
        &self,
        data: &CreateRental,
        asset_ids: &[i32],
        rental_number: &str,
        total_amount: Decimal,
        penalty_rate: Decimal,
        actor: &str,
    ) -> AppResult<Rental> {
        let mut tx = self.pool.begin().await?;

        let rental = sqlx::query_as::<_, Rental>(
            r#"
            INSERT INTO rentals (
                rental_number, customer_name, customer_email, customer_phone,
                start_date, end_date, daily_rate, total_amount, deposit,
                penalty_rate, status, notes, created_by
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            RETURNING *
            "#,
        )
        .bind(rental_number)
        .bind(&data.customer_name)
        .bind(&data.customer_email)
        .bind(&data.customer_phone)
        .bind(data.start_date)
        .bind(data.end_date)
        .bind(data.daily_rate)
        .bind(total_amount)
        .bind(data.deposit.unwrap_or(Decimal::ZERO))
        .bind(penalty_rate)
        .bind(RentalStatus::Pending)
        .bind(&data.notes)
        .bind(actor)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| AppError::conflict_on_unique(e, "Rental number"))?;

        sqlx::query(
            "INSERT INTO rental_assets (rental_id, asset_unit_id) SELECT $1, UNNEST($2::int[])",
        )
        .bind(rental.id)
        .bind(asset_ids)
        .execute(&mut *tx)
        .await?;

        self.assets.claim(&mut *tx, asset_ids, rental.id).await?;

        tx.commit().await?;
        Ok(rental)
    }

    /// Compare-and-set status change with no resource effect (activation).
    /// A lost race surfaces as Conflict rather than a silent double-apply.
    pub async fn set_status(
        &self,
        id: i32,
        expected: RentalStatus,
        status: RentalStatus,
        notes: Option<&str>,
    ) -> AppResult<Rental> {
        sqlx::query_as::<_, Rental>(
            r#"
            UPDATE rentals
            SET status = $3, notes = COALESCE($4, notes), updated_at = NOW()
            WHERE id = $1 AND status = $2
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(expected)
        .bind(status)
        .bind(notes)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::Conflict(format!("Rental {} changed status concurrently", id)))
    }

    /// Complete an active rental: freeze the return date and penalty, then
    /// release every still-rented unit, in one transaction.
    pub async fn complete(
        &self,
        id: i32,
        expected: RentalStatus,
        returned_at: DateTime<Utc>,
        penalty_rate: Decimal,
        penalty_amount: Decimal,
        notes: Option<&str>,
    ) -> AppResult<Rental> {
        let mut tx = self.pool.begin().await?;

        let rental = sqlx::query_as::<_, Rental>(
            r#"
            UPDATE rentals
            SET status = $3, actual_return_date = $4, penalty_rate = $5,
                penalty_amount = $6, notes = COALESCE($7, notes), updated_at = NOW()
            WHERE id = $1 AND status = $2
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(expected)
        .bind(RentalStatus::Completed)
        .bind(returned_at)
        .bind(penalty_rate)
        .bind(penalty_amount)
        .bind(notes)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::Conflict(format!("Rental {} changed status concurrently", id)))?;

        let asset_ids = Self::asset_ids(&mut *tx, id).await?;
        self.assets.release(&mut *tx, &asset_ids).await?;

        tx.commit().await?;
        Ok(rental)
    }

    /// Cancel a pending or active rental, releasing every still-rented unit
    pub async fn cancel(
        &self,
        id: i32,
        expected: RentalStatus,
        notes: Option<&str>,
    ) -> AppResult<Rental> {
        let mut tx = self.pool.begin().await?;

        let rental = sqlx::query_as::<_, Rental>(
            r#"
            UPDATE rentals
            SET status = $3, notes = COALESCE($4, notes), updated_at = NOW()
            WHERE id = $1 AND status = $2
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(expected)
        .bind(RentalStatus::Cancelled)
        .bind(notes)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::Conflict(format!("Rental {} changed status concurrently", id)))?;

        let asset_ids = Self::asset_ids(&mut *tx, id).await?;
        self.assets.release(&mut *tx, &asset_ids).await?;

        tx.commit().await?;
        Ok(rental)
    }

    /// Update a mutable rental. `rental` carries the merged field values;
    /// when `new_asset_ids` is given, removed units are released and added
    /// ones claimed inside the same transaction, so a failed claim rolls the
    /// whole edit back and leaves the old set held.
    pub async fn update(
        &self,
        rental: &Rental,
        expected: RentalStatus,
        new_asset_ids: Option<&[i32]>,
    ) -> AppResult<Rental> {
        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query_as::<_, Rental>(
            r#"
            UPDATE rentals
            SET customer_name = $3, customer_email = $4, customer_phone = $5,
                start_date = $6, end_date = $7, daily_rate = $8,
                total_amount = $9, deposit = $10, notes = $11, updated_at = NOW()
            WHERE id = $1 AND status = $2
            RETURNING *
            "#,
        )
        .bind(rental.id)
        .bind(expected)
        .bind(&rental.customer_name)
        .bind(&rental.customer_email)
        .bind(&rental.customer_phone)
        .bind(rental.start_date)
        .bind(rental.end_date)
        .bind(rental.daily_rate)
        .bind(rental.total_amount)
        .bind(rental.deposit)
        .bind(&rental.notes)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| {
            AppError::Conflict(format!("Rental {} changed status concurrently", rental.id))
        })?;

        if let Some(new_ids) = new_asset_ids {
            let old_ids = Self::asset_ids(&mut *tx, rental.id).await?;

            let removed: Vec<i32> = old_ids
                .iter()
                .copied()
                .filter(|id| !new_ids.contains(id))
                .collect();
            let added: Vec<i32> = new_ids
                .iter()
                .copied()
                .filter(|id| !old_ids.contains(id))
                .collect();

            if !removed.is_empty() {
                self.assets.release(&mut *tx, &removed).await?;
            }
            if !added.is_empty() {
                self.assets.claim(&mut *tx, &added, rental.id).await?;
            }

            sqlx::query("DELETE FROM rental_assets WHERE rental_id = $1")
                .bind(rental.id)
                .execute(&mut *tx)
                .await?;
            sqlx::query(
                "INSERT INTO rental_assets (rental_id, asset_unit_id) SELECT $1, UNNEST($2::int[])",
            )
            .bind(rental.id)
            .bind(new_ids)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(updated)
    }

    /// List rentals with filters and pagination; asset sets are batch-fetched
    /// for the page
    pub async fn list(&self, query: &RentalQuery) -> AppResult<(Vec<Rental>, i64)> {
        let page = query.page.unwrap_or(1).max(1);
        let per_page = query.per_page.unwrap_or(20).clamp(1, 100);
        let offset = (page - 1) * per_page;

        const FILTER: &str = r#"
            WHERE ($1::smallint IS NULL OR status = $1)
              AND ($2::text IS NULL OR LOWER(customer_email) = LOWER($2))
              AND ($3::timestamptz IS NULL OR end_date >= $3)
              AND ($4::timestamptz IS NULL OR start_date <= $4)
              AND ($5::text IS NULL
                   OR rental_number ILIKE '%' || $5 || '%'
                   OR customer_name ILIKE '%' || $5 || '%')
        "#;

        let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM rentals {}", FILTER))
            .bind(query.status)
            .bind(&query.customer_email)
            .bind(query.from)
            .bind(query.to)
            .bind(&query.search)
            .fetch_one(&self.pool)
            .await?;

        let mut rentals = sqlx::query_as::<_, Rental>(&format!(
            "SELECT * FROM rentals {} ORDER BY created_at DESC LIMIT $6 OFFSET $7",
            FILTER
        ))
        .bind(query.status)
        .bind(&query.customer_email)
        .bind(query.from)
        .bind(query.to)
        .bind(&query.search)
        .bind(per_page)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        self.populate_assets(&mut rentals).await?;

        Ok((rentals, total))
    }

    /// The rental's full asset set (claim history, regardless of current unit
    /// status), read on the caller's connection
    async fn asset_ids(conn: &mut PgConnection, rental_id: i32) -> AppResult<Vec<i32>> {
        let ids: Vec<i32> =
            sqlx::query_scalar("SELECT asset_unit_id FROM rental_assets WHERE rental_id = $1")
                .bind(rental_id)
                .fetch_all(conn)
                .await?;
        Ok(ids)
    }

    /// Batch-fetch asset sets for a page of rentals (one query, not N)
    async fn populate_assets(&self, rentals: &mut [Rental]) -> AppResult<()> {
        if rentals.is_empty() {
            return Ok(());
        }
        let rental_ids: Vec<i32> = rentals.iter().map(|r| r.id).collect();

        let rows = sqlx::query(
            r#"
            SELECT ra.rental_id, a.*, p.name AS product_name
            FROM rental_assets ra
            JOIN asset_units a ON a.id = ra.asset_unit_id
            JOIN products p ON p.id = a.product_id
            WHERE ra.rental_id = ANY($1)
            ORDER BY a.id
            "#,
        )
        .bind(&rental_ids)
        .fetch_all(&self.pool)
        .await?;

        for row in rows {
            let rental_id: i32 = row.get("rental_id");
            let unit = AssetUnit::from_row(&row)?;
            if let Some(rental) = rentals.iter_mut().find(|r| r.id == rental_id) {
                rental.assets.push(unit);
            }
        }
        Ok(())
    }
}
