//! Asset registry repository.
//!
//! Unit statuses are only ever mutated here: batch intake, direct overrides
//! (maintenance/damage), and the transaction-scoped `claim`/`release` pair
//! that the rental workflow drives. `claim` is one conditional multi-row
//! UPDATE, all-or-nothing across the requested set.

use sqlx::{PgConnection, Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::asset::{AssetQuery, AssetStatus, AssetUnit, AvailableGroup, GroupedAsset},
};

const SELECT_WITH_PRODUCT: &str = r#"
    SELECT a.*, p.name AS product_name
    FROM asset_units a
    JOIN products p ON p.id = a.product_id
"#;

#[derive(Clone)]
pub struct AssetsRepository {
    pool: Pool<Postgres>,
}

impl AssetsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get asset unit by ID
    pub async fn get_by_id(&self, id: i32) -> AppResult<AssetUnit> {
        sqlx::query_as::<_, AssetUnit>(&format!("{} WHERE a.id = $1", SELECT_WITH_PRODUCT))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Asset unit {} not found", id)))
    }

    /// Create `count` independent units sharing one asset code. The code must
    /// be new for the product (codes are unique per product, not globally).
    pub async fn create_batch(
        &self,
        product_id: i32,
        asset_code: &str,
        count: i32,
        status: AssetStatus,
        notes: Option<&str>,
    ) -> AppResult<Vec<AssetUnit>> {
        let mut tx = self.pool.begin().await?;

        let code_taken: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM asset_units WHERE product_id = $1 AND asset_code = $2)",
        )
        .bind(product_id)
        .bind(asset_code)
        .fetch_one(&mut *tx)
        .await?;

        if code_taken {
            return Err(AppError::DuplicateCode(format!(
                "Asset code '{}' already exists for product {}",
                asset_code, product_id
            )));
        }

        let units = sqlx::query_as::<_, AssetUnit>(
            r#"
            INSERT INTO asset_units (product_id, asset_code, status, notes)
            SELECT $1, $2, $3, $4 FROM generate_series(1, $5)
            RETURNING *
            "#,
        )
        .bind(product_id)
        .bind(asset_code)
        .bind(status)
        .bind(notes)
        .bind(count)
        .fetch_all(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(units)
    }

    /// Direct status override. The rental back-reference is cleared when the
    /// unit leaves rented and never touched otherwise.
    pub async fn set_status(
        &self,
        id: i32,
        status: AssetStatus,
        notes: Option<&str>,
    ) -> AppResult<AssetUnit> {
        sqlx::query_as::<_, AssetUnit>(
            r#"
            UPDATE asset_units
            SET status = $2,
                current_rental_id = CASE WHEN $2 = 1 THEN current_rental_id ELSE NULL END,
                notes = COALESCE($3, notes),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(status)
        .bind(notes)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Asset unit {} not found", id)))
    }

    /// Delete a unit; rejected while it is out on a rental
    pub async fn delete(&self, id: i32) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM asset_units WHERE id = $1 AND status <> $2")
            .bind(id)
            .bind(AssetStatus::Rented)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            // Distinguish a rented unit from a missing one
            let exists: bool =
                sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM asset_units WHERE id = $1)")
                    .bind(id)
                    .fetch_one(&self.pool)
                    .await?;
            if exists {
                return Err(AppError::AssetInUse(format!(
                    "Asset unit {} is currently rented",
                    id
                )));
            }
            return Err(AppError::NotFound(format!("Asset unit {} not found", id)));
        }
        Ok(())
    }

    /// Groups units sharing (asset_code, product_id) with a count per status.
    /// A group matches a status filter when it has at least one unit in it.
    pub async fn list_grouped(&self, query: &AssetQuery) -> AppResult<(Vec<GroupedAsset>, i64)> {
        let page = query.page.unwrap_or(1).max(1);
        let per_page = query.per_page.unwrap_or(20).clamp(1, 100);
        let offset = (page - 1) * per_page;

        const GROUPS: &str = r#"
            SELECT a.asset_code, a.product_id, p.name AS product_name,
                   COUNT(*) AS total,
                   COUNT(*) FILTER (WHERE a.status = 0) AS available,
                   COUNT(*) FILTER (WHERE a.status = 1) AS rented,
                   COUNT(*) FILTER (WHERE a.status = 2) AS maintenance,
                   COUNT(*) FILTER (WHERE a.status = 3) AS reserved,
                   COUNT(*) FILTER (WHERE a.status = 4) AS damaged
            FROM asset_units a
            JOIN products p ON p.id = a.product_id
            WHERE ($1::int IS NULL OR a.product_id = $1)
              AND ($3::text IS NULL
                   OR a.asset_code ILIKE '%' || $3 || '%'
                   OR p.name ILIKE '%' || $3 || '%')
            GROUP BY a.asset_code, a.product_id, p.name
            HAVING ($2::smallint IS NULL OR COUNT(*) FILTER (WHERE a.status = $2) > 0)
        "#;

        let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM ({}) g", GROUPS))
            .bind(query.product_id)
            .bind(query.status)
            .bind(&query.search)
            .fetch_one(&self.pool)
            .await?;

        let groups = sqlx::query_as::<_, GroupedAsset>(&format!(
            "{} ORDER BY p.name, a.asset_code LIMIT $4 OFFSET $5",
            GROUPS
        ))
        .bind(query.product_id)
        .bind(query.status)
        .bind(&query.search)
        .bind(per_page)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok((groups, total))
    }

    /// All currently claimable units, optionally for one product
    pub async fn list_available(&self, product_id: Option<i32>) -> AppResult<Vec<AssetUnit>> {
        let units = sqlx::query_as::<_, AssetUnit>(&format!(
            r#"{}
            WHERE a.status = $1 AND ($2::int IS NULL OR a.product_id = $2)
            ORDER BY a.asset_code, a.id
            "#,
            SELECT_WITH_PRODUCT
        ))
        .bind(AssetStatus::Available)
        .bind(product_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(units)
    }

    /// Available units grouped by (asset_code, product_id), carrying the
    /// claimable unit ids so a caller can pick concrete units from a group
    pub async fn list_available_grouped(&self) -> AppResult<Vec<AvailableGroup>> {
        let groups = sqlx::query_as::<_, AvailableGroup>(
            r#"
            SELECT a.asset_code, a.product_id, p.name AS product_name, p.daily_rate,
                   ARRAY_AGG(a.id ORDER BY a.id) AS unit_ids
            FROM asset_units a
            JOIN products p ON p.id = a.product_id
            WHERE a.status = $1
            GROUP BY a.asset_code, a.product_id, p.name, p.daily_rate
            ORDER BY p.name, a.asset_code
            "#,
        )
        .bind(AssetStatus::Available)
        .fetch_all(&self.pool)
        .await?;
        Ok(groups)
    }

    /// Claim every unit in `ids` for a rental: available -> rented with the
    /// back-reference set, on the caller's transaction. If any unit is not
    /// currently available the whole claim fails and nothing is modified
    /// (the caller rolls back).
    pub(crate) async fn claim(
        &self,
        conn: &mut PgConnection,
        ids: &[i32],
        rental_id: i32,
    ) -> AppResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE asset_units
            SET status = $3, current_rental_id = $2, updated_at = NOW()
            WHERE id = ANY($1) AND status = $4
            "#,
        )
        .bind(ids)
        .bind(rental_id)
        .bind(AssetStatus::Rented)
        .bind(AssetStatus::Available)
        .execute(conn)
        .await?;

        if result.rows_affected() != ids.len() as u64 {
            return Err(AppError::AssetsUnavailable(format!(
                "{} of {} requested asset units are not available",
                ids.len() as u64 - result.rows_affected(),
                ids.len()
            )));
        }
        Ok(())
    }

    /// Release units back to the pool: rented -> available, back-reference
    /// cleared. Units moved to maintenance/damaged mid-rental are left
    /// untouched rather than forced back to available.
    pub(crate) async fn release(&self, conn: &mut PgConnection, ids: &[i32]) -> AppResult<()> {
        sqlx::query(
            r#"
            UPDATE asset_units
            SET status = $2, current_rental_id = NULL, updated_at = NOW()
            WHERE id = ANY($1) AND status = $3
            "#,
        )
        .bind(ids)
        .bind(AssetStatus::Available)
        .bind(AssetStatus::Rented)
        .execute(conn)
        .await?;
        Ok(())
    }
}
