//! Stock ledger model and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

/// Stock entry model from database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct StockEntry {
    pub id: i32,
    pub product_id: i32,
    pub quantity: i32,
    pub min_quantity: i32,
    pub last_modified_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    // Populated when queried with a product JOIN, absent otherwise
    #[sqlx(default)]
    #[serde(default)]
    pub product_name: Option<String>,
    #[sqlx(default)]
    #[serde(default)]
    pub product_sku: Option<String>,
}

/// Upsert stock request: creates the ledger row if absent, overwrites otherwise
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpsertStock {
    #[validate(range(min = 0, message = "Quantity must not be negative"))]
    pub quantity: i32,
    #[validate(range(min = 0, message = "Minimum quantity must not be negative"))]
    pub min_quantity: i32,
}

/// Delta adjustment request
#[derive(Debug, Deserialize, ToSchema)]
pub struct AdjustStock {
    /// Signed quantity delta; a result below zero is rejected in full
    pub delta: i32,
    pub reason: Option<String>,
}

/// Stock query parameters
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct StockQuery {
    /// Substring match on product name or SKU
    pub search: Option<String>,
    /// Only entries at or below their minimum quantity
    pub low_stock_only: Option<bool>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}
