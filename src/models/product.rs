//! Product catalog model and related types
//!
//! The engine only reads `{id, kind, pricing}` from the catalog; the slim
//! create/get/list surface exists so the server is self-contained.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

/// How a product's inventory is tracked
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[repr(i16)]
pub enum ProductKind {
    /// Tracked purely by a numeric quantity
    Countable = 0,
    /// Each physical unit has its own identity and status
    UnitTracked = 1,
}

impl ProductKind {
    pub fn label(self) -> &'static str {
        match self {
            ProductKind::Countable => "countable",
            ProductKind::UnitTracked => "unit-tracked",
        }
    }
}

/// Product model from database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Product {
    pub id: i32,
    pub name: String,
    pub sku: String,
    pub description: Option<String>,
    pub kind: ProductKind,
    /// Sale price per unit (countable products)
    pub unit_price: Option<Decimal>,
    /// Rental rate per day (unit-tracked products)
    pub daily_rate: Option<Decimal>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Create product request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateProduct {
    #[validate(length(min = 1, message = "Name must not be empty"))]
    pub name: String,
    #[validate(length(min = 1, message = "SKU must not be empty"))]
    pub sku: String,
    pub description: Option<String>,
    pub kind: ProductKind,
    pub unit_price: Option<Decimal>,
    pub daily_rate: Option<Decimal>,
}

/// Product query parameters
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct ProductQuery {
    /// Substring match on name or SKU
    pub search: Option<String>,
    pub kind: Option<i16>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}
