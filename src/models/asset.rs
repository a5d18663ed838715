//! Asset unit (rental-trackable item) model and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

/// Asset unit status state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[repr(i16)]
pub enum AssetStatus {
    Available = 0,
    Rented = 1,
    Maintenance = 2,
    Reserved = 3,
    Damaged = 4,
}

impl AssetStatus {
    pub fn label(self) -> &'static str {
        match self {
            AssetStatus::Available => "available",
            AssetStatus::Rented => "rented",
            AssetStatus::Maintenance => "maintenance",
            AssetStatus::Reserved => "reserved",
            AssetStatus::Damaged => "damaged",
        }
    }
}

/// Asset unit model from database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct AssetUnit {
    pub id: i32,
    pub product_id: i32,
    /// Group label shared by interchangeable units of the same kind
    pub asset_code: String,
    pub status: AssetStatus,
    /// Set if and only if status = rented
    pub current_rental_id: Option<i32>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[sqlx(default)]
    #[serde(default)]
    pub product_name: Option<String>,
}

/// Batch intake request: creates `count` independent units sharing one code
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateAssetBatch {
    pub product_id: i32,
    #[validate(length(min = 1, message = "Asset code must not be empty"))]
    pub asset_code: String,
    #[validate(range(min = 1, message = "Count must be at least 1"))]
    pub count: i32,
    /// Initial status; defaults to available
    pub status: Option<AssetStatus>,
    pub notes: Option<String>,
}

/// Direct status override request (maintenance/damage marking)
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateAssetStatus {
    pub status: AssetStatus,
    pub notes: Option<String>,
}

/// Asset query parameters
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct AssetQuery {
    pub product_id: Option<i32>,
    /// A group matches when it has at least one unit in this status
    pub status: Option<i16>,
    /// Substring match on asset code or product name
    pub search: Option<String>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

/// Units sharing (asset_code, product_id), with a count per status
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct GroupedAsset {
    pub asset_code: String,
    pub product_id: i32,
    pub product_name: String,
    pub total: i64,
    pub available: i64,
    pub rented: i64,
    pub maintenance: i64,
    pub reserved: i64,
    pub damaged: i64,
}

/// An available group with its claimable unit ids, for rental creation
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct AvailableGroup {
    pub asset_code: String,
    pub product_id: i32,
    pub product_name: String,
    pub daily_rate: Option<rust_decimal::Decimal>,
    pub unit_ids: Vec<i32>,
}
