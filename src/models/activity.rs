//! Activity log (audit trail) model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};

/// Kind of mutation being recorded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[repr(i16)]
pub enum ActivityAction {
    Create = 0,
    Update = 1,
    Delete = 2,
}

/// Activity record from database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct ActivityLog {
    pub id: i32,
    pub actor: String,
    pub action: ActivityAction,
    pub entity_type: String,
    pub entity_id: i32,
    pub entity_name: String,
    /// `{old?, new?}` snapshot of the mutated fields
    #[schema(value_type = Object)]
    pub changes: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

/// A record to append; one per core mutation
#[derive(Debug, Clone)]
pub struct NewActivity {
    pub actor: String,
    pub action: ActivityAction,
    pub entity_type: &'static str,
    pub entity_id: i32,
    pub entity_name: String,
    pub changes: Option<serde_json::Value>,
}

/// Activity query parameters
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct ActivityQuery {
    pub entity_type: Option<String>,
    pub actor: Option<String>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}
