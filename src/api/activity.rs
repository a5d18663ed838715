//! Activity log endpoints

use axum::{
    extract::{Query, State},
    Json,
};

use crate::{
    error::AppResult,
    models::activity::{ActivityLog, ActivityQuery},
};

use super::PaginatedResponse;

/// List audit records, newest first
#[utoipa::path(
    get,
    path = "/activity",
    tag = "activity",
    params(ActivityQuery),
    responses(
        (status = 200, description = "Audit records", body = PaginatedResponse<ActivityLog>)
    )
)]
pub async fn list_activity(
    State(state): State<crate::AppState>,
    Query(query): Query<ActivityQuery>,
) -> AppResult<Json<PaginatedResponse<ActivityLog>>> {
    let (items, total) = state.services.activity.list(&query).await?;
    Ok(Json(PaginatedResponse::new(
        items,
        total,
        query.page,
        query.per_page,
    )))
}
