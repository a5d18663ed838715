//! Asset registry endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use utoipa::IntoParams;

use crate::{
    error::AppResult,
    models::asset::{
        AssetQuery, AssetUnit, AvailableGroup, CreateAssetBatch, GroupedAsset, UpdateAssetStatus,
    },
};

use super::{Actor, PaginatedResponse};

#[derive(Debug, Deserialize, IntoParams)]
pub struct AvailableQuery {
    /// Restrict to one product
    pub product_id: Option<i32>,
}

/// List asset groups (units sharing a code) with per-status counts
#[utoipa::path(
    get,
    path = "/assets",
    tag = "assets",
    params(AssetQuery),
    responses(
        (status = 200, description = "Grouped asset units", body = PaginatedResponse<GroupedAsset>)
    )
)]
pub async fn list_assets(
    State(state): State<crate::AppState>,
    Query(query): Query<AssetQuery>,
) -> AppResult<Json<PaginatedResponse<GroupedAsset>>> {
    let (items, total) = state.services.assets.list_grouped(&query).await?;
    Ok(Json(PaginatedResponse::new(
        items,
        total,
        query.page,
        query.per_page,
    )))
}

/// List currently available units
#[utoipa::path(
    get,
    path = "/assets/available",
    tag = "assets",
    params(AvailableQuery),
    responses(
        (status = 200, description = "Available asset units", body = Vec<AssetUnit>)
    )
)]
pub async fn list_available(
    State(state): State<crate::AppState>,
    Query(query): Query<AvailableQuery>,
) -> AppResult<Json<Vec<AssetUnit>>> {
    let units = state.services.assets.list_available(query.product_id).await?;
    Ok(Json(units))
}

/// Available units grouped by code, with claimable unit ids per group
#[utoipa::path(
    get,
    path = "/assets/available/grouped",
    tag = "assets",
    responses(
        (status = 200, description = "Available asset groups", body = Vec<AvailableGroup>)
    )
)]
pub async fn list_available_grouped(
    State(state): State<crate::AppState>,
) -> AppResult<Json<Vec<AvailableGroup>>> {
    let groups = state.services.assets.list_available_grouped().await?;
    Ok(Json(groups))
}

/// Get a single asset unit
#[utoipa::path(
    get,
    path = "/assets/{id}",
    tag = "assets",
    params(("id" = i32, Path, description = "Asset unit ID")),
    responses(
        (status = 200, description = "Asset unit", body = AssetUnit),
        (status = 404, description = "Asset unit not found")
    )
)]
pub async fn get_asset(
    State(state): State<crate::AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<AssetUnit>> {
    let unit = state.services.assets.get(id).await?;
    Ok(Json(unit))
}

/// Intake a batch of units sharing one asset code
#[utoipa::path(
    post,
    path = "/assets/batch",
    tag = "assets",
    request_body = CreateAssetBatch,
    responses(
        (status = 201, description = "Units created", body = Vec<AssetUnit>),
        (status = 404, description = "Product not found"),
        (status = 409, description = "Asset code already used for this product"),
        (status = 422, description = "Product is not unit-tracked")
    )
)]
pub async fn create_batch(
    State(state): State<crate::AppState>,
    Actor(actor): Actor,
    Json(data): Json<CreateAssetBatch>,
) -> AppResult<(StatusCode, Json<Vec<AssetUnit>>)> {
    let units = state.services.assets.create_batch(&data, &actor).await?;
    Ok((StatusCode::CREATED, Json(units)))
}

/// Override a unit's status (maintenance/damage marking)
#[utoipa::path(
    put,
    path = "/assets/{id}/status",
    tag = "assets",
    params(("id" = i32, Path, description = "Asset unit ID")),
    request_body = UpdateAssetStatus,
    responses(
        (status = 200, description = "Status updated", body = AssetUnit),
        (status = 404, description = "Asset unit not found")
    )
)]
pub async fn update_asset_status(
    State(state): State<crate::AppState>,
    Actor(actor): Actor,
    Path(id): Path<i32>,
    Json(data): Json<UpdateAssetStatus>,
) -> AppResult<Json<AssetUnit>> {
    let unit = state.services.assets.set_status(id, &data, &actor).await?;
    Ok(Json(unit))
}

/// Delete a unit; rejected while it is out on a rental
#[utoipa::path(
    delete,
    path = "/assets/{id}",
    tag = "assets",
    params(("id" = i32, Path, description = "Asset unit ID")),
    responses(
        (status = 204, description = "Unit deleted"),
        (status = 404, description = "Asset unit not found"),
        (status = 409, description = "Unit is currently rented")
    )
)]
pub async fn delete_asset(
    State(state): State<crate::AppState>,
    Actor(actor): Actor,
    Path(id): Path<i32>,
) -> AppResult<StatusCode> {
    state.services.assets.delete(id, &actor).await?;
    Ok(StatusCode::NO_CONTENT)
}
