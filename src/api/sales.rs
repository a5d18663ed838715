//! Sale workflow endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

use crate::{
    error::AppResult,
    models::sale::{CreateSale, Sale, SaleQuery, UpdateSale, UpdateSaleStatus},
};

use super::{Actor, PaginatedResponse};

/// List sales with filters and pagination
#[utoipa::path(
    get,
    path = "/sales",
    tag = "sales",
    params(SaleQuery),
    responses(
        (status = 200, description = "List of sales", body = PaginatedResponse<Sale>)
    )
)]
pub async fn list_sales(
    State(state): State<crate::AppState>,
    Query(query): Query<SaleQuery>,
) -> AppResult<Json<PaginatedResponse<Sale>>> {
    let (items, total) = state.services.sales.list(&query).await?;
    Ok(Json(PaginatedResponse::new(
        items,
        total,
        query.page,
        query.per_page,
    )))
}

/// Get sale by ID
#[utoipa::path(
    get,
    path = "/sales/{id}",
    tag = "sales",
    params(("id" = i32, Path, description = "Sale ID")),
    responses(
        (status = 200, description = "Sale details", body = Sale),
        (status = 404, description = "Sale not found")
    )
)]
pub async fn get_sale(
    State(state): State<crate::AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<Sale>> {
    let sale = state.services.sales.get_by_id(id).await?;
    Ok(Json(sale))
}

/// Create a pending sale after validating stock availability
#[utoipa::path(
    post,
    path = "/sales",
    tag = "sales",
    request_body = CreateSale,
    responses(
        (status = 201, description = "Sale created", body = Sale),
        (status = 400, description = "Invalid input"),
        (status = 409, description = "Insufficient stock for a line item"),
        (status = 422, description = "A product is not countable stock")
    )
)]
pub async fn create_sale(
    State(state): State<crate::AppState>,
    Actor(actor): Actor,
    Json(data): Json<CreateSale>,
) -> AppResult<(StatusCode, Json<Sale>)> {
    let sale = state.services.sales.create(&data, &actor).await?;
    Ok((StatusCode::CREATED, Json(sale)))
}

/// Edit a pending sale
#[utoipa::path(
    put,
    path = "/sales/{id}",
    tag = "sales",
    params(("id" = i32, Path, description = "Sale ID")),
    request_body = UpdateSale,
    responses(
        (status = 200, description = "Sale updated", body = Sale),
        (status = 404, description = "Sale not found"),
        (status = 422, description = "Sale is not pending")
    )
)]
pub async fn update_sale(
    State(state): State<crate::AppState>,
    Actor(actor): Actor,
    Path(id): Path<i32>,
    Json(data): Json<UpdateSale>,
) -> AppResult<Json<Sale>> {
    let sale = state.services.sales.update(id, &data, &actor).await?;
    Ok(Json(sale))
}

/// Drive a status transition (complete deducts stock, cancel restores it)
#[utoipa::path(
    put,
    path = "/sales/{id}/status",
    tag = "sales",
    params(("id" = i32, Path, description = "Sale ID")),
    request_body = UpdateSaleStatus,
    responses(
        (status = 200, description = "Status updated", body = Sale),
        (status = 404, description = "Sale not found"),
        (status = 409, description = "Stock depleted since creation"),
        (status = 422, description = "Transition not permitted from the current status")
    )
)]
pub async fn update_sale_status(
    State(state): State<crate::AppState>,
    Actor(actor): Actor,
    Path(id): Path<i32>,
    Json(data): Json<UpdateSaleStatus>,
) -> AppResult<Json<Sale>> {
    let sale = state
        .services
        .sales
        .update_status(id, &data, &actor)
        .await?;
    Ok(Json(sale))
}

/// Delete a pending sale; completed/cancelled sales must be cancelled instead
#[utoipa::path(
    delete,
    path = "/sales/{id}",
    tag = "sales",
    params(("id" = i32, Path, description = "Sale ID")),
    responses(
        (status = 204, description = "Sale deleted"),
        (status = 404, description = "Sale not found"),
        (status = 422, description = "Sale is not pending")
    )
)]
pub async fn delete_sale(
    State(state): State<crate::AppState>,
    Actor(actor): Actor,
    Path(id): Path<i32>,
) -> AppResult<StatusCode> {
    state.services.sales.delete(id, &actor).await?;
    Ok(StatusCode::NO_CONTENT)
}
