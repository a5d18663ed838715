//! Stock ledger endpoints

use axum::{
    extract::{Path, Query, State},
    Json,
};

use crate::{
    error::AppResult,
    models::stock::{AdjustStock, StockEntry, StockQuery, UpsertStock},
};

use super::{Actor, PaginatedResponse};

/// List stock entries with search and pagination
#[utoipa::path(
    get,
    path = "/stock",
    tag = "stock",
    params(StockQuery),
    responses(
        (status = 200, description = "List of stock entries", body = PaginatedResponse<StockEntry>)
    )
)]
pub async fn list_stock(
    State(state): State<crate::AppState>,
    Query(query): Query<StockQuery>,
) -> AppResult<Json<PaginatedResponse<StockEntry>>> {
    let (items, total) = state.services.stock.list(&query).await?;
    Ok(Json(PaginatedResponse::new(
        items,
        total,
        query.page,
        query.per_page,
    )))
}

/// Entries at or below their minimum quantity, most urgent first
#[utoipa::path(
    get,
    path = "/stock/low",
    tag = "stock",
    responses(
        (status = 200, description = "Low stock entries", body = Vec<StockEntry>)
    )
)]
pub async fn list_low_stock(
    State(state): State<crate::AppState>,
) -> AppResult<Json<Vec<StockEntry>>> {
    let entries = state.services.stock.list_low_stock().await?;
    Ok(Json(entries))
}

/// Get the stock entry for a product
#[utoipa::path(
    get,
    path = "/stock/{product_id}",
    tag = "stock",
    params(("product_id" = i32, Path, description = "Product ID")),
    responses(
        (status = 200, description = "Stock entry", body = StockEntry),
        (status = 404, description = "No entry for this product")
    )
)]
pub async fn get_stock(
    State(state): State<crate::AppState>,
    Path(product_id): Path<i32>,
) -> AppResult<Json<StockEntry>> {
    let entry = state.services.stock.get(product_id).await?;
    Ok(Json(entry))
}

/// Create or overwrite the stock entry for a product
#[utoipa::path(
    put,
    path = "/stock/{product_id}",
    tag = "stock",
    params(("product_id" = i32, Path, description = "Product ID")),
    request_body = UpsertStock,
    responses(
        (status = 200, description = "Stock entry upserted", body = StockEntry),
        (status = 404, description = "Product not found"),
        (status = 422, description = "Product is not countable stock")
    )
)]
pub async fn upsert_stock(
    State(state): State<crate::AppState>,
    Actor(actor): Actor,
    Path(product_id): Path<i32>,
    Json(data): Json<UpsertStock>,
) -> AppResult<Json<StockEntry>> {
    let entry = state.services.stock.upsert(product_id, &data, &actor).await?;
    Ok(Json(entry))
}

/// Adjust the quantity by a signed delta, atomically
#[utoipa::path(
    post,
    path = "/stock/{product_id}/adjust",
    tag = "stock",
    params(("product_id" = i32, Path, description = "Product ID")),
    request_body = AdjustStock,
    responses(
        (status = 200, description = "Quantity adjusted", body = StockEntry),
        (status = 404, description = "No entry for this product"),
        (status = 409, description = "Adjustment would drive quantity below zero")
    )
)]
pub async fn adjust_stock(
    State(state): State<crate::AppState>,
    Actor(actor): Actor,
    Path(product_id): Path<i32>,
    Json(data): Json<AdjustStock>,
) -> AppResult<Json<StockEntry>> {
    let entry = state.services.stock.adjust(product_id, &data, &actor).await?;
    Ok(Json(entry))
}
