//! Rental workflow endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

use crate::{
    error::AppResult,
    models::rental::{CreateRental, Rental, RentalQuery, UpdateRental, UpdateRentalStatus},
};

use super::{Actor, PaginatedResponse};

/// List rentals; active ones carry a live penalty against now
#[utoipa::path(
    get,
    path = "/rentals",
    tag = "rentals",
    params(RentalQuery),
    responses(
        (status = 200, description = "List of rentals", body = PaginatedResponse<Rental>)
    )
)]
pub async fn list_rentals(
    State(state): State<crate::AppState>,
    Query(query): Query<RentalQuery>,
) -> AppResult<Json<PaginatedResponse<Rental>>> {
    let (items, total) = state.services.rentals.list(&query).await?;
    Ok(Json(PaginatedResponse::new(
        items,
        total,
        query.page,
        query.per_page,
    )))
}

/// Get rental by ID
#[utoipa::path(
    get,
    path = "/rentals/{id}",
    tag = "rentals",
    params(("id" = i32, Path, description = "Rental ID")),
    responses(
        (status = 200, description = "Rental details", body = Rental),
        (status = 404, description = "Rental not found")
    )
)]
pub async fn get_rental(
    State(state): State<crate::AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<Rental>> {
    let rental = state.services.rentals.get_by_id(id).await?;
    Ok(Json(rental))
}

/// Create a rental, claiming every requested unit atomically
#[utoipa::path(
    post,
    path = "/rentals",
    tag = "rentals",
    request_body = CreateRental,
    responses(
        (status = 201, description = "Rental created", body = Rental),
        (status = 400, description = "Invalid input"),
        (status = 409, description = "One or more units are not available")
    )
)]
pub async fn create_rental(
    State(state): State<crate::AppState>,
    Actor(actor): Actor,
    Json(data): Json<CreateRental>,
) -> AppResult<(StatusCode, Json<Rental>)> {
    let rental = state.services.rentals.create(&data, &actor).await?;
    Ok((StatusCode::CREATED, Json(rental)))
}

/// Edit a mutable rental (dates, rate, customer, asset set)
#[utoipa::path(
    put,
    path = "/rentals/{id}",
    tag = "rentals",
    params(("id" = i32, Path, description = "Rental ID")),
    request_body = UpdateRental,
    responses(
        (status = 200, description = "Rental updated", body = Rental),
        (status = 404, description = "Rental not found"),
        (status = 409, description = "Replacement units are not available"),
        (status = 422, description = "Rental is completed or cancelled")
    )
)]
pub async fn update_rental(
    State(state): State<crate::AppState>,
    Actor(actor): Actor,
    Path(id): Path<i32>,
    Json(data): Json<UpdateRental>,
) -> AppResult<Json<Rental>> {
    let rental = state.services.rentals.update(id, &data, &actor).await?;
    Ok(Json(rental))
}

/// Drive a status transition (activate, complete, cancel)
#[utoipa::path(
    put,
    path = "/rentals/{id}/status",
    tag = "rentals",
    params(("id" = i32, Path, description = "Rental ID")),
    request_body = UpdateRentalStatus,
    responses(
        (status = 200, description = "Status updated", body = Rental),
        (status = 404, description = "Rental not found"),
        (status = 422, description = "Transition not permitted from the current status")
    )
)]
pub async fn update_rental_status(
    State(state): State<crate::AppState>,
    Actor(actor): Actor,
    Path(id): Path<i32>,
    Json(data): Json<UpdateRentalStatus>,
) -> AppResult<Json<Rental>> {
    let rental = state
        .services
        .rentals
        .update_status(id, &data, &actor)
        .await?;
    Ok(Json(rental))
}
