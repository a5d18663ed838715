//! Product catalog endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

use crate::{
    error::AppResult,
    models::product::{CreateProduct, Product, ProductQuery},
};

use super::{Actor, PaginatedResponse};

/// List products with search and pagination
#[utoipa::path(
    get,
    path = "/products",
    tag = "products",
    params(ProductQuery),
    responses(
        (status = 200, description = "List of products", body = PaginatedResponse<Product>)
    )
)]
pub async fn list_products(
    State(state): State<crate::AppState>,
    Query(query): Query<ProductQuery>,
) -> AppResult<Json<PaginatedResponse<Product>>> {
    let (items, total) = state.services.products.list(&query).await?;
    Ok(Json(PaginatedResponse::new(
        items,
        total,
        query.page,
        query.per_page,
    )))
}

/// Get product by ID
#[utoipa::path(
    get,
    path = "/products/{id}",
    tag = "products",
    params(("id" = i32, Path, description = "Product ID")),
    responses(
        (status = 200, description = "Product details", body = Product),
        (status = 404, description = "Product not found")
    )
)]
pub async fn get_product(
    State(state): State<crate::AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<Product>> {
    let product = state.services.products.get(id).await?;
    Ok(Json(product))
}

/// Create a new product
#[utoipa::path(
    post,
    path = "/products",
    tag = "products",
    request_body = CreateProduct,
    responses(
        (status = 201, description = "Product created", body = Product),
        (status = 400, description = "Invalid input"),
        (status = 409, description = "SKU already exists")
    )
)]
pub async fn create_product(
    State(state): State<crate::AppState>,
    Actor(actor): Actor,
    Json(data): Json<CreateProduct>,
) -> AppResult<(StatusCode, Json<Product>)> {
    let product = state.services.products.create(&data, &actor).await?;
    Ok((StatusCode::CREATED, Json(product)))
}
