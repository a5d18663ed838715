//! API handlers for Tradepost REST endpoints

pub mod activity;
pub mod assets;
pub mod health;
pub mod openapi;
pub mod products;
pub mod rentals;
pub mod sales;
pub mod stock;

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::request::Parts,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::error::AppError;

/// Actor identifier for audit attribution, taken from the `x-actor` header.
/// Callers are trusted and already authorized; a missing header attributes
/// the mutation to "system".
pub struct Actor(pub String);

#[async_trait]
impl<S> FromRequestParts<S> for Actor
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let actor = parts
            .headers
            .get("x-actor")
            .and_then(|value| value.to_str().ok())
            .filter(|value| !value.is_empty())
            .unwrap_or("system")
            .to_string();

        Ok(Actor(actor))
    }
}

/// Paginated response wrapper
#[derive(Serialize, ToSchema)]
pub struct PaginatedResponse<T>
where
    T: for<'a> ToSchema<'a>,
{
    /// List of items
    pub items: Vec<T>,
    /// Total number of items
    pub total: i64,
    /// Current page number
    pub page: i64,
    /// Items per page
    pub per_page: i64,
}

impl<T> PaginatedResponse<T>
where
    T: for<'a> ToSchema<'a>,
{
    pub fn new(items: Vec<T>, total: i64, page: Option<i64>, per_page: Option<i64>) -> Self {
        Self {
            items,
            total,
            page: page.unwrap_or(1),
            per_page: per_page.unwrap_or(20),
        }
    }
}
