//! Tradepost Rental & Sales Back-Office
//!
//! A Rust implementation of the Tradepost back-office server: an inventory
//! and transaction lifecycle engine for a business that sells countable
//! stock and rents out individually tracked units, exposed as a REST JSON
//! API.

use std::sync::Arc;

use sqlx::{Pool, Postgres};

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod repository;
pub mod services;

pub use config::AppConfig;
pub use error::{AppError, AppResult};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub services: Arc<services::Services>,
    pub pool: Pool<Postgres>,
}
