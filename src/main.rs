//! Tradepost Server - Rental & Sales Back-Office
//!
//! REST API server over the inventory and transaction lifecycle engine.

use axum::{
    routing::{delete, get, post, put},
    Router,
};
use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tradepost_server::{
    api,
    config::AppConfig,
    repository::Repository,
    services::Services,
    AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Load configuration
    let config = AppConfig::load().expect("Failed to load configuration");

    // Initialize tracing
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!(
            "tradepost_server={},tower_http=debug",
            config.logging.level
        )
        .into()
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Tradepost Server v{}", env!("CARGO_PKG_VERSION"));

    // Create database connection pool
    let pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .min_connections(config.database.min_connections)
        .connect(&config.database.url)
        .await
        .expect("Failed to connect to database");

    tracing::info!("Connected to database");

    // Run migrations
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run database migrations");

    tracing::info!("Database migrations completed");

    // Save server address before moving config
    let server_host = config.server.host.clone();
    let server_port = config.server.port;

    // Create repository and services
    let repository = Repository::new(pool.clone());
    let services = Services::new(repository);

    // Create application state
    let state = AppState {
        config: Arc::new(config),
        services: Arc::new(services),
        pool,
    };

    // Build router
    let app = create_router(state);

    // Start server
    let addr = SocketAddr::new(
        server_host.parse().expect("Invalid host address"),
        server_port,
    );

    tracing::info!("Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Create the application router with all routes
fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // API v1 routes
    let api_v1 = Router::new()
        // Health check
        .route("/health", get(api::health::health_check))
        .route("/ready", get(api::health::readiness_check))
        // Products (catalog)
        .route("/products", get(api::products::list_products))
        .route("/products", post(api::products::create_product))
        .route("/products/:id", get(api::products::get_product))
        // Stock ledger
        .route("/stock", get(api::stock::list_stock))
        .route("/stock/low", get(api::stock::list_low_stock))
        .route("/stock/:product_id", get(api::stock::get_stock))
        .route("/stock/:product_id", put(api::stock::upsert_stock))
        .route("/stock/:product_id/adjust", post(api::stock::adjust_stock))
        // Asset registry
        .route("/assets", get(api::assets::list_assets))
        .route("/assets/batch", post(api::assets::create_batch))
        .route("/assets/available", get(api::assets::list_available))
        .route(
            "/assets/available/grouped",
            get(api::assets::list_available_grouped),
        )
        .route("/assets/:id", get(api::assets::get_asset))
        .route("/assets/:id", delete(api::assets::delete_asset))
        .route("/assets/:id/status", put(api::assets::update_asset_status))
        // Rentals
        .route("/rentals", get(api::rentals::list_rentals))
        .route("/rentals", post(api::rentals::create_rental))
        .route("/rentals/:id", get(api::rentals::get_rental))
        .route("/rentals/:id", put(api::rentals::update_rental))
        .route(
            "/rentals/:id/status",
            put(api::rentals::update_rental_status),
        )
        // Sales
        .route("/sales", get(api::sales::list_sales))
        .route("/sales", post(api::sales::create_sale))
        .route("/sales/:id", get(api::sales::get_sale))
        .route("/sales/:id", put(api::sales::update_sale))
        .route("/sales/:id", delete(api::sales::delete_sale))
        .route("/sales/:id/status", put(api::sales::update_sale_status))
        // Activity log
        .route("/activity", get(api::activity::list_activity))
        .with_state(state);

    // OpenAPI documentation
    let openapi = api::openapi::create_openapi_router();

    Router::new()
        .nest("/api/v1", api_v1)
        .merge(openapi)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
