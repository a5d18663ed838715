//! OpenAPI documentation

use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{activity, assets, health, products, rentals, sales, stock};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Tradepost API",
        version = "0.3.0",
        description = "Rental & Sales Back-Office REST API",
        license(name = "AGPL-3.0", url = "https://www.gnu.org/licenses/agpl-3.0.html"),
        contact(name = "Tradepost Maintainers", email = "dev@tradepost.dev")
    ),
    servers(
        (url = "/api/v1", description = "API v1")
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Products
        products::list_products,
        products::get_product,
        products::create_product,
        // Stock
        stock::list_stock,
        stock::list_low_stock,
        stock::get_stock,
        stock::upsert_stock,
        stock::adjust_stock,
        // Assets
        assets::list_assets,
        assets::list_available,
        assets::list_available_grouped,
        assets::get_asset,
        assets::create_batch,
        assets::update_asset_status,
        assets::delete_asset,
        // Rentals
        rentals::list_rentals,
        rentals::get_rental,
        rentals::create_rental,
        rentals::update_rental,
        rentals::update_rental_status,
        // Sales
        sales::list_sales,
        sales::get_sale,
        sales::create_sale,
        sales::update_sale,
        sales::update_sale_status,
        sales::delete_sale,
        // Activity
        activity::list_activity,
    ),
    components(
        schemas(
            // Products
            crate::models::product::Product,
            crate::models::product::ProductKind,
            crate::models::product::CreateProduct,
            // Stock
            crate::models::stock::StockEntry,
            crate::models::stock::UpsertStock,
            crate::models::stock::AdjustStock,
            // Assets
            crate::models::asset::AssetUnit,
            crate::models::asset::AssetStatus,
            crate::models::asset::CreateAssetBatch,
            crate::models::asset::UpdateAssetStatus,
            crate::models::asset::GroupedAsset,
            crate::models::asset::AvailableGroup,
            // Rentals
            crate::models::rental::Rental,
            crate::models::rental::RentalStatus,
            crate::models::rental::CreateRental,
            crate::models::rental::UpdateRental,
            crate::models::rental::UpdateRentalStatus,
            // Sales
            crate::models::sale::Sale,
            crate::models::sale::SaleItem,
            crate::models::sale::SaleItemInput,
            crate::models::sale::SaleStatus,
            crate::models::sale::PaymentStatus,
            crate::models::sale::CreateSale,
            crate::models::sale::UpdateSale,
            crate::models::sale::UpdateSaleStatus,
            // Activity
            crate::models::activity::ActivityLog,
            crate::models::activity::ActivityAction,
            // Errors
            crate::error::ErrorResponse,
        )
    ),
    tags(
        (name = "health", description = "Service health"),
        (name = "products", description = "Product catalog"),
        (name = "stock", description = "Countable stock ledger"),
        (name = "assets", description = "Unit-tracked asset registry"),
        (name = "rentals", description = "Rental transaction workflow"),
        (name = "sales", description = "Sale transaction workflow"),
        (name = "activity", description = "Audit trail"),
    )
)]
pub struct ApiDoc;

/// Create the Swagger UI router serving the OpenAPI document
pub fn create_openapi_router() -> Router {
    Router::new().merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
