//! Engine property tests against a real database.
//!
//! Run with a provisioned Postgres and DATABASE_URL set:
//!   cargo test --test engine_tests -- --ignored

use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use sqlx::postgres::PgPoolOptions;

use tradepost_server::{
    error::AppError,
    models::{
        asset::CreateAssetBatch,
        product::{CreateProduct, ProductKind},
        rental::{CreateRental, RentalStatus, UpdateRentalStatus},
        sale::{CreateSale, SaleItemInput, SaleStatus, UpdateSaleStatus},
        stock::{AdjustStock, UpsertStock},
    },
    repository::Repository,
    services::Services,
};

const ACTOR: &str = "engine-tests";

async fn setup() -> Services {
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let pool = PgPoolOptions::new()
        .max_connections(20)
        .connect(&url)
        .await
        .expect("Failed to connect to database");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run migrations");
    Services::new(Repository::new(pool))
}

fn unique_sku(prefix: &str) -> String {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    format!("{}-{}", prefix, nanos)
}

async fn countable_product(services: &Services, stock: i32) -> i32 {
    let product = services
        .products
        .create(
            &CreateProduct {
                name: "Test widget".to_string(),
                sku: unique_sku("WID"),
                description: None,
                kind: ProductKind::Countable,
                unit_price: Some(Decimal::from(25)),
                daily_rate: None,
            },
            ACTOR,
        )
        .await
        .expect("create product");

    services
        .stock
        .upsert(
            product.id,
            &UpsertStock {
                quantity: stock,
                min_quantity: 0,
            },
            ACTOR,
        )
        .await
        .expect("upsert stock");

    product.id
}

async fn tracked_units(services: &Services, count: i32) -> (i32, Vec<i32>) {
    let product = services
        .products
        .create(
            &CreateProduct {
                name: "Test trailer".to_string(),
                sku: unique_sku("TRL"),
                description: None,
                kind: ProductKind::UnitTracked,
                unit_price: None,
                daily_rate: Some(Decimal::from(100)),
            },
            ACTOR,
        )
        .await
        .expect("create product");

    let units = services
        .assets
        .create_batch(
            &CreateAssetBatch {
                product_id: product.id,
                asset_code: unique_sku("CODE"),
                count,
                status: None,
                notes: None,
            },
            ACTOR,
        )
        .await
        .expect("create batch");

    (product.id, units.into_iter().map(|u| u.id).collect())
}

fn rental_over(unit_ids: Vec<i32>) -> CreateRental {
    let start = Utc::now();
    CreateRental {
        customer_name: "Test Customer".to_string(),
        customer_email: None,
        customer_phone: None,
        asset_unit_ids: unit_ids,
        start_date: start,
        end_date: start + Duration::days(3),
        daily_rate: Decimal::from(100),
        deposit: None,
        penalty_rate: None,
        notes: None,
    }
}

/// Concurrent adjustments never drive a quantity negative, and the final
/// quantity is the initial value plus the sum of the applied deltas.
#[tokio::test(flavor = "multi_thread")]
#[ignore]
async fn concurrent_adjustments_never_go_negative() {
    let services = setup().await;
    let product_id = countable_product(&services, 50).await;

    // 15 concurrent decrements of 5 against 50 in stock: exactly 10 can land
    let mut handles = Vec::new();
    for _ in 0..15 {
        let services = services.clone();
        handles.push(tokio::spawn(async move {
            services
                .stock
                .adjust(
                    product_id,
                    &AdjustStock {
                        delta: -5,
                        reason: None,
                    },
                    ACTOR,
                )
                .await
        }));
    }

    let mut applied = 0;
    let mut rejected = 0;
    for handle in handles {
        match handle.await.expect("task panicked") {
            Ok(entry) => {
                assert!(entry.quantity >= 0);
                applied += 1;
            }
            Err(AppError::InsufficientStock(_)) => rejected += 1,
            Err(e) => panic!("unexpected error: {}", e),
        }
    }

    assert_eq!(applied, 10);
    assert_eq!(rejected, 5);

    let entry = services.stock.get(product_id).await.expect("get stock");
    assert_eq!(entry.quantity, 0);
}

/// Two rentals racing for the same unit: exactly one wins the claim.
#[tokio::test(flavor = "multi_thread")]
#[ignore]
async fn concurrent_claims_allocate_a_unit_once() {
    let services = setup().await;
    let (_, unit_ids) = tracked_units(&services, 1).await;

    let a = {
        let services = services.clone();
        let ids = unit_ids.clone();
        tokio::spawn(async move { services.rentals.create(&rental_over(ids), ACTOR).await })
    };
    let b = {
        let services = services.clone();
        let ids = unit_ids.clone();
        tokio::spawn(async move { services.rentals.create(&rental_over(ids), ACTOR).await })
    };

    let results = [a.await.expect("task"), b.await.expect("task")];
    let won = results.iter().filter(|r| r.is_ok()).count();
    let lost = results
        .iter()
        .filter(|r| matches!(r, Err(AppError::AssetsUnavailable(_))))
        .count();

    assert_eq!(won, 1);
    assert_eq!(lost, 1);
}

/// Completing a sale deducts stock; cancelling the completed sale restores it.
#[tokio::test]
#[ignore]
async fn sale_complete_then_cancel_round_trips_stock() {
    let services = setup().await;
    let product_id = countable_product(&services, 10).await;

    let sale = services
        .sales
        .create(
            &CreateSale {
                customer_name: "Test Customer".to_string(),
                customer_email: None,
                customer_phone: None,
                items: vec![SaleItemInput {
                    product_id,
                    quantity: 4,
                    unit_price: Decimal::from(25),
                }],
                discount: None,
                tax: None,
                payment_status: None,
                paid_amount: None,
                notes: None,
            },
            ACTOR,
        )
        .await
        .expect("create sale");

    // Creation validates but does not deduct
    assert_eq!(services.stock.get(product_id).await.unwrap().quantity, 10);

    services
        .sales
        .update_status(
            sale.id,
            &UpdateSaleStatus {
                status: SaleStatus::Completed,
                notes: None,
            },
            ACTOR,
        )
        .await
        .expect("complete sale");
    assert_eq!(services.stock.get(product_id).await.unwrap().quantity, 6);

    services
        .sales
        .update_status(
            sale.id,
            &UpdateSaleStatus {
                status: SaleStatus::Cancelled,
                notes: None,
            },
            ACTOR,
        )
        .await
        .expect("cancel sale");
    assert_eq!(services.stock.get(product_id).await.unwrap().quantity, 10);

    // Cancelled is terminal
    let err = services
        .sales
        .update_status(
            sale.id,
            &UpdateSaleStatus {
                status: SaleStatus::Completed,
                notes: None,
            },
            ACTOR,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidTransition(_)));
}

/// A multi-item completion where one item is depleted applies nothing.
#[tokio::test]
#[ignore]
async fn sale_completion_is_all_or_nothing() {
    let services = setup().await;
    let plentiful = countable_product(&services, 100).await;
    let scarce = countable_product(&services, 1).await;

    let sale = services
        .sales
        .create(
            &CreateSale {
                customer_name: "Test Customer".to_string(),
                customer_email: None,
                customer_phone: None,
                items: vec![
                    SaleItemInput {
                        product_id: plentiful,
                        quantity: 10,
                        unit_price: Decimal::from(5),
                    },
                    SaleItemInput {
                        product_id: scarce,
                        quantity: 1,
                        unit_price: Decimal::from(5),
                    },
                ],
                discount: None,
                tax: None,
                payment_status: None,
                paid_amount: None,
                notes: None,
            },
            ACTOR,
        )
        .await
        .expect("create sale");

    // Deplete the scarce product between creation and completion
    services
        .stock
        .adjust(
            scarce,
            &AdjustStock {
                delta: -1,
                reason: Some("sold at the counter".to_string()),
            },
            ACTOR,
        )
        .await
        .expect("deplete");

    let err = services
        .sales
        .update_status(
            sale.id,
            &UpdateSaleStatus {
                status: SaleStatus::Completed,
                notes: None,
            },
            ACTOR,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InsufficientStock(_)));

    // The plentiful item's deduction was rolled back with the rest
    assert_eq!(services.stock.get(plentiful).await.unwrap().quantity, 100);
    assert_eq!(
        services.sales.get_by_id(sale.id).await.unwrap().status,
        SaleStatus::Pending
    );
}

/// A rented unit cannot be deleted; a released one can.
#[tokio::test]
#[ignore]
async fn rented_unit_delete_is_rejected_until_release() {
    let services = setup().await;
    let (_, unit_ids) = tracked_units(&services, 1).await;
    let unit_id = unit_ids[0];

    let rental = services
        .rentals
        .create(&rental_over(unit_ids), ACTOR)
        .await
        .expect("create rental");

    let err = services.assets.delete(unit_id, ACTOR).await.unwrap_err();
    assert!(matches!(err, AppError::AssetInUse(_)));

    // Activate, then complete: the unit goes back to available
    services
        .rentals
        .update_status(
            rental.id,
            &UpdateRentalStatus {
                status: RentalStatus::Active,
                actual_return_date: None,
                penalty_rate: None,
                notes: None,
            },
            ACTOR,
        )
        .await
        .expect("activate");
    services
        .rentals
        .update_status(
            rental.id,
            &UpdateRentalStatus {
                status: RentalStatus::Completed,
                actual_return_date: None,
                penalty_rate: None,
                notes: None,
            },
            ACTOR,
        )
        .await
        .expect("complete");

    services
        .assets
        .delete(unit_id, ACTOR)
        .await
        .expect("delete after release");
}

/// Completing a rental three days late charges days x rate x multiplier.
#[tokio::test]
#[ignore]
async fn late_return_charges_the_penalty() {
    let services = setup().await;
    let (_, unit_ids) = tracked_units(&services, 1).await;

    let rental = services
        .rentals
        .create(&rental_over(unit_ids), ACTOR)
        .await
        .expect("create rental");
    assert_eq!(rental.total_amount, Decimal::from(300));

    services
        .rentals
        .update_status(
            rental.id,
            &UpdateRentalStatus {
                status: RentalStatus::Active,
                actual_return_date: None,
                penalty_rate: None,
                notes: None,
            },
            ACTOR,
        )
        .await
        .expect("activate");

    let completed = services
        .rentals
        .update_status(
            rental.id,
            &UpdateRentalStatus {
                status: RentalStatus::Completed,
                actual_return_date: Some(rental.end_date + Duration::days(3)),
                penalty_rate: None,
                notes: None,
            },
            ACTOR,
        )
        .await
        .expect("complete");

    // 3 days x 100/day x 1.5
    assert_eq!(completed.penalty_amount, Decimal::from(450));

    // Terminal: no further transitions
    let err = services
        .rentals
        .update_status(
            rental.id,
            &UpdateRentalStatus {
                status: RentalStatus::Active,
                actual_return_date: None,
                penalty_rate: None,
                notes: None,
            },
            ACTOR,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidTransition(_)));
}

/// Cancelling a rental releases every claimed unit.
#[tokio::test]
#[ignore]
async fn cancellation_releases_all_units() {
    let services = setup().await;
    let (product_id, unit_ids) = tracked_units(&services, 3).await;

    let rental = services
        .rentals
        .create(&rental_over(unit_ids.clone()), ACTOR)
        .await
        .expect("create rental");

    let available = services
        .assets
        .list_available(Some(product_id))
        .await
        .expect("list available");
    assert!(available.is_empty());

    services
        .rentals
        .update_status(
            rental.id,
            &UpdateRentalStatus {
                status: RentalStatus::Cancelled,
                actual_return_date: None,
                penalty_rate: None,
                notes: Some("customer changed their mind".to_string()),
            },
            ACTOR,
        )
        .await
        .expect("cancel");

    let available = services
        .assets
        .list_available(Some(product_id))
        .await
        .expect("list available");
    assert_eq!(available.len(), unit_ids.len());
    assert!(available.iter().all(|u| u.current_rental_id.is_none()));
}

/// listLowStock returns only entries at or below their minimum, ascending.
#[tokio::test]
#[ignore]
async fn low_stock_listing_is_filtered_and_sorted() {
    let services = setup().await;

    let low_a = countable_product(&services, 100).await;
    let low_b = countable_product(&services, 100).await;
    let healthy = countable_product(&services, 100).await;

    services
        .stock
        .upsert(low_a, &UpsertStock { quantity: 3, min_quantity: 5 }, ACTOR)
        .await
        .unwrap();
    services
        .stock
        .upsert(low_b, &UpsertStock { quantity: 1, min_quantity: 5 }, ACTOR)
        .await
        .unwrap();
    services
        .stock
        .upsert(healthy, &UpsertStock { quantity: 50, min_quantity: 5 }, ACTOR)
        .await
        .unwrap();

    let low = services.stock.list_low_stock().await.expect("low stock");

    assert!(low.iter().all(|e| e.quantity <= e.min_quantity));
    assert!(low.windows(2).all(|w| w[0].quantity <= w[1].quantity));
    assert!(low.iter().any(|e| e.product_id == low_a));
    assert!(low.iter().any(|e| e.product_id == low_b));
    assert!(!low.iter().any(|e| e.product_id == healthy));
}
