//! API integration tests against a running server.
//!
//! Run with the server listening on localhost:8080:
//!   cargo test --test api_tests -- --ignored

use reqwest::Client;
use serde_json::{json, Value};

const BASE_URL: &str = "http://localhost:8080/api/v1";

fn unique_sku(prefix: &str) -> String {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    format!("{}-{}", prefix, nanos)
}

/// Helper to create a countable product with stock, returning its id
async fn seed_countable(client: &Client, quantity: i32) -> i64 {
    let response = client
        .post(format!("{}/products", BASE_URL))
        .header("x-actor", "api-tests")
        .json(&json!({
            "name": "Smoke-test widget",
            "sku": unique_sku("WID"),
            "kind": "Countable",
            "unit_price": "25.00"
        }))
        .send()
        .await
        .expect("Failed to create product");
    assert_eq!(response.status(), 201);

    let body: Value = response.json().await.expect("Failed to parse response");
    let product_id = body["id"].as_i64().expect("No product ID");

    let response = client
        .put(format!("{}/stock/{}", BASE_URL, product_id))
        .header("x-actor", "api-tests")
        .json(&json!({ "quantity": quantity, "min_quantity": 0 }))
        .send()
        .await
        .expect("Failed to upsert stock");
    assert!(response.status().is_success());

    product_id
}

#[tokio::test]
#[ignore]
async fn test_health_check() {
    let client = Client::new();

    let response = client
        .get(format!("{}/health", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
#[ignore]
async fn test_readiness_check() {
    let client = Client::new();

    let response = client
        .get(format!("{}/ready", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["status"], "ready");
}

#[tokio::test]
#[ignore]
async fn test_list_products() {
    let client = Client::new();

    let response = client
        .get(format!("{}/products", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert!(body["items"].is_array());
    assert!(body["total"].is_number());
}

#[tokio::test]
#[ignore]
async fn test_stock_adjust_and_low_stock() {
    let client = Client::new();
    let product_id = seed_countable(&client, 10).await;

    // Adjust down
    let response = client
        .post(format!("{}/stock/{}/adjust", BASE_URL, product_id))
        .header("x-actor", "api-tests")
        .json(&json!({ "delta": -4, "reason": "damaged in transit" }))
        .send()
        .await
        .expect("Failed to adjust");
    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["quantity"], 6);

    // Over-draining is rejected in full
    let response = client
        .post(format!("{}/stock/{}/adjust", BASE_URL, product_id))
        .header("x-actor", "api-tests")
        .json(&json!({ "delta": -100 }))
        .send()
        .await
        .expect("Failed to send adjust");
    assert_eq!(response.status(), 409);

    let body: Value = client
        .get(format!("{}/stock/{}", BASE_URL, product_id))
        .send()
        .await
        .expect("Failed to get stock")
        .json()
        .await
        .expect("Failed to parse response");
    assert_eq!(body["quantity"], 6);
}

#[tokio::test]
#[ignore]
async fn test_sale_lifecycle() {
    let client = Client::new();
    let product_id = seed_countable(&client, 8).await;

    // Create a pending sale
    let response = client
        .post(format!("{}/sales", BASE_URL))
        .header("x-actor", "api-tests")
        .json(&json!({
            "customer_name": "Smoke Tester",
            "items": [
                { "product_id": product_id, "quantity": 3, "unit_price": "25.00" }
            ]
        }))
        .send()
        .await
        .expect("Failed to create sale");
    assert_eq!(response.status(), 201);

    let body: Value = response.json().await.expect("Failed to parse response");
    let sale_id = body["id"].as_i64().expect("No sale ID");
    assert_eq!(body["status"], "Pending");

    // Complete: stock drops
    let response = client
        .put(format!("{}/sales/{}/status", BASE_URL, sale_id))
        .header("x-actor", "api-tests")
        .json(&json!({ "status": "Completed" }))
        .send()
        .await
        .expect("Failed to complete sale");
    assert!(response.status().is_success());

    let body: Value = client
        .get(format!("{}/stock/{}", BASE_URL, product_id))
        .send()
        .await
        .expect("Failed to get stock")
        .json()
        .await
        .expect("Failed to parse response");
    assert_eq!(body["quantity"], 5);

    // Deleting a completed sale is rejected
    let response = client
        .delete(format!("{}/sales/{}", BASE_URL, sale_id))
        .header("x-actor", "api-tests")
        .send()
        .await
        .expect("Failed to send delete");
    assert_eq!(response.status(), 422);

    // Cancel: stock restored
    let response = client
        .put(format!("{}/sales/{}/status", BASE_URL, sale_id))
        .header("x-actor", "api-tests")
        .json(&json!({ "status": "Cancelled" }))
        .send()
        .await
        .expect("Failed to cancel sale");
    assert!(response.status().is_success());

    let body: Value = client
        .get(format!("{}/stock/{}", BASE_URL, product_id))
        .send()
        .await
        .expect("Failed to get stock")
        .json()
        .await
        .expect("Failed to parse response");
    assert_eq!(body["quantity"], 8);
}

#[tokio::test]
#[ignore]
async fn test_rental_lifecycle() {
    let client = Client::new();

    // Unit-tracked product with a batch of 2 units
    let response = client
        .post(format!("{}/products", BASE_URL))
        .header("x-actor", "api-tests")
        .json(&json!({
            "name": "Smoke-test trailer",
            "sku": unique_sku("TRL"),
            "kind": "UnitTracked",
            "daily_rate": "100.00"
        }))
        .send()
        .await
        .expect("Failed to create product");
    assert_eq!(response.status(), 201);
    let body: Value = response.json().await.expect("Failed to parse response");
    let product_id = body["id"].as_i64().expect("No product ID");

    let response = client
        .post(format!("{}/assets/batch", BASE_URL))
        .header("x-actor", "api-tests")
        .json(&json!({
            "product_id": product_id,
            "asset_code": unique_sku("CODE"),
            "count": 2
        }))
        .send()
        .await
        .expect("Failed to create batch");
    assert_eq!(response.status(), 201);
    let units: Value = response.json().await.expect("Failed to parse response");
    let unit_ids: Vec<i64> = units
        .as_array()
        .expect("Units array")
        .iter()
        .map(|u| u["id"].as_i64().expect("Unit ID"))
        .collect();

    // Create a rental over both units
    let response = client
        .post(format!("{}/rentals", BASE_URL))
        .header("x-actor", "api-tests")
        .json(&json!({
            "customer_name": "Smoke Tester",
            "asset_unit_ids": unit_ids,
            "start_date": "2025-06-01T09:00:00Z",
            "end_date": "2025-06-06T09:00:00Z",
            "daily_rate": "200.00"
        }))
        .send()
        .await
        .expect("Failed to create rental");
    assert_eq!(response.status(), 201);
    let body: Value = response.json().await.expect("Failed to parse response");
    let rental_id = body["id"].as_i64().expect("No rental ID");
    assert_eq!(body["total_amount"], "1000.00");
    assert_eq!(body["assets"].as_array().map(|a| a.len()), Some(2));

    // The units are now held even though the rental is pending
    let response = client
        .post(format!("{}/rentals", BASE_URL))
        .header("x-actor", "api-tests")
        .json(&json!({
            "customer_name": "Second Customer",
            "asset_unit_ids": [unit_ids[0]],
            "start_date": "2025-06-01T09:00:00Z",
            "end_date": "2025-06-02T09:00:00Z",
            "daily_rate": "200.00"
        }))
        .send()
        .await
        .expect("Failed to send rental");
    assert_eq!(response.status(), 409);

    // Cancel releases the units
    let response = client
        .put(format!("{}/rentals/{}/status", BASE_URL, rental_id))
        .header("x-actor", "api-tests")
        .json(&json!({ "status": "Cancelled", "notes": "smoke test cleanup" }))
        .send()
        .await
        .expect("Failed to cancel rental");
    assert!(response.status().is_success());

    let response = client
        .get(format!(
            "{}/assets/available?product_id={}",
            BASE_URL, product_id
        ))
        .send()
        .await
        .expect("Failed to list available");
    let available: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(available.as_array().map(|a| a.len()), Some(2));
}

#[tokio::test]
#[ignore]
async fn test_activity_log() {
    let client = Client::new();
    seed_countable(&client, 5).await;

    let response = client
        .get(format!("{}/activity?actor=api-tests", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert!(body["items"].is_array());
    assert!(body["total"].as_i64().unwrap_or(0) >= 1);
}

#[tokio::test]
#[ignore]
async fn test_unknown_rental_returns_404() {
    let client = Client::new();

    let response = client
        .get(format!("{}/rentals/999999999", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 404);
}
