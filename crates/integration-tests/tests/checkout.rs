//! Cart and checkout flows.

use axum::http::{Method, StatusCode};
use serde_json::{Value, json};
use stepup_integration_tests::{TestApp, TestResponse};

const ADDRESS: &str = "Jl. Malioboro 12, Yogyakarta";
const PHONE: &str = "081234567890";

fn price(value: &Value) -> f64 {
    value
        .as_f64()
        .or_else(|| value.as_str().and_then(|s| s.parse().ok()))
        .unwrap_or(f64::NAN)
}

async fn add(app: &TestApp, token: &str, product_id: &str, quantity: i64) -> TestResponse {
    app.request(
        Method::POST,
        "/api/cart/add",
        Some(token),
        Some(json!({"product_id": product_id, "quantity": quantity})),
    )
    .await
}

// =============================================================================
// Cart
// =============================================================================

#[tokio::test]
async fn test_add_merges_lines_and_totals() {
    let app = TestApp::new();
    let admin = app.admin_token().await;
    let product = app.create_product(&admin, "Runner", "250", 10).await;
    let id = product["id"].as_str().unwrap_or_default();
    let token = app.customer_token("dewi@example.com", "Dewi").await;

    assert_eq!(add(&app, &token, id, 2).await.status, StatusCode::OK);
    let merged = add(&app, &token, id, 3).await;
    assert_eq!(merged.status, StatusCode::OK);
    assert_eq!(merged.data()["items"].as_array().map(Vec::len), Some(1));
    assert_eq!(merged.data()["items"][0]["quantity"], 5);

    let cart = app.get("/api/cart", Some(&token)).await;
    assert_eq!(cart.status, StatusCode::OK);
    assert_eq!(cart.data()["user_name"], "Dewi");
    assert!((price(&cart.data()["total_price"]) - 1250.0).abs() < f64::EPSILON);

    // Adding to the cart never touches stock.
    assert_eq!(app.stock_of(id).await, 10);
}

#[tokio::test]
async fn test_cart_rejects_bad_quantities() {
    let app = TestApp::new();
    let admin = app.admin_token().await;
    let product = app.create_product(&admin, "Runner", "250", 4).await;
    let id = product["id"].as_str().unwrap_or_default();
    let token = app.customer_token("dewi@example.com", "Dewi").await;

    assert_eq!(add(&app, &token, id, 0).await.status, StatusCode::BAD_REQUEST);
    assert_eq!(add(&app, &token, id, -2).await.status, StatusCode::BAD_REQUEST);

    let too_many = add(&app, &token, id, 5).await;
    assert_eq!(too_many.status, StatusCode::CONFLICT);
    assert!(too_many.error().contains("Runner"));

    let unknown = add(&app, &token, "7d4f1c2e-8a3b-4c5d-9e6f-0a1b2c3d4e5f", 1).await;
    assert_eq!(unknown.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_update_and_remove_lines() {
    let app = TestApp::new();
    let admin = app.admin_token().await;
    let first = app.create_product(&admin, "Runner", "250", 10).await;
    let second = app.create_product(&admin, "Walker", "100", 10).await;
    let first = first["id"].as_str().unwrap_or_default();
    let second = second["id"].as_str().unwrap_or_default();
    let token = app.customer_token("dewi@example.com", "Dewi").await;

    let no_cart = app
        .request(
            Method::PUT,
            "/api/cart",
            Some(&token),
            Some(json!({"product_id": first, "quantity": 1})),
        )
        .await;
    assert_eq!(no_cart.status, StatusCode::NOT_FOUND);

    add(&app, &token, first, 1).await;
    add(&app, &token, second, 1).await;

    let updated = app
        .request(
            Method::PUT,
            "/api/cart",
            Some(&token),
            Some(json!({"product_id": second, "quantity": 4})),
        )
        .await;
    assert_eq!(updated.status, StatusCode::OK);

    let removed = app
        .request(
            Method::DELETE,
            "/api/cart/remove-single",
            Some(&token),
            Some(json!({"product_id": first})),
        )
        .await;
    assert_eq!(removed.status, StatusCode::OK);
    assert_eq!(removed.data()["items"].as_array().map(Vec::len), Some(1));

    let emptied = app
        .request(
            Method::DELETE,
            "/api/cart/remove-single",
            Some(&token),
            Some(json!({"product_id": second})),
        )
        .await;
    assert_eq!(emptied.status, StatusCode::OK);
    assert!(emptied.data().is_null());

    assert_eq!(app.get("/api/cart", Some(&token)).await.status, StatusCode::NOT_FOUND);
}

// =============================================================================
// Checkout
// =============================================================================

/// Checking out takes stock and clears the cart.
#[tokio::test]
async fn test_checkout_decrements_stock() {
    let app = TestApp::new();
    let admin = app.admin_token().await;
    let product = app.create_product(&admin, "Runner", "250", 5).await;
    let id = product["id"].as_str().unwrap_or_default();
    let token = app.customer_token("dewi@example.com", "Dewi").await;

    let checkout = app.place_order(&token, id, 2).await;
    assert_eq!(checkout["status"], "Pending");
    assert_eq!(checkout["user_name"], "Dewi");
    assert!((price(&checkout["total_price"]) - 500.0).abs() < f64::EPSILON);

    assert_eq!(app.stock_of(id).await, 3);
    assert_eq!(app.get("/api/cart", Some(&token)).await.status, StatusCode::NOT_FOUND);

    let mine = app.get("/api/checkout", Some(&token)).await;
    assert_eq!(mine.data().as_array().map(Vec::len), Some(1));
}

/// A sale elsewhere between add-to-cart and checkout fails the whole order.
#[tokio::test]
async fn test_checkout_fails_when_stock_runs_out() {
    let app = TestApp::new();
    let admin = app.admin_token().await;
    let product = app.create_product(&admin, "Runner", "250", 2).await;
    let id = product["id"].as_str().unwrap_or_default();
    let slow = app.customer_token("slow@example.com", "Slow").await;
    let fast = app.customer_token("fast@example.com", "Fast").await;

    assert_eq!(add(&app, &slow, id, 2).await.status, StatusCode::OK);
    app.place_order(&fast, id, 1).await;

    let response = app
        .request(
            Method::POST,
            "/api/checkout",
            Some(&slow),
            Some(json!({"address": ADDRESS, "phone_number": PHONE})),
        )
        .await;
    assert_eq!(response.status, StatusCode::CONFLICT);
    assert!(response.error().contains("Runner"));
    assert_eq!(app.stock_of(id).await, 1);

    // The cart survives a failed checkout.
    assert_eq!(app.get("/api/cart", Some(&slow)).await.status, StatusCode::OK);
}

#[tokio::test]
async fn test_checkout_validates_contact_details() {
    let app = TestApp::new();
    let admin = app.admin_token().await;
    let product = app.create_product(&admin, "Runner", "250", 5).await;
    let id = product["id"].as_str().unwrap_or_default();
    let token = app.customer_token("dewi@example.com", "Dewi").await;

    let empty_cart = app
        .request(
            Method::POST,
            "/api/checkout",
            Some(&token),
            Some(json!({"address": ADDRESS, "phone_number": PHONE})),
        )
        .await;
    assert_eq!(empty_cart.status, StatusCode::NOT_FOUND);

    add(&app, &token, id, 1).await;
    for (address, phone) in [("Jl", PHONE), (ADDRESS, "12-34"), (ADDRESS, "0812")] {
        let response = app
            .request(
                Method::POST,
                "/api/checkout",
                Some(&token),
                Some(json!({"address": address, "phone_number": phone})),
            )
            .await;
        assert_eq!(response.status, StatusCode::BAD_REQUEST, "{address} {phone}");
    }
    assert_eq!(app.stock_of(id).await, 5);
}

#[tokio::test]
async fn test_checkout_ownership() {
    let app = TestApp::new();
    let admin = app.admin_token().await;
    let product = app.create_product(&admin, "Runner", "250", 5).await;
    let id = product["id"].as_str().unwrap_or_default();
    let owner = app.customer_token("dewi@example.com", "Dewi").await;
    let other = app.customer_token("budi@example.com", "Budi").await;

    let checkout = app.place_order(&owner, id, 1).await;
    let uri = format!("/api/checkout/{}", checkout["id"].as_str().unwrap_or_default());

    assert_eq!(app.get(&uri, Some(&owner)).await.status, StatusCode::OK);
    assert_eq!(app.get(&uri, Some(&admin)).await.status, StatusCode::OK);
    assert_eq!(app.get(&uri, Some(&other)).await.status, StatusCode::FORBIDDEN);

    let all = app.get("/api/checkouts", Some(&admin)).await;
    assert_eq!(all.data().as_array().map(Vec::len), Some(1));
    let others = app.get("/api/checkout", Some(&other)).await;
    assert_eq!(others.data().as_array().map(Vec::len), Some(0));
}

/// Pending moves to Completed or Cancelled once, and never back.
#[tokio::test]
async fn test_checkout_status_transitions() {
    let app = TestApp::new();
    let admin = app.admin_token().await;
    let product = app.create_product(&admin, "Runner", "250", 5).await;
    let id = product["id"].as_str().unwrap_or_default();
    let token = app.customer_token("dewi@example.com", "Dewi").await;
    let checkout = app.place_order(&token, id, 1).await;
    let uri = format!("/api/checkout/{}", checkout["id"].as_str().unwrap_or_default());

    let by_customer = app
        .request(Method::PUT, &uri, Some(&token), Some(json!({"status": "Completed"})))
        .await;
    assert_eq!(by_customer.status, StatusCode::FORBIDDEN);

    let unknown = app
        .request(Method::PUT, &uri, Some(&admin), Some(json!({"status": "Shipped"})))
        .await;
    assert_eq!(unknown.status, StatusCode::BAD_REQUEST);

    let completed = app
        .request(Method::PUT, &uri, Some(&admin), Some(json!({"status": "Completed"})))
        .await;
    assert_eq!(completed.status, StatusCode::OK);
    assert_eq!(completed.data()["status"], "Completed");

    let back = app
        .request(Method::PUT, &uri, Some(&admin), Some(json!({"status": "Pending"})))
        .await;
    assert_eq!(back.status, StatusCode::CONFLICT);
    assert_eq!(back.error(), "cannot change status from Completed to Pending");

    let deleted = app.request(Method::DELETE, &uri, Some(&admin), None).await;
    assert_eq!(deleted.status, StatusCode::OK);
    assert_eq!(app.get(&uri, Some(&admin)).await.status, StatusCode::NOT_FOUND);
}
