//! HTTP tests against a running admin server.
//!
//! These tests require:
//! - A running `PostgreSQL` database with migrations applied (`em-cli migrate`)
//! - The admin server running (`cargo run -p emporium-admin`)
//! - A test admin created with `em-cli admin create` whose credentials are in
//!   `ADMIN_TEST_EMAIL` and `ADMIN_TEST_PASSWORD`
//!
//! Run with: `cargo test -p emporium-integration-tests -- --ignored`

#![allow(clippy::unwrap_used)]

use emporium_integration_tests::{admin_base_url, client, login, test_credentials};
use reqwest::{Client, StatusCode, header};
use serde_json::{Value, json};

async fn logged_in_client() -> Client {
    let client = client().expect("Failed to create HTTP client");
    let (email, password) =
        test_credentials().expect("ADMIN_TEST_EMAIL and ADMIN_TEST_PASSWORD must be set");
    let status = login(&client, &email, &password)
        .await
        .expect("Failed to send login request");
    assert_eq!(status, StatusCode::OK, "test admin login failed");
    client
}

/// A name no earlier run has used.
fn unique(prefix: &str) -> String {
    format!("{prefix}-{}", chrono::Utc::now().timestamp_micros())
}

/// Detail of the first order that has at least one line, if any.
async fn order_with_items(client: &Client) -> Option<Value> {
    let base_url = admin_base_url();
    let orders: Value = client
        .get(format!("{base_url}/api/orders?per_page=50"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    for order in orders["items"].as_array().unwrap() {
        let detail: Value = client
            .get(format!("{base_url}/api/orders/{}", order["id"]))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        if detail["items"].as_array().is_some_and(|items| !items.is_empty()) {
            return Some(detail);
        }
    }
    None
}

/// Decimals are serialized as strings.
fn decimal_field(value: &Value) -> f64 {
    value.as_str().unwrap().parse().unwrap()
}

// ============================================================================
// Health & Auth
// ============================================================================

#[tokio::test]
#[ignore = "Requires running admin server"]
async fn test_health_endpoints() {
    let client = client().unwrap();
    let base_url = admin_base_url();

    let resp = client.get(format!("{base_url}/health")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = client
        .get(format!("{base_url}/health/ready"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
#[ignore = "Requires running admin server"]
async fn test_api_requires_session() {
    let client = client().unwrap();
    let base_url = admin_base_url();

    for path in ["/auth/me", "/api/dashboard", "/api/products", "/api/data-manager/tables"] {
        let resp = client.get(format!("{base_url}{path}")).send().await.unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED, "{path}");
    }
}

#[tokio::test]
#[ignore = "Requires running admin server"]
async fn test_login_rejects_bad_password() {
    let client = client().unwrap();
    let status = login(&client, "nobody@example.com", "not-the-password")
        .await
        .unwrap();
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[ignore = "Requires running admin server and test admin credentials"]
async fn test_login_me_logout() {
    let client = logged_in_client().await;
    let base_url = admin_base_url();

    let me: Value = client
        .get(format!("{base_url}/auth/me"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(me["email"].is_string());

    let resp = client
        .post(format!("{base_url}/auth/logout"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let resp = client
        .get(format!("{base_url}/auth/me"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

// ============================================================================
// Dashboard & Catalog
// ============================================================================

#[tokio::test]
#[ignore = "Requires running admin server and test admin credentials"]
async fn test_dashboard_counts() {
    let client = logged_in_client().await;

    let body: Value = client
        .get(format!("{}/api/dashboard", admin_base_url()))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert!(body["counts"].is_object());
    assert!(body["abandoned_cart_hours"].is_number());
    assert!(body["blob_storage"].is_boolean());
}

#[tokio::test]
#[ignore = "Requires running admin server and test admin credentials"]
async fn test_product_list_pagination() {
    let client = logged_in_client().await;

    let body: Value = client
        .get(format!("{}/api/products?page=1&per_page=5", admin_base_url()))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(body["page"], 1);
    assert_eq!(body["per_page"], 5);
    assert!(body["items"].as_array().unwrap().len() <= 5);
}

#[tokio::test]
#[ignore = "Requires running admin server and test admin credentials"]
async fn test_coupon_validate_unknown_code() {
    let client = logged_in_client().await;

    let resp = client
        .post(format!("{}/api/coupons/validate", admin_base_url()))
        .json(&json!({ "code": "no-such-coupon-code", "order_total": "50.00" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["valid"], false);
    assert_eq!(body["reason"], "Coupon not found");
}

// ============================================================================
// Conflicts & Refunds
// ============================================================================

#[tokio::test]
#[ignore = "Requires running admin server and test admin credentials"]
async fn test_duplicate_brand_handle_conflicts() {
    let client = logged_in_client().await;
    let base_url = admin_base_url();
    let name = unique("dup-brand");
    let body = json!({ "name": name, "url_handle": name });

    let resp = client
        .post(format!("{base_url}/api/brands"))
        .json(&body)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let brand: Value = resp.json().await.unwrap();

    let resp = client
        .post(format!("{base_url}/api/brands"))
        .json(&body)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CONFLICT);
    let error: Value = resp.json().await.unwrap();
    assert_eq!(
        error["error"],
        format!("A brand with URL handle '{name}' already exists")
    );

    let listed: Value = client
        .get(format!("{base_url}/api/brands?search={name}"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(listed["total"], 1);

    let resp = client
        .delete(format!("{base_url}/api/brands/{}", brand["id"]))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
}

#[tokio::test]
#[ignore = "Requires running admin server, test admin credentials and an order with items"]
async fn test_delete_ordered_product_conflicts() {
    let client = logged_in_client().await;
    let base_url = admin_base_url();
    let Some(order) = order_with_items(&client).await else {
        eprintln!("no order with items; skipping");
        return;
    };
    let product_id = &order["items"][0]["product_id"];

    let resp = client
        .delete(format!("{base_url}/api/products/{product_id}"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CONFLICT);
    let error: Value = resp.json().await.unwrap();
    let message = error["error"].as_str().unwrap();
    assert!(message.starts_with("Cannot delete product: it is referenced by "), "{message}");
    assert!(message.ends_with("order(s)"), "{message}");

    let resp = client
        .get(format!("{base_url}/api/products/{product_id}"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
#[ignore = "Requires running admin server, test admin credentials and an order with items"]
async fn test_refund_over_balance_rejected() {
    let client = logged_in_client().await;
    let Some(order) = order_with_items(&client).await else {
        eprintln!("no order with items; skipping");
        return;
    };
    let too_much = decimal_field(&order["refundable"]) + 1.0;

    let resp = client
        .post(format!("{}/api/refunds", admin_base_url()))
        .json(&json!({
            "order_id": order["id"],
            "amount": format!("{too_much:.2}"),
            "reason": "integration test",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let error: Value = resp.json().await.unwrap();
    assert!(error["error"].as_str().unwrap().contains("exceeds the refundable balance"));
}

#[tokio::test]
#[ignore = "Requires running admin server, test admin credentials and a refundable order"]
async fn test_refund_transitions_enforced() {
    let client = logged_in_client().await;
    let base_url = admin_base_url();
    let Some(order) = order_with_items(&client).await else {
        eprintln!("no order with items; skipping");
        return;
    };
    if decimal_field(&order["refundable"]) < 0.01 {
        eprintln!("order {} is fully refunded; skipping", order["id"]);
        return;
    }

    let resp = client
        .post(format!("{base_url}/api/refunds"))
        .json(&json!({ "order_id": order["id"], "amount": "0.01", "reason": "integration test" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let refund: Value = resp.json().await.unwrap();
    assert_eq!(refund["status"], "pending");
    let id = &refund["id"];

    // Pending refunds must be approved before processing.
    let resp = client
        .post(format!("{base_url}/api/refunds/{id}/process"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    let resp = client
        .post(format!("{base_url}/api/refunds/{id}/reject"))
        .json(&json!({ "note": "integration test cleanup" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let rejected: Value = resp.json().await.unwrap();
    assert_eq!(rejected["status"], "rejected");

    let resp = client
        .post(format!("{base_url}/api/refunds/{id}/approve"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CONFLICT);
}

// ============================================================================
// Data Manager & Media
// ============================================================================

#[tokio::test]
#[ignore = "Requires running admin server and test admin credentials"]
async fn test_export_is_attachment() {
    let client = logged_in_client().await;

    let resp = client
        .get(format!(
            "{}/api/data-manager/export/brand?format=csv",
            admin_base_url()
        ))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let disposition = resp.headers()[header::CONTENT_DISPOSITION].to_str().unwrap();
    assert!(disposition.starts_with("attachment; filename=\"brand-"));
    assert!(disposition.ends_with(".csv\""));
}

#[tokio::test]
#[ignore = "Requires running admin server and test admin credentials"]
async fn test_export_rejects_unknown_table() {
    let client = logged_in_client().await;

    let resp = client
        .get(format!(
            "{}/api/data-manager/export?tables=brand,admin_user",
            admin_base_url()
        ))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
#[ignore = "Requires running admin server without blob storage configured"]
async fn test_media_sync_without_blob_storage() {
    let client = logged_in_client().await;

    let resp = client
        .post(format!("{}/api/media/sync", admin_base_url()))
        .json(&json!({ "direction": "both" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}
