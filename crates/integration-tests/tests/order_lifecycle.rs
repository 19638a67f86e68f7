//! Orders from cart to review, across storefront and admin.
//!
//! These tests require:
//! - A migrated `PostgreSQL` database (kl-cli migrate)
//! - The storefront and admin servers running against it
//! - `ADMIN_TEST_EMAIL` / `ADMIN_TEST_PASSWORD` for an existing admin
//!
//! Run with: cargo test -p kilala-integration-tests -- --ignored

use kilala_integration_tests::{TEST_PRICE, TestContext, as_i64};
use reqwest::StatusCode;
use serde_json::{Value, json};

// ============================================================================
// Customer flow
// ============================================================================

#[tokio::test]
#[ignore = "Requires running storefront and admin servers"]
async fn test_customer_order_unlocks_review() {
    let ctx = TestContext::from_env();
    let admin = ctx.admin_client().await;
    let product = ctx.create_product(&admin, 5).await;
    let product_id = as_i64(&product["id"]);
    let slug = product["slug"].as_str().expect("slug").to_owned();

    let (customer, email) = ctx.register_customer().await;

    // Not purchased yet
    let eligibility: Value = customer
        .get(ctx.shop(&format!("/products/{slug}/review-eligibility")))
        .send()
        .await
        .expect("eligibility")
        .json()
        .await
        .expect("eligibility JSON");
    assert_eq!(eligibility["eligible"], false);
    assert_eq!(eligibility["reason"], "not_purchased");

    let order = ctx.order(&customer, product_id, 2, &email).await;
    let order_id = as_i64(&order["id"]);
    assert_eq!(order["status"], "pending");
    assert_eq!(as_i64(&order["subtotal"]), 2 * TEST_PRICE);
    assert_eq!(
        as_i64(&order["total"]),
        as_i64(&order["subtotal"]) + as_i64(&order["shipping_fee"])
    );
    assert_eq!(ctx.stock(&admin, product_id).await, 3);

    // Checkout empties the cart
    let cart: Value = customer
        .get(ctx.shop("/cart"))
        .send()
        .await
        .expect("cart")
        .json()
        .await
        .expect("cart JSON");
    assert_eq!(cart["item_count"], 0);

    // The order shows up in the account
    let orders: Value = customer
        .get(ctx.shop("/account/orders"))
        .send()
        .await
        .expect("account orders")
        .json()
        .await
        .expect("orders JSON");
    assert!(
        orders["items"]
            .as_array()
            .expect("items")
            .iter()
            .any(|o| as_i64(&o["id"]) == order_id)
    );

    // A pending order does not allow reviews yet
    let resp = customer
        .post(ctx.shop(&format!("/products/{slug}/reviews")))
        .json(&json!({"rating": 5, "comment": "Đeo rất êm"}))
        .send()
        .await
        .expect("review");
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    for status in ["confirmed", "shipping", "delivered"] {
        assert_eq!(ctx.set_status(&admin, order_id, status).await, StatusCode::OK);
    }

    let resp = customer
        .post(ctx.shop(&format!("/products/{slug}/reviews")))
        .json(&json!({"rating": 5, "comment": "Đeo rất êm"}))
        .send()
        .await
        .expect("review");
    assert_eq!(resp.status(), StatusCode::CREATED);

    // One review per product
    let resp = customer
        .post(ctx.shop(&format!("/products/{slug}/reviews")))
        .json(&json!({"rating": 4}))
        .send()
        .await
        .expect("review");
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let reviews: Value = TestContext::client()
        .get(ctx.shop(&format!("/products/{slug}/reviews")))
        .send()
        .await
        .expect("reviews")
        .json()
        .await
        .expect("reviews JSON");
    assert_eq!(reviews["total"], 1);

    ctx.delete_product(&admin, product_id).await;
}

#[tokio::test]
#[ignore = "Requires running storefront and admin servers"]
async fn test_customer_cancel_restores_stock() {
    let ctx = TestContext::from_env();
    let admin = ctx.admin_client().await;
    let product = ctx.create_product(&admin, 4).await;
    let product_id = as_i64(&product["id"]);

    let (customer, email) = ctx.register_customer().await;
    let order = ctx.order(&customer, product_id, 3, &email).await;
    let order_id = as_i64(&order["id"]);
    assert_eq!(ctx.stock(&admin, product_id).await, 1);

    let resp = customer
        .post(ctx.shop(&format!("/account/orders/{order_id}/cancel")))
        .send()
        .await
        .expect("cancel");
    assert_eq!(resp.status(), StatusCode::OK);
    let cancelled: Value = resp.json().await.expect("order JSON");
    assert_eq!(cancelled["status"], "cancelled");
    assert_eq!(ctx.stock(&admin, product_id).await, 4);

    // Cancelled is terminal
    assert_eq!(
        ctx.set_status(&admin, order_id, "confirmed").await,
        StatusCode::CONFLICT
    );

    ctx.delete_product(&admin, product_id).await;
}

#[tokio::test]
#[ignore = "Requires running storefront and admin servers"]
async fn test_deleted_account_checks_out_as_guest() {
    let ctx = TestContext::from_env();
    let admin = ctx.admin_client().await;
    let product = ctx.create_product(&admin, 3).await;
    let product_id = as_i64(&product["id"]);
    let slug = product["slug"].as_str().expect("slug").to_owned();

    let (customer, email) = ctx.register_customer().await;
    let me: Value = customer
        .get(ctx.shop("/auth/me"))
        .send()
        .await
        .expect("me")
        .json()
        .await
        .expect("me JSON");
    let user_id = as_i64(&me["id"]);

    let resp = admin
        .delete(ctx.admin(&format!("/users/{user_id}")))
        .send()
        .await
        .expect("delete user");
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    // The stale session no longer counts as logged in
    let resp = customer
        .post(ctx.shop(&format!("/products/{slug}/reviews")))
        .json(&json!({"rating": 5}))
        .send()
        .await
        .expect("review");
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let order = ctx.order(&customer, product_id, 1, &email).await;
    assert!(order["user_id"].is_null());
    assert_eq!(ctx.stock(&admin, product_id).await, 2);

    let resp = customer
        .get(ctx.shop("/auth/me"))
        .send()
        .await
        .expect("me");
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    ctx.delete_product(&admin, product_id).await;
}

// ============================================================================
// Guest checkout
// ============================================================================

#[tokio::test]
#[ignore = "Requires running storefront and admin servers"]
async fn test_guest_checkout_and_lookup() {
    let ctx = TestContext::from_env();
    let admin = ctx.admin_client().await;
    let product = ctx.create_product(&admin, 2).await;
    let product_id = as_i64(&product["id"]);

    let guest = TestContext::client();
    let order = ctx
        .order(&guest, product_id, 1, "khach-vang-lai@kilalaeye.vn")
        .await;
    let code = order["code"].as_str().expect("code").to_owned();
    assert!(order["user_id"].is_null());

    let resp = guest
        .get(ctx.shop(&format!("/orders/{code}")))
        .query(&[("email", "KHACH-VANG-LAI@kilalaeye.vn")])
        .send()
        .await
        .expect("lookup");
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = guest
        .get(ctx.shop(&format!("/orders/{code}")))
        .query(&[("email", "nguoi-khac@kilalaeye.vn")])
        .send()
        .await
        .expect("lookup");
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    // Skipping a step is rejected
    let order_id = as_i64(&order["id"]);
    assert_eq!(
        ctx.set_status(&admin, order_id, "delivered").await,
        StatusCode::CONFLICT
    );

    ctx.delete_product(&admin, product_id).await;
}

#[tokio::test]
#[ignore = "Requires running storefront and admin servers"]
async fn test_checkout_over_stock_is_rejected() {
    let ctx = TestContext::from_env();
    let admin = ctx.admin_client().await;
    let product = ctx.create_product(&admin, 1).await;
    let product_id = as_i64(&product["id"]);

    let guest = TestContext::client();
    let resp = guest
        .post(ctx.shop("/cart/items"))
        .json(&json!({"product_id": product_id, "quantity": 1}))
        .send()
        .await
        .expect("add to cart");
    assert_eq!(resp.status(), StatusCode::OK);

    // Someone else buys the last unit first
    let other = TestContext::client();
    ctx.order(&other, product_id, 1, "nhanh-tay@kilalaeye.vn")
        .await;

    let resp = guest
        .post(ctx.shop("/checkout"))
        .json(&json!({
            "customer_name": "Chậm chân",
            "email": "cham-chan@kilalaeye.vn",
            "phone": "0901234567",
            "shipping_address": "1 Lê Lợi, Quận 1, TP.HCM",
        }))
        .send()
        .await
        .expect("checkout");
    assert!(resp.status().is_client_error(), "{}", resp.status());
    assert_eq!(ctx.stock(&admin, product_id).await, 0);

    ctx.delete_product(&admin, product_id).await;
}
