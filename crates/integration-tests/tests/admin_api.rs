//! Admin API access control and catalog management.
//!
//! Requires the admin server and an admin account; see the crate docs.
//!
//! Run with: cargo test -p kilala-integration-tests -- --ignored

use kilala_integration_tests::{TestContext, as_i64, unique_suffix};
use reqwest::StatusCode;
use serde_json::{Value, json};

#[tokio::test]
#[ignore = "Requires running admin server"]
async fn test_routes_require_admin_session() {
    let ctx = TestContext::from_env();
    let anonymous = TestContext::client();

    for path in ["/dashboard", "/orders", "/users", "/products"] {
        let resp = anonymous
            .get(ctx.admin(path))
            .send()
            .await
            .expect("request");
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED, "{path}");
    }

    // A customer account cannot sign in to the admin
    let (_, email) = ctx.register_customer().await;
    let resp = anonymous
        .post(ctx.admin("/auth/login"))
        .json(&json!({"email": email, "password": "mat-khau-e2e"}))
        .send()
        .await
        .expect("login");
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[ignore = "Requires running admin server"]
async fn test_admin_cannot_demote_self() {
    let ctx = TestContext::from_env();
    let admin = ctx.admin_client().await;

    let me: Value = admin
        .get(ctx.admin("/auth/me"))
        .send()
        .await
        .expect("me")
        .json()
        .await
        .expect("me JSON");
    let my_id = as_i64(&me["id"]);

    let resp = admin
        .patch(ctx.admin(&format!("/users/{my_id}")))
        .json(&json!({"role": "customer"}))
        .send()
        .await
        .expect("update");
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let resp = admin
        .delete(ctx.admin(&format!("/users/{my_id}")))
        .send()
        .await
        .expect("delete");
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
#[ignore = "Requires running admin server"]
async fn test_category_crud_and_product_counts() {
    let ctx = TestContext::from_env();
    let admin = ctx.admin_client().await;
    let suffix = unique_suffix();

    let resp = admin
        .post(ctx.admin("/categories"))
        .json(&json!({"name": format!("Lens cận {suffix}"), "position": 9}))
        .send()
        .await
        .expect("create category");
    assert_eq!(resp.status(), StatusCode::CREATED);
    let category: Value = resp.json().await.expect("category JSON");
    let category_id = as_i64(&category["id"]);
    assert_eq!(category["slug"], format!("lens-can-{suffix}"));

    // Same slug again
    let resp = admin
        .post(ctx.admin("/categories"))
        .json(&json!({"name": format!("Lens Cận {suffix}")}))
        .send()
        .await
        .expect("create category");
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    let resp = admin
        .post(ctx.admin("/products"))
        .json(&json!({
            "name": format!("Lens trong danh mục {suffix}"),
            "price": 150_000,
            "stock": 3,
            "category_id": category_id,
        }))
        .send()
        .await
        .expect("create product");
    assert_eq!(resp.status(), StatusCode::CREATED);
    let product: Value = resp.json().await.expect("product JSON");
    let product_id = as_i64(&product["id"]);

    let categories: Value = admin
        .get(ctx.admin("/categories"))
        .send()
        .await
        .expect("categories")
        .json()
        .await
        .expect("categories JSON");
    let row = categories
        .as_array()
        .expect("list")
        .iter()
        .find(|c| as_i64(&c["id"]) == category_id)
        .expect("category listed");
    assert_eq!(row["product_count"], 1);

    // Deleting the category keeps the product, uncategorized
    let resp = admin
        .delete(ctx.admin(&format!("/categories/{category_id}")))
        .send()
        .await
        .expect("delete category");
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let product: Value = admin
        .get(ctx.admin(&format!("/products/{product_id}")))
        .send()
        .await
        .expect("product")
        .json()
        .await
        .expect("product JSON");
    assert!(product["category_id"].is_null());

    ctx.delete_product(&admin, product_id).await;
}

#[tokio::test]
#[ignore = "Requires running admin server"]
async fn test_invalid_product_is_rejected() {
    let ctx = TestContext::from_env();
    let admin = ctx.admin_client().await;

    let resp = admin
        .post(ctx.admin("/products"))
        .json(&json!({
            "name": "Lens giá sai",
            "price": 100_000,
            "sale_price": 120_000,
        }))
        .send()
        .await
        .expect("create product");
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = resp.json().await.expect("error JSON");
    assert!(body["error"].as_str().expect("message").contains("Giá khuyến mãi"));
}
