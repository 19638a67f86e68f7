//! End-to-end tests for Kilala Eye.
//!
//! The tests talk HTTP to a running storefront and admin, sharing one
//! migrated database. They are `#[ignore]`d so a plain `cargo test` stays
//! offline.
//!
//! # Running Tests
//!
//! ```bash
//! kl-cli migrate
//! kl-cli admin create -e e2e-admin@kilalaeye.vn -n "E2E" -p 'e2e-password'
//! cargo run -p kilala-storefront &
//! cargo run -p kilala-admin &
//!
//! ADMIN_TEST_EMAIL=e2e-admin@kilalaeye.vn ADMIN_TEST_PASSWORD=e2e-password \
//!     cargo test -p kilala-integration-tests -- --ignored
//! ```
//!
//! # Environment Variables
//!
//! - `STOREFRONT_BASE_URL` - default `http://localhost:3000`
//! - `ADMIN_BASE_URL` - default `http://localhost:3001`
//! - `ADMIN_TEST_EMAIL`, `ADMIN_TEST_PASSWORD` - an existing admin account
//!
//! Each test creates its own product and customer with a random suffix and
//! deletes the product afterwards.

use reqwest::{Client, StatusCode};
use serde_json::{Value, json};
use uuid::Uuid;

/// Price of products created by [`TestContext::create_product`], in dong.
pub const TEST_PRICE: i64 = 250_000;

/// Short random suffix for unique emails, SKUs and slugs.
#[must_use]
pub fn unique_suffix() -> String {
    Uuid::new_v4().simple().to_string()[..8].to_owned()
}

/// Numeric JSON field that may be serialized as a string (money) or number.
///
/// # Panics
///
/// Panics if the field is missing or not numeric.
#[must_use]
pub fn as_i64(value: &Value) -> i64 {
    match value {
        Value::Number(n) => n.as_i64().expect("integer"),
        Value::String(s) => s.parse().expect("numeric string"),
        other => panic!("expected a number, got {other}"),
    }
}

/// Server locations and admin credentials.
pub struct TestContext {
    pub storefront_url: String,
    pub admin_url: String,
    admin_email: String,
    admin_password: String,
}

impl TestContext {
    /// Read the environment.
    ///
    /// # Panics
    ///
    /// Panics if the admin credentials are not set.
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            storefront_url: std::env::var("STOREFRONT_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:3000".to_string()),
            admin_url: std::env::var("ADMIN_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:3001".to_string()),
            admin_email: std::env::var("ADMIN_TEST_EMAIL").expect("ADMIN_TEST_EMAIL not set"),
            admin_password: std::env::var("ADMIN_TEST_PASSWORD")
                .expect("ADMIN_TEST_PASSWORD not set"),
        }
    }

    /// Storefront API URL for `path` (which starts with `/`).
    #[must_use]
    pub fn shop(&self, path: &str) -> String {
        format!("{}/api{path}", self.storefront_url)
    }

    /// Admin API URL for `path`.
    #[must_use]
    pub fn admin(&self, path: &str) -> String {
        format!("{}{path}", self.admin_url)
    }

    /// A client that keeps its own session cookies.
    ///
    /// # Panics
    ///
    /// Panics if the client cannot be built.
    #[must_use]
    pub fn client() -> Client {
        Client::builder()
            .cookie_store(true)
            .build()
            .expect("Failed to create HTTP client")
    }

    /// Client signed in to the admin.
    ///
    /// # Panics
    ///
    /// Panics if login fails.
    pub async fn admin_client(&self) -> Client {
        let client = Self::client();
        let resp = client
            .post(self.admin("/auth/login"))
            .json(&json!({"email": self.admin_email, "password": self.admin_password}))
            .send()
            .await
            .expect("Failed to log in to admin");
        assert_eq!(resp.status(), StatusCode::OK, "admin login failed");
        client
    }

    /// Register a fresh customer; the returned client is signed in.
    ///
    /// # Panics
    ///
    /// Panics if registration fails.
    pub async fn register_customer(&self) -> (Client, String) {
        let client = Self::client();
        let email = format!("e2e-{}@kilalaeye.vn", unique_suffix());
        let resp = client
            .post(self.shop("/auth/register"))
            .json(&json!({
                "email": email,
                "password": "mat-khau-e2e",
                "name": "Khách E2E",
                "phone": "0901234567",
            }))
            .send()
            .await
            .expect("Failed to register");
        assert_eq!(resp.status(), StatusCode::CREATED, "registration failed");
        (client, email)
    }

    /// Create an active product through the admin API.
    ///
    /// # Panics
    ///
    /// Panics if the product cannot be created.
    pub async fn create_product(&self, admin: &Client, stock: i32) -> Value {
        let suffix = unique_suffix();
        let resp = admin
            .post(self.admin("/products"))
            .json(&json!({
                "name": format!("Lens E2E {suffix}"),
                "sku": format!("E2E-{suffix}"),
                "price": TEST_PRICE,
                "stock": stock,
                "attributes": [{"name": "Đường kính", "value": "14.2mm"}],
            }))
            .send()
            .await
            .expect("Failed to create product");
        assert_eq!(resp.status(), StatusCode::CREATED, "product creation failed");
        resp.json().await.expect("product JSON")
    }

    /// Current stock of a product, read through the admin API.
    ///
    /// # Panics
    ///
    /// Panics if the product cannot be read.
    pub async fn stock(&self, admin: &Client, product_id: i64) -> i64 {
        let product: Value = admin
            .get(self.admin(&format!("/products/{product_id}")))
            .send()
            .await
            .expect("Failed to get product")
            .json()
            .await
            .expect("product JSON");
        as_i64(&product["stock"])
    }

    /// Delete a product, ignoring failures.
    pub async fn delete_product(&self, admin: &Client, product_id: i64) {
        let _ = admin
            .delete(self.admin(&format!("/products/{product_id}")))
            .send()
            .await;
    }

    /// Move an order to `status` through the admin API.
    ///
    /// # Panics
    ///
    /// Panics if the request cannot be sent.
    pub async fn set_status(&self, admin: &Client, order_id: i64, status: &str) -> StatusCode {
        admin
            .patch(self.admin(&format!("/orders/{order_id}/status")))
            .json(&json!({"status": status}))
            .send()
            .await
            .expect("Failed to update order status")
            .status()
    }

    /// Put `quantity` of a product in the cart and check out.
    ///
    /// # Panics
    ///
    /// Panics if either request fails.
    pub async fn order(&self, client: &Client, product_id: i64, quantity: u32, email: &str) -> Value {
        let resp = client
            .post(self.shop("/cart/items"))
            .json(&json!({"product_id": product_id, "quantity": quantity}))
            .send()
            .await
            .expect("Failed to add to cart");
        assert_eq!(resp.status(), StatusCode::OK, "add to cart failed");

        let resp = client
            .post(self.shop("/checkout"))
            .json(&json!({
                "customer_name": "Khách E2E",
                "email": email,
                "phone": "0901234567",
                "shipping_address": "12 Nguyễn Huệ, Quận 1, TP.HCM",
                "payment_method": "cod",
            }))
            .send()
            .await
            .expect("Failed to check out");
        assert_eq!(resp.status(), StatusCode::CREATED, "checkout failed");
        resp.json().await.expect("order JSON")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unique_suffix() {
        let a = unique_suffix();
        assert_eq!(a.len(), 8);
        assert_ne!(a, unique_suffix());
    }

    #[test]
    fn test_as_i64_accepts_money_strings() {
        assert_eq!(as_i64(&json!("250000")), 250_000);
        assert_eq!(as_i64(&json!(3)), 3);
    }
}
