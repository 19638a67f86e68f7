//! HTTP route handlers for the storefront JSON API.
//!
//! # Route Structure
//!
//! ```text
//! # Catalog
//! GET    /api/home                              - Featured, newest, collections, posts
//! GET    /api/products                          - Filtered product listing
//! GET    /api/products/{slug}                   - Product detail
//! GET    /api/products/{slug}/reviews           - Approved reviews
//! POST   /api/products/{slug}/reviews           - Post a review (auth)
//! GET    /api/products/{slug}/review-eligibility
//! GET    /api/categories, /api/categories/{slug}
//! GET    /api/collections, /api/collections/{slug}
//! GET    /api/tags
//! GET    /api/search?q=
//!
//! # Cart (session)
//! GET    /api/cart
//! DELETE /api/cart
//! POST   /api/cart/items
//! PATCH  /api/cart/items/{product_id}
//! DELETE /api/cart/items/{product_id}
//! POST   /api/cart/validate
//!
//! # Checkout and orders (rate limited)
//! POST   /api/checkout
//! GET    /api/orders/{code}?email=              - Guest order lookup
//!
//! # Auth (rate limited)
//! POST   /api/auth/register
//! POST   /api/auth/login
//! POST   /api/auth/logout
//! GET    /api/auth/me
//!
//! # Account (auth)
//! PATCH  /api/account/profile
//! POST   /api/account/password                 - Rate limited
//! GET    /api/account/orders
//! GET    /api/account/orders/{id}
//! POST   /api/account/orders/{id}/cancel
//!
//! # Blog
//! GET    /api/posts
//! GET    /api/posts/{slug}
//! ```

pub mod account;
pub mod auth;
pub mod blog;
pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod products;
pub mod search;

use axum::{
    Router,
    routing::{get, patch, post},
};

use crate::middleware::{auth_rate_limiter, checkout_rate_limiter};
use crate::state::AppState;

/// Create the catalog routes router.
pub fn catalog_routes() -> Router<AppState> {
    Router::new()
        .route("/home", get(catalog::home))
        .route("/products", get(products::index))
        .route("/products/{slug}", get(products::show))
        .route(
            "/products/{slug}/reviews",
            get(products::reviews).post(products::create_review),
        )
        .route(
            "/products/{slug}/review-eligibility",
            get(products::review_eligibility),
        )
        .route("/categories", get(catalog::categories))
        .route("/categories/{slug}", get(catalog::category))
        .route("/collections", get(catalog::collections))
        .route("/collections/{slug}", get(catalog::collection))
        .route("/tags", get(catalog::tags))
        .route("/search", get(search::search))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show).delete(cart::clear))
        .route("/items", post(cart::add_item))
        .route(
            "/items/{product_id}",
            patch(cart::set_quantity).delete(cart::remove_item),
        )
        .route("/validate", post(cart::validate))
}

/// Create the checkout routes router.
pub fn checkout_routes() -> Router<AppState> {
    Router::new()
        .route("/checkout", post(checkout::checkout))
        .route("/orders/{code}", get(checkout::lookup))
        .layer(checkout_rate_limiter())
}

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    let limited = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .layer(auth_rate_limiter());

    Router::new()
        .route("/logout", post(auth::logout))
        .route("/me", get(auth::me))
        .merge(limited)
}

/// Create the account routes router.
pub fn account_routes() -> Router<AppState> {
    let limited = Router::new()
        .route("/password", post(account::change_password))
        .layer(auth_rate_limiter());

    Router::new()
        .route("/profile", patch(account::update_profile))
        .route("/orders", get(account::orders))
        .route("/orders/{id}", get(account::order))
        .route("/orders/{id}/cancel", post(account::cancel_order))
        .merge(limited)
}

/// Create the blog routes router.
pub fn blog_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(blog::index))
        .route("/{slug}", get(blog::show))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    let api = Router::new()
        .merge(catalog_routes())
        .merge(checkout_routes())
        .nest("/cart", cart_routes())
        .nest("/auth", auth_routes())
        .nest("/account", account_routes())
        .nest("/posts", blog_routes());

    Router::new().nest("/api", api)
}
