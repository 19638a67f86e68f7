//! HTTP route handlers for the admin JSON API.
//!
//! # Route Structure
//!
//! ```text
//! # Public
//! GET    /health, /health/ready
//! POST   /auth/login                            - Rate limited
//!
//! # Everything below requires an admin session
//! POST   /auth/logout
//! GET    /auth/me
//! GET    /dashboard
//!
//! # Catalog
//! GET    /products                              - ?q&category_id&collection_id&is_active&page
//! POST   /products
//! GET    /products/{id}
//! PUT    /products/{id}
//! DELETE /products/{id}
//! POST   /products/{id}/images                  - Multipart, `file` parts
//! PATCH  /products/{id}/images/order
//! DELETE /products/{id}/images/{image_id}
//! GET    /categories, /collections, /tags       - With product counts
//! POST   /categories, /collections, /tags
//! GET    /{categories,collections,tags}/{id}
//! PUT    /{categories,collections,tags}/{id}
//! DELETE /{categories,collections,tags}/{id}
//!
//! # Orders
//! GET    /orders                                - ?status&q&page
//! GET    /orders/{id}
//! PATCH  /orders/{id}/status
//!
//! # Users
//! GET    /users                                 - ?q&role&page
//! GET    /users/{id}
//! PATCH  /users/{id}
//! DELETE /users/{id}
//!
//! # Content
//! GET    /posts, POST /posts
//! GET    /posts/{id}, PUT /posts/{id}, DELETE /posts/{id}
//! GET    /reviews                               - ?product_id&is_approved&page
//! PATCH  /reviews/{id}
//! DELETE /reviews/{id}
//!
//! # Misc
//! POST   /uploads                               - Multipart, one `file` part
//! GET    /search?q=
//! ```

pub mod auth;
pub mod dashboard;
pub mod orders;
pub mod posts;
pub mod products;
pub mod reviews;
pub mod search;
pub mod taxonomy;
pub mod uploads;
pub mod users;

use axum::{Router, middleware::from_fn_with_state};

use crate::middleware::require_admin;
use crate::state::AppState;

/// Create all API routes. Everything but login sits behind
/// [`require_admin`].
pub fn routes(state: &AppState) -> Router<AppState> {
    let max_upload_bytes = state.uploads().max_bytes();

    let protected = Router::new()
        .merge(auth::router())
        .merge(dashboard::router())
        .merge(products::router(max_upload_bytes))
        .merge(taxonomy::router())
        .merge(orders::router())
        .merge(users::router())
        .merge(posts::router())
        .merge(reviews::router())
        .merge(uploads::router(max_upload_bytes))
        .merge(search::router())
        .route_layer(from_fn_with_state(state.clone(), require_admin));

    Router::new().merge(auth::public_router()).merge(protected)
}
