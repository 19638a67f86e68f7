//! Session cart endpoints.
//!
//! The session stores only product ids and quantities. Every response
//! re-prices the cart against live product rows.

use axum::{
    Json,
    extract::{Path, State},
};
use kilala_core::ProductId;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::db::ProductRepository;
use crate::error::{AppError, Result};
use crate::models::session_keys;
use crate::services::cart::{self, Cart, CartLine, CartSummary, stock_issue};
use crate::state::AppState;

/// Add-to-cart request.
#[derive(Debug, Deserialize)]
pub struct AddItemRequest {
    pub product_id: ProductId,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
}

const fn default_quantity() -> u32 {
    1
}

/// Quantity update request.
#[derive(Debug, Deserialize)]
pub struct SetQuantityRequest {
    pub quantity: u32,
}

/// Client-side cart to validate.
#[derive(Debug, Deserialize)]
pub struct ValidateCartRequest {
    pub lines: Vec<CartLine>,
}

/// Read the cart from the session.
pub(crate) async fn load_cart(session: &Session) -> Result<Cart> {
    Ok(session
        .get::<Cart>(session_keys::CART)
        .await?
        .unwrap_or_default())
}

/// Write the cart back to the session.
pub(crate) async fn save_cart(session: &Session, cart: &Cart) -> Result<()> {
    session.insert(session_keys::CART, cart).await?;
    Ok(())
}

/// Price a cart against live product data.
pub(crate) async fn summarize(state: &AppState, cart: &Cart) -> Result<CartSummary> {
    let products = ProductRepository::new(state.pool())
        .cart_products(&cart.product_ids())
        .await?;
    Ok(cart::evaluate(cart, &products, state.shipping()))
}

/// Check that `quantity` units of a product can be put in the cart.
async fn ensure_available(state: &AppState, product_id: ProductId, quantity: u32) -> Result<()> {
    let product = ProductRepository::new(state.pool())
        .cart_product(product_id)
        .await?
        .filter(|p| p.is_active)
        .ok_or_else(|| {
            AppError::BadRequest("Sản phẩm không tồn tại hoặc đã ngừng kinh doanh".to_string())
        })?;

    match stock_issue(product.stock, quantity) {
        Some(issue) => Err(AppError::BadRequest(issue.message())),
        None => Ok(()),
    }
}

/// Current cart with live prices and stock issues.
#[instrument(skip(state, session))]
pub async fn show(State(state): State<AppState>, session: Session) -> Result<Json<CartSummary>> {
    let cart = load_cart(&session).await?;
    Ok(Json(summarize(&state, &cart).await?))
}

/// Add units of a product, merging with an existing line.
#[instrument(skip(state, session))]
pub async fn add_item(
    State(state): State<AppState>,
    session: Session,
    Json(req): Json<AddItemRequest>,
) -> Result<Json<CartSummary>> {
    if req.quantity == 0 {
        return Err(AppError::BadRequest("Số lượng không hợp lệ".to_string()));
    }

    let mut cart = load_cart(&session).await?;
    let quantity = cart.quantity_after_add(req.product_id, req.quantity);
    ensure_available(&state, req.product_id, quantity).await?;

    cart.set_quantity(req.product_id, quantity);
    save_cart(&session, &cart).await?;

    Ok(Json(summarize(&state, &cart).await?))
}

/// Set a line's quantity; zero removes it.
#[instrument(skip(state, session))]
pub async fn set_quantity(
    State(state): State<AppState>,
    session: Session,
    Path(product_id): Path<ProductId>,
    Json(req): Json<SetQuantityRequest>,
) -> Result<Json<CartSummary>> {
    let mut cart = load_cart(&session).await?;
    if cart.quantity_of(product_id) == 0 {
        return Err(AppError::NotFound(
            "Sản phẩm không có trong giỏ hàng".to_string(),
        ));
    }

    if req.quantity > 0 {
        ensure_available(&state, product_id, req.quantity).await?;
    }

    cart.set_quantity(product_id, req.quantity);
    save_cart(&session, &cart).await?;

    Ok(Json(summarize(&state, &cart).await?))
}

/// Remove a product from the cart.
#[instrument(skip(state, session))]
pub async fn remove_item(
    State(state): State<AppState>,
    session: Session,
    Path(product_id): Path<ProductId>,
) -> Result<Json<CartSummary>> {
    let mut cart = load_cart(&session).await?;
    cart.remove(product_id);
    save_cart(&session, &cart).await?;

    Ok(Json(summarize(&state, &cart).await?))
}

/// Empty the cart.
#[instrument(skip(state, session))]
pub async fn clear(State(state): State<AppState>, session: Session) -> Result<Json<CartSummary>> {
    session.remove::<Cart>(session_keys::CART).await?;
    Ok(Json(summarize(&state, &Cart::default()).await?))
}

/// Price a cart kept by the client instead of the session.
#[instrument(skip(state, req))]
pub async fn validate(
    State(state): State<AppState>,
    Json(req): Json<ValidateCartRequest>,
) -> Result<Json<CartSummary>> {
    let cart = Cart::from_lines(req.lines);
    Ok(Json(summarize(&state, &cart).await?))
}
