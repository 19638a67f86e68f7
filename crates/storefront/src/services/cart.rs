//! Cart state and validation against live stock.
//!
//! The cart itself is only a list of `(product_id, quantity)` lines kept in
//! the session. Prices, names and stock are always read fresh from the
//! database and evaluated here, so a cart can never check out at a stale
//! price.

use std::collections::HashMap;

use kilala_core::{Price, ProductId, ShippingPolicy, effective_price};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Most units of one product a single cart line may hold.
pub const MAX_LINE_QUANTITY: u32 = 99;

/// One cart line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub product_id: ProductId,
    pub quantity: u32,
}

/// Session cart.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    pub lines: Vec<CartLine>,
}

impl Cart {
    /// Build a cart from arbitrary client lines: merges duplicates, drops
    /// zero quantities and caps each line.
    #[must_use]
    pub fn from_lines(lines: impl IntoIterator<Item = CartLine>) -> Self {
        let mut cart = Self::default();
        for line in lines {
            let current = cart.quantity_of(line.product_id);
            cart.set_quantity(line.product_id, current.saturating_add(line.quantity));
        }
        cart
    }

    /// Quantity currently held for a product.
    #[must_use]
    pub fn quantity_of(&self, product_id: ProductId) -> u32 {
        self.lines
            .iter()
            .find(|l| l.product_id == product_id)
            .map_or(0, |l| l.quantity)
    }

    /// Quantity that adding `quantity` more units would produce.
    #[must_use]
    pub fn quantity_after_add(&self, product_id: ProductId, quantity: u32) -> u32 {
        self.quantity_of(product_id)
            .saturating_add(quantity)
            .min(MAX_LINE_QUANTITY)
    }

    /// Set a line's quantity; zero removes the line.
    pub fn set_quantity(&mut self, product_id: ProductId, quantity: u32) {
        let quantity = quantity.min(MAX_LINE_QUANTITY);
        if quantity == 0 {
            self.remove(product_id);
            return;
        }
        match self.lines.iter_mut().find(|l| l.product_id == product_id) {
            Some(line) => line.quantity = quantity,
            None => self.lines.push(CartLine {
                product_id,
                quantity,
            }),
        }
    }

    /// Remove a product from the cart.
    pub fn remove(&mut self, product_id: ProductId) {
        self.lines.retain(|l| l.product_id != product_id);
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Product ids in the cart.
    #[must_use]
    pub fn product_ids(&self) -> Vec<ProductId> {
        self.lines.iter().map(|l| l.product_id).collect()
    }

    /// Total units across all lines.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.lines.iter().map(|l| l.quantity).sum()
    }
}

/// Live product data needed to price a cart line.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CartProduct {
    pub id: ProductId,
    pub name: String,
    pub slug: String,
    pub price: Decimal,
    pub sale_price: Option<Decimal>,
    pub stock: i32,
    pub is_active: bool,
    pub image_url: Option<String>,
}

/// Why a cart line cannot be checked out as-is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LineIssue {
    /// Product was deleted or deactivated.
    Unavailable,
    /// No units left.
    OutOfStock,
    /// Fewer units left than requested.
    InsufficientStock { available: i32 },
}

impl LineIssue {
    /// Vietnamese description for the customer.
    #[must_use]
    pub fn message(self) -> String {
        match self {
            Self::Unavailable => "Sản phẩm không còn kinh doanh".to_string(),
            Self::OutOfStock => "Sản phẩm đã hết hàng".to_string(),
            Self::InsufficientStock { available } => format!("Chỉ còn {available} sản phẩm"),
        }
    }
}

/// Stock problem for `requested` units of a product with `stock` left.
#[must_use]
pub fn stock_issue(stock: i32, requested: u32) -> Option<LineIssue> {
    if stock <= 0 {
        return Some(LineIssue::OutOfStock);
    }
    if i64::from(requested) > i64::from(stock) {
        return Some(LineIssue::InsufficientStock { available: stock });
    }
    None
}

/// A priced cart line.
#[derive(Debug, Clone, Serialize)]
pub struct CartLineView {
    pub product_id: ProductId,
    pub name: Option<String>,
    pub slug: Option<String>,
    pub image_url: Option<String>,
    pub quantity: u32,
    pub unit_price: Decimal,
    pub line_total: Decimal,
    pub display_line_total: String,
    pub stock: i32,
    pub issue: Option<LineIssue>,
    pub issue_message: Option<String>,
}

/// A priced cart.
#[derive(Debug, Clone, Serialize)]
pub struct CartSummary {
    pub lines: Vec<CartLineView>,
    pub item_count: u32,
    pub subtotal: Decimal,
    pub shipping_fee: Decimal,
    pub total: Decimal,
    pub display_subtotal: String,
    pub display_shipping_fee: String,
    pub display_total: String,
    pub is_valid: bool,
}

/// Price every line of `cart` against live product data.
///
/// Every line is listed with its price at the requested quantity, but only
/// lines without an issue count towards the subtotal.
#[must_use]
pub fn evaluate(
    cart: &Cart,
    products: &HashMap<ProductId, CartProduct>,
    shipping: &ShippingPolicy,
) -> CartSummary {
    let mut lines = Vec::with_capacity(cart.lines.len());
    let mut subtotal = Decimal::ZERO;

    for line in &cart.lines {
        let product = products.get(&line.product_id).filter(|p| p.is_active);

        let view = match product {
            Some(p) => {
                let unit_price = effective_price(p.price, p.sale_price);
                let line_total = unit_price * Decimal::from(line.quantity);
                let issue = stock_issue(p.stock, line.quantity);
                if issue.is_none() {
                    subtotal += line_total;
                }
                CartLineView {
                    product_id: line.product_id,
                    name: Some(p.name.clone()),
                    slug: Some(p.slug.clone()),
                    image_url: p.image_url.clone(),
                    quantity: line.quantity,
                    unit_price,
                    line_total,
                    display_line_total: Price::new(line_total).format_vnd(),
                    stock: p.stock,
                    issue,
                    issue_message: issue.map(LineIssue::message),
                }
            }
            None => CartLineView {
                product_id: line.product_id,
                name: products.get(&line.product_id).map(|p| p.name.clone()),
                slug: None,
                image_url: None,
                quantity: line.quantity,
                unit_price: Decimal::ZERO,
                line_total: Decimal::ZERO,
                display_line_total: Price::ZERO.format_vnd(),
                stock: 0,
                issue: Some(LineIssue::Unavailable),
                issue_message: Some(LineIssue::Unavailable.message()),
            },
        };
        lines.push(view);
    }

    let shipping_fee = shipping.fee_for(subtotal);
    let total = subtotal + shipping_fee;
    let is_valid = !lines.is_empty() && lines.iter().all(|l| l.issue.is_none());

    CartSummary {
        item_count: cart.item_count(),
        lines,
        subtotal,
        shipping_fee,
        total,
        display_subtotal: Price::new(subtotal).format_vnd(),
        display_shipping_fee: Price::new(shipping_fee).format_vnd(),
        display_total: Price::new(total).format_vnd(),
        is_valid,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    fn product(id: i32, price: i64, sale: Option<i64>, stock: i32) -> CartProduct {
        CartProduct {
            id: ProductId::new(id),
            name: format!("Lens {id}"),
            slug: format!("lens-{id}"),
            price: Decimal::from(price),
            sale_price: sale.map(Decimal::from),
            stock,
            is_active: true,
            image_url: None,
        }
    }

    fn catalog(products: Vec<CartProduct>) -> HashMap<ProductId, CartProduct> {
        products.into_iter().map(|p| (p.id, p)).collect()
    }

    #[test]
    fn test_cart_merges_and_caps() {
        let id = ProductId::new(1);
        let cart = Cart::from_lines([
            CartLine { product_id: id, quantity: 60 },
            CartLine { product_id: id, quantity: 60 },
            CartLine { product_id: ProductId::new(2), quantity: 0 },
        ]);
        assert_eq!(cart.lines.len(), 1);
        assert_eq!(cart.quantity_of(id), MAX_LINE_QUANTITY);
    }

    #[test]
    fn test_set_quantity_zero_removes() {
        let id = ProductId::new(4);
        let mut cart = Cart::default();
        cart.set_quantity(id, 2);
        assert_eq!(cart.item_count(), 2);
        cart.set_quantity(id, 0);
        assert!(cart.is_empty());
    }

    #[test]
    fn test_quantity_after_add() {
        let id = ProductId::new(4);
        let mut cart = Cart::default();
        cart.set_quantity(id, 98);
        assert_eq!(cart.quantity_after_add(id, 5), MAX_LINE_QUANTITY);
        assert_eq!(cart.quantity_after_add(ProductId::new(5), 3), 3);
    }

    #[test]
    fn test_stock_issue() {
        assert_eq!(stock_issue(0, 1), Some(LineIssue::OutOfStock));
        assert_eq!(
            stock_issue(2, 3),
            Some(LineIssue::InsufficientStock { available: 2 })
        );
        assert_eq!(stock_issue(3, 3), None);
    }

    #[test]
    fn test_evaluate_valid_cart_with_shipping() {
        let cart = Cart::from_lines([
            CartLine { product_id: ProductId::new(1), quantity: 2 },
            CartLine { product_id: ProductId::new(2), quantity: 1 },
        ]);
        let products = catalog(vec![
            product(1, 150_000, Some(120_000), 10),
            product(2, 90_000, None, 1),
        ]);

        let summary = evaluate(&cart, &products, &ShippingPolicy::default());
        assert!(summary.is_valid);
        assert_eq!(summary.item_count, 3);
        assert_eq!(summary.subtotal, Decimal::from(330_000));
        assert_eq!(summary.shipping_fee, Decimal::from(30_000));
        assert_eq!(summary.total, Decimal::from(360_000));
        assert_eq!(summary.display_total, "360.000 ₫");
        assert_eq!(summary.lines[0].unit_price, Decimal::from(120_000));
    }

    #[test]
    fn test_evaluate_free_shipping_over_threshold() {
        let cart = Cart::from_lines([CartLine { product_id: ProductId::new(1), quantity: 5 }]);
        let products = catalog(vec![product(1, 100_000, None, 5)]);

        let summary = evaluate(&cart, &products, &ShippingPolicy::default());
        assert_eq!(summary.subtotal, Decimal::from(500_000));
        assert_eq!(summary.shipping_fee, Decimal::ZERO);
    }

    #[test]
    fn test_evaluate_flags_issues() {
        let mut inactive = product(3, 50_000, None, 10);
        inactive.is_active = false;
        let cart = Cart::from_lines([
            CartLine { product_id: ProductId::new(1), quantity: 1 },
            CartLine { product_id: ProductId::new(2), quantity: 4 },
            CartLine { product_id: ProductId::new(3), quantity: 1 },
            CartLine { product_id: ProductId::new(9), quantity: 1 },
        ]);
        let products = catalog(vec![
            product(1, 100_000, None, 0),
            product(2, 100_000, None, 2),
            inactive,
        ]);

        let summary = evaluate(&cart, &products, &ShippingPolicy::default());
        assert!(!summary.is_valid);
        assert_eq!(summary.lines[0].issue, Some(LineIssue::OutOfStock));
        assert_eq!(
            summary.lines[1].issue,
            Some(LineIssue::InsufficientStock { available: 2 })
        );
        assert_eq!(
            summary.lines[1].issue_message.as_deref(),
            Some("Chỉ còn 2 sản phẩm")
        );
        assert_eq!(summary.lines[2].issue, Some(LineIssue::Unavailable));
        assert_eq!(summary.lines[2].name.as_deref(), Some("Lens 3"));
        assert_eq!(summary.lines[3].issue, Some(LineIssue::Unavailable));
        // Lines with an issue are shown but not charged.
        assert_eq!(summary.lines[1].line_total, Decimal::from(400_000));
        assert_eq!(summary.subtotal, Decimal::ZERO);
        assert_eq!(summary.total, Decimal::ZERO);
    }

    #[test]
    fn test_evaluate_charges_only_lines_without_issue() {
        let cart = Cart::from_lines([
            CartLine { product_id: ProductId::new(1), quantity: 3 },
            CartLine { product_id: ProductId::new(2), quantity: 1 },
        ]);
        let products = catalog(vec![
            product(1, 100_000, None, 0),
            product(2, 80_000, None, 5),
        ]);

        let summary = evaluate(&cart, &products, &ShippingPolicy::default());
        assert_eq!(summary.lines[0].issue, Some(LineIssue::OutOfStock));
        assert_eq!(summary.subtotal, Decimal::from(80_000));
        assert_eq!(summary.shipping_fee, Decimal::from(30_000));
        assert_eq!(summary.total, Decimal::from(110_000));
    }

    #[test]
    fn test_empty_cart_is_not_valid() {
        let summary = evaluate(&Cart::default(), &HashMap::new(), &ShippingPolicy::default());
        assert!(!summary.is_valid);
        assert_eq!(summary.total, Decimal::ZERO);
    }

    #[test]
    fn test_issue_serializes_with_kind() {
        let json = serde_json::to_value(LineIssue::InsufficientStock { available: 1 }).unwrap();
        assert_eq!(json["kind"], "insufficient_stock");
        assert_eq!(json["available"], 1);
    }
}
