//! Order placement, lookup and customer cancellation.

use chrono::Utc;
use kilala_core::models::{Order, OrderItem};
use kilala_core::{
    Email, OrderCode, OrderId, OrderStatus, Page, PageParams, Price, ProductId, ShippingPolicy,
    UserId, effective_price,
};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::{PgPool, Postgres, Transaction};

use super::RepositoryError;
use crate::services::cart::CartLine;
use crate::services::checkout::ValidCheckout;

const ORDER_COLUMNS: &str = "id, code, user_id, customer_name, email, phone, shipping_address, \
    note, payment_method, status, subtotal, shipping_fee, total, delivered_at, \
    created_at, updated_at";

const ITEM_COLUMNS: &str =
    "id, order_id, product_id, product_name, product_slug, unit_price, quantity, line_total";

/// An order with its lines and display labels.
#[derive(Debug, Clone, Serialize)]
pub struct OrderDetail {
    #[serde(flatten)]
    pub order: Order,
    pub status_label: &'static str,
    pub payment_method_label: &'static str,
    pub display_total: String,
    pub items: Vec<OrderItem>,
}

impl OrderDetail {
    fn new(order: Order, items: Vec<OrderItem>) -> Self {
        Self {
            status_label: order.status.label(),
            payment_method_label: order.payment_method.label(),
            display_total: Price::new(order.total).format_vnd(),
            order,
            items,
        }
    }
}

/// Product state taken while decrementing stock.
#[derive(sqlx::FromRow)]
struct ReservedProduct {
    id: ProductId,
    name: String,
    slug: String,
    price: Decimal,
    sale_price: Option<Decimal>,
}

/// Repository for orders.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Place an order for `lines` in a single transaction.
    ///
    /// Lines are processed in product id order. Each one decrements stock
    /// only if the product is active and has enough units left, so two
    /// concurrent checkouts can never oversell.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` naming the product when a line
    /// cannot be fulfilled; nothing is written in that case.
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn place(
        &self,
        checkout: &ValidCheckout,
        user_id: Option<UserId>,
        lines: &[CartLine],
        shipping: &ShippingPolicy,
    ) -> Result<OrderDetail, RepositoryError> {
        let mut lines = lines.to_vec();
        lines.sort_by_key(|l| l.product_id);

        let mut tx = self.pool.begin().await?;
        let mut reserved = Vec::with_capacity(lines.len());

        for line in &lines {
            let quantity = i32::try_from(line.quantity)
                .map_err(|_| RepositoryError::Conflict("Số lượng không hợp lệ".to_string()))?;

            let product = sqlx::query_as::<_, ReservedProduct>(
                "UPDATE products SET stock = stock - $2, updated_at = now() \
                 WHERE id = $1 AND is_active AND stock >= $2 \
                 RETURNING id, name, slug, price, sale_price",
            )
            .bind(line.product_id)
            .bind(quantity)
            .fetch_optional(&mut *tx)
            .await?;

            match product {
                Some(product) => reserved.push((product, quantity)),
                None => return Err(unfulfillable(&mut tx, line.product_id).await),
            }
        }

        let subtotal: Decimal = reserved
            .iter()
            .map(|(p, q)| effective_price(p.price, p.sale_price) * Decimal::from(*q))
            .sum();
        let shipping_fee = shipping.fee_for(subtotal);
        let total = subtotal + shipping_fee;
        let code = OrderCode::generate(Utc::now());

        let order = sqlx::query_as::<_, Order>(&format!(
            "INSERT INTO orders (code, user_id, customer_name, email, phone, shipping_address, \
                note, payment_method, subtotal, shipping_fee, total) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) \
             RETURNING {ORDER_COLUMNS}"
        ))
        .bind(code.as_str())
        .bind(user_id)
        .bind(&checkout.customer_name)
        .bind(checkout.email.as_str())
        .bind(&checkout.phone)
        .bind(&checkout.shipping_address)
        .bind(checkout.note.as_deref())
        .bind(checkout.payment_method)
        .bind(subtotal)
        .bind(shipping_fee)
        .bind(total)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| RepositoryError::from_unique(e, "order"))?;

        let mut items = Vec::with_capacity(reserved.len());
        for (product, quantity) in reserved {
            let unit_price = effective_price(product.price, product.sale_price);
            let item = sqlx::query_as::<_, OrderItem>(&format!(
                "INSERT INTO order_items (order_id, product_id, product_name, product_slug, \
                    unit_price, quantity, line_total) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7) \
                 RETURNING {ITEM_COLUMNS}"
            ))
            .bind(order.id)
            .bind(product.id)
            .bind(&product.name)
            .bind(&product.slug)
            .bind(unit_price)
            .bind(quantity)
            .bind(unit_price * Decimal::from(quantity))
            .fetch_one(&mut *tx)
            .await?;
            items.push(item);
        }

        tx.commit().await?;

        tracing::info!(order_id = %order.id, code = %order.code, total = %order.total, "Order placed");

        Ok(OrderDetail::new(order, items))
    }

    /// Guest lookup by order code and the email used at checkout.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn find_by_code_and_email(
        &self,
        code: &OrderCode,
        email: &Email,
    ) -> Result<Option<OrderDetail>, RepositoryError> {
        let order = sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE code = $1 AND lower(email) = $2"
        ))
        .bind(code.as_str())
        .bind(email.as_str())
        .fetch_optional(self.pool)
        .await?;

        self.with_items(order).await
    }

    /// A customer's orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_user(
        &self,
        user_id: UserId,
        params: &PageParams,
    ) -> Result<Page<Order>, RepositoryError> {
        let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM orders WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(self.pool)
            .await?;

        let orders = sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE user_id = $1 \
             ORDER BY created_at DESC, id DESC LIMIT $2 OFFSET $3"
        ))
        .bind(user_id)
        .bind(params.limit())
        .bind(params.offset())
        .fetch_all(self.pool)
        .await?;

        Ok(Page::new(orders, params, total))
    }

    /// One of a customer's orders. Orders of other users are not found.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_for_user(
        &self,
        id: OrderId,
        user_id: UserId,
    ) -> Result<Option<OrderDetail>, RepositoryError> {
        let order = sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1 AND user_id = $2"
        ))
        .bind(id)
        .bind(user_id)
        .fetch_optional(self.pool)
        .await?;

        self.with_items(order).await
    }

    /// Cancel a customer's pending order and put its stock back.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the order is not the user's.
    /// Returns `RepositoryError::Conflict` if the order is no longer pending.
    pub async fn cancel_for_user(
        &self,
        id: OrderId,
        user_id: UserId,
    ) -> Result<OrderDetail, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let status = sqlx::query_scalar::<_, OrderStatus>(
            "SELECT status FROM orders WHERE id = $1 AND user_id = $2 FOR UPDATE",
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        if !status.customer_cancellable() {
            return Err(RepositoryError::Conflict(
                "Chỉ có thể hủy đơn hàng đang chờ xác nhận".to_string(),
            ));
        }

        restore_stock(&mut tx, id).await?;

        let order = sqlx::query_as::<_, Order>(&format!(
            "UPDATE orders SET status = 'cancelled', updated_at = now() \
             WHERE id = $1 RETURNING {ORDER_COLUMNS}"
        ))
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(order_id = %id, "Order cancelled by customer");

        let items = self.items(id).await?;
        Ok(OrderDetail::new(order, items))
    }

    /// Delivered orders of `user_id` containing `product_id`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn has_delivered_purchase(
        &self,
        user_id: UserId,
        product_id: ProductId,
    ) -> Result<bool, RepositoryError> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM orders o \
                JOIN order_items oi ON oi.order_id = o.id \
                WHERE o.user_id = $1 AND oi.product_id = $2 AND o.status = 'delivered')",
        )
        .bind(user_id)
        .bind(product_id)
        .fetch_one(self.pool)
        .await?;

        Ok(exists)
    }

    async fn items(&self, order_id: OrderId) -> Result<Vec<OrderItem>, RepositoryError> {
        let items = sqlx::query_as::<_, OrderItem>(&format!(
            "SELECT {ITEM_COLUMNS} FROM order_items WHERE order_id = $1 ORDER BY id"
        ))
        .bind(order_id)
        .fetch_all(self.pool)
        .await?;

        Ok(items)
    }

    async fn with_items(&self, order: Option<Order>) -> Result<Option<OrderDetail>, RepositoryError> {
        match order {
            Some(order) => {
                let items = self.items(order.id).await?;
                Ok(Some(OrderDetail::new(order, items)))
            }
            None => Ok(None),
        }
    }
}

/// Add every item's quantity back to its product.
async fn restore_stock(
    tx: &mut Transaction<'_, Postgres>,
    order_id: OrderId,
) -> Result<(), RepositoryError> {
    sqlx::query(
        "UPDATE products p SET stock = p.stock + oi.quantity, updated_at = now() \
         FROM order_items oi \
         WHERE oi.order_id = $1 AND oi.product_id = p.id",
    )
    .bind(order_id)
    .execute(&mut **tx)
    .await?;

    Ok(())
}

/// Explain why a line could not be reserved.
async fn unfulfillable(tx: &mut Transaction<'_, Postgres>, product_id: ProductId) -> RepositoryError {
    let product = sqlx::query_as::<_, (String, bool, i32)>(
        "SELECT name, is_active, stock FROM products WHERE id = $1",
    )
    .bind(product_id)
    .fetch_optional(&mut **tx)
    .await;

    match product {
        Ok(Some((name, true, stock))) if stock > 0 => {
            RepositoryError::Conflict(format!("Sản phẩm \"{name}\" chỉ còn {stock} sản phẩm"))
        }
        Ok(Some((name, true, _))) => {
            RepositoryError::Conflict(format!("Sản phẩm \"{name}\" đã hết hàng"))
        }
        Ok(Some((name, false, _))) => {
            RepositoryError::Conflict(format!("Sản phẩm \"{name}\" không còn kinh doanh"))
        }
        Ok(None) => RepositoryError::Conflict("Sản phẩm không còn kinh doanh".to_string()),
        Err(e) => RepositoryError::Database(e),
    }
}
