//! Order management: listing, detail and status changes.

use kilala_core::models::{Order, OrderItem};
use kilala_core::{OrderId, OrderStatus, Page, PageParams, Price, UserId};
use serde::{Deserialize, Serialize};
use sqlx::{PgPool, Postgres, QueryBuilder, Transaction};

use super::{RepositoryError, like_pattern};

const ORDER_COLUMNS: &str = "id, code, user_id, customer_name, email, phone, shipping_address, \
    note, payment_method, status, subtotal, shipping_fee, total, delivered_at, \
    created_at, updated_at";

const ITEM_COLUMNS: &str =
    "id, order_id, product_id, product_name, product_slug, unit_price, quantity, line_total";

/// Filters for the order listing.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OrderFilter {
    pub status: Option<OrderStatus>,
    /// Matches code, customer name, email or phone.
    pub q: Option<String>,
}

/// An order row with its line count, for listings.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct OrderSummary {
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub order: Order,
    pub item_count: i64,
}

/// An order with its lines and display labels.
#[derive(Debug, Clone, Serialize)]
pub struct OrderDetail {
    #[serde(flatten)]
    pub order: Order,
    pub status_label: &'static str,
    pub payment_method_label: &'static str,
    pub display_total: String,
    /// Statuses the order may move to next.
    pub next_statuses: Vec<OrderStatus>,
    pub items: Vec<OrderItem>,
}

impl OrderDetail {
    fn new(order: Order, items: Vec<OrderItem>) -> Self {
        Self {
            status_label: order.status.label(),
            payment_method_label: order.payment_method.label(),
            display_total: Price::new(order.total).format_vnd(),
            next_statuses: next_statuses(order.status),
            order,
            items,
        }
    }
}

/// Statuses reachable from `current`, excluding `current` itself.
#[must_use]
pub fn next_statuses(current: OrderStatus) -> Vec<OrderStatus> {
    OrderStatus::ALL
        .into_iter()
        .filter(|s| *s != current && current.can_transition_to(*s))
        .collect()
}

/// Reject a status change the transition table does not allow.
fn check_transition(current: OrderStatus, next: OrderStatus) -> Result<(), RepositoryError> {
    if current.can_transition_to(next) {
        return Ok(());
    }
    if current.is_terminal() {
        return Err(RepositoryError::Conflict(format!(
            "Đơn hàng đã ở trạng thái \"{}\", không thể thay đổi nữa",
            current.label()
        )));
    }
    Err(RepositoryError::Conflict(format!(
        "Không thể chuyển đơn hàng từ \"{}\" sang \"{}\"",
        current.label(),
        next.label()
    )))
}

fn push_filters(builder: &mut QueryBuilder<'_, Postgres>, filter: &OrderFilter) {
    if let Some(status) = filter.status {
        builder.push(" AND o.status = ").push_bind(status);
    }
    if let Some(q) = filter.q.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
        let pattern = like_pattern(q);
        builder
            .push(" AND (o.code ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR o.customer_name ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR o.email ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR o.phone ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
}

/// Repository for order administration.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Orders matching `filter`, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(
        &self,
        filter: &OrderFilter,
        params: &PageParams,
    ) -> Result<Page<OrderSummary>, RepositoryError> {
        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM orders o WHERE TRUE");
        push_filters(&mut count, filter);
        let total = count.build_query_scalar::<i64>().fetch_one(self.pool).await?;

        let mut query = QueryBuilder::<Postgres>::new(
            "SELECT o.id, o.code, o.user_id, o.customer_name, o.email, o.phone, \
             o.shipping_address, o.note, o.payment_method, o.status, o.subtotal, \
             o.shipping_fee, o.total, o.delivered_at, o.created_at, o.updated_at, \
             (SELECT COUNT(*) FROM order_items oi WHERE oi.order_id = o.id) AS item_count \
             FROM orders o WHERE TRUE",
        );
        push_filters(&mut query, filter);
        query
            .push(" ORDER BY o.created_at DESC, o.id DESC LIMIT ")
            .push_bind(params.limit())
            .push(" OFFSET ")
            .push_bind(params.offset());

        let items = query.build_query_as::<OrderSummary>().fetch_all(self.pool).await?;
        Ok(Page::new(items, params, total))
    }

    /// An order with its lines.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: OrderId) -> Result<Option<OrderDetail>, RepositoryError> {
        let order = sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        match order {
            Some(order) => {
                let items = items(self.pool, order.id).await?;
                Ok(Some(OrderDetail::new(order, items)))
            }
            None => Ok(None),
        }
    }

    /// A customer's most recent orders.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn recent_for_user(
        &self,
        user_id: UserId,
        limit: i64,
    ) -> Result<Vec<Order>, RepositoryError> {
        let orders = sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE user_id = $1 \
             ORDER BY created_at DESC, id DESC LIMIT $2"
        ))
        .bind(user_id)
        .bind(limit)
        .fetch_all(self.pool)
        .await?;
        Ok(orders)
    }

    /// Move an order to `next`.
    ///
    /// Runs in one transaction with the order row locked. Cancelling puts
    /// every item's quantity back into stock; delivering stamps
    /// `delivered_at`. Re-applying the current status changes nothing.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the order does not exist, or
    /// `RepositoryError::Conflict` if the transition is not allowed.
    pub async fn update_status(
        &self,
        id: OrderId,
        next: OrderStatus,
    ) -> Result<OrderDetail, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let current = sqlx::query_scalar::<_, OrderStatus>(
            "SELECT status FROM orders WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        check_transition(current, next)?;

        if current != next {
            if next == OrderStatus::Cancelled {
                restore_stock(&mut tx, id).await?;
            }

            sqlx::query(
                "UPDATE orders SET status = $2, \
                    delivered_at = CASE WHEN $2 = 'delivered'::order_status \
                        THEN now() ELSE delivered_at END, \
                    updated_at = now() \
                 WHERE id = $1",
            )
            .bind(id)
            .bind(next)
            .execute(&mut *tx)
            .await?;

            tracing::info!(order_id = %id, from = %current, to = %next, "Order status changed");
        }

        let order = sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1"
        ))
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        let items = items(self.pool, id).await?;
        Ok(OrderDetail::new(order, items))
    }
}

async fn items(pool: &PgPool, order_id: OrderId) -> Result<Vec<OrderItem>, RepositoryError> {
    let items = sqlx::query_as::<_, OrderItem>(&format!(
        "SELECT {ITEM_COLUMNS} FROM order_items WHERE order_id = $1 ORDER BY id"
    ))
    .bind(order_id)
    .fetch_all(pool)
    .await?;
    Ok(items)
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_next_statuses() {
        assert_eq!(
            next_statuses(OrderStatus::Pending),
            vec![OrderStatus::Confirmed, OrderStatus::Cancelled]
        );
        assert_eq!(
            next_statuses(OrderStatus::Confirmed),
            vec![OrderStatus::Shipping, OrderStatus::Cancelled]
        );
        assert_eq!(
            next_statuses(OrderStatus::Shipping),
            vec![OrderStatus::Delivered]
        );
        assert!(next_statuses(OrderStatus::Delivered).is_empty());
        assert!(next_statuses(OrderStatus::Cancelled).is_empty());
    }

    #[test]
    fn test_check_transition_messages() {
        assert!(check_transition(OrderStatus::Pending, OrderStatus::Confirmed).is_ok());
        assert!(check_transition(OrderStatus::Shipping, OrderStatus::Shipping).is_ok());

        let Err(RepositoryError::Conflict(msg)) =
            check_transition(OrderStatus::Pending, OrderStatus::Delivered)
        else {
            panic!("expected conflict");
        };
        assert_eq!(msg, "Không thể chuyển đơn hàng từ \"Chờ xác nhận\" sang \"Đã giao\"");

        let Err(RepositoryError::Conflict(msg)) =
            check_transition(OrderStatus::Cancelled, OrderStatus::Confirmed)
        else {
            panic!("expected conflict");
        };
        assert!(msg.contains("không thể thay đổi nữa"), "{msg}");
    }
}
