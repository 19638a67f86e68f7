//! Dashboard aggregates.

use kilala_core::models::Order;
use kilala_core::{OrderStatus, ProductId};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::PgPool;

use super::RepositoryError;

/// Recent orders shown on the dashboard.
const RECENT_ORDERS: i64 = 5;

/// Low-stock products shown on the dashboard.
const LOW_STOCK_LIMIT: i64 = 10;

/// Best sellers shown on the dashboard.
const TOP_PRODUCTS: i64 = 5;

/// Months in the revenue chart, current month included.
const REVENUE_MONTHS: i32 = 6;

/// Headline counts and revenue.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Totals {
    pub products: i64,
    pub active_products: i64,
    pub customers: i64,
    pub orders: i64,
    pub pending_orders: i64,
    /// Sum of delivered order totals.
    pub revenue: Decimal,
    /// Sum of totals of orders delivered this calendar month.
    pub revenue_this_month: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusCount {
    pub status: OrderStatus,
    pub label: &'static str,
    pub count: i64,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct MonthlyRevenue {
    /// `YYYY-MM`.
    pub month: String,
    pub revenue: Decimal,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct LowStockProduct {
    pub id: ProductId,
    pub name: String,
    pub sku: Option<String>,
    pub stock: i32,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct TopProduct {
    pub id: ProductId,
    pub name: String,
    pub quantity_sold: i64,
    pub revenue: Decimal,
}

/// Everything the dashboard shows.
#[derive(Debug, Clone, Serialize)]
pub struct Dashboard {
    pub totals: Totals,
    pub orders_by_status: Vec<StatusCount>,
    pub monthly_revenue: Vec<MonthlyRevenue>,
    pub recent_orders: Vec<Order>,
    pub low_stock: Vec<LowStockProduct>,
    pub top_products: Vec<TopProduct>,
}

/// One entry per status in lifecycle order, zero when absent from `rows`.
#[must_use]
pub fn status_counts(rows: &[(OrderStatus, i64)]) -> Vec<StatusCount> {
    OrderStatus::ALL
        .into_iter()
        .map(|status| StatusCount {
            status,
            label: status.label(),
            count: rows
                .iter()
                .find(|(s, _)| *s == status)
                .map_or(0, |(_, c)| *c),
        })
        .collect()
}

/// Repository for dashboard statistics.
pub struct DashboardRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> DashboardRepository<'a> {
    /// Create a new dashboard repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Gather all dashboard figures. `low_stock_threshold` is inclusive.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn load(&self, low_stock_threshold: i32) -> Result<Dashboard, RepositoryError> {
        let (totals, by_status, monthly_revenue, recent_orders, low_stock, top_products) = tokio::try_join!(
            sqlx::query_as::<_, Totals>(
                "SELECT \
                    (SELECT COUNT(*) FROM products) AS products, \
                    (SELECT COUNT(*) FROM products WHERE is_active) AS active_products, \
                    (SELECT COUNT(*) FROM users WHERE role = 'customer') AS customers, \
                    (SELECT COUNT(*) FROM orders) AS orders, \
                    (SELECT COUNT(*) FROM orders WHERE status = 'pending') AS pending_orders, \
                    (SELECT COALESCE(SUM(total), 0) FROM orders \
                        WHERE status = 'delivered') AS revenue, \
                    (SELECT COALESCE(SUM(total), 0) FROM orders \
                        WHERE status = 'delivered' \
                        AND COALESCE(delivered_at, created_at) >= date_trunc('month', now()) \
                    ) AS revenue_this_month",
            )
            .fetch_one(self.pool),
            sqlx::query_as::<_, (OrderStatus, i64)>(
                "SELECT status, COUNT(*) FROM orders GROUP BY status",
            )
            .fetch_all(self.pool),
            sqlx::query_as::<_, MonthlyRevenue>(
                "SELECT to_char(m.month, 'YYYY-MM') AS month, \
                    COALESCE(SUM(o.total), 0) AS revenue \
                 FROM generate_series( \
                    date_trunc('month', now()) - make_interval(months => $1 - 1), \
                    date_trunc('month', now()), \
                    interval '1 month' \
                 ) AS m(month) \
                 LEFT JOIN orders o ON o.status = 'delivered' \
                    AND date_trunc('month', COALESCE(o.delivered_at, o.created_at)) = m.month \
                 GROUP BY m.month ORDER BY m.month",
            )
            .bind(REVENUE_MONTHS)
            .fetch_all(self.pool),
            sqlx::query_as::<_, Order>(
                "SELECT id, code, user_id, customer_name, email, phone, shipping_address, \
                    note, payment_method, status, subtotal, shipping_fee, total, delivered_at, \
                    created_at, updated_at \
                 FROM orders ORDER BY created_at DESC, id DESC LIMIT $1",
            )
            .bind(RECENT_ORDERS)
            .fetch_all(self.pool),
            sqlx::query_as::<_, LowStockProduct>(
                "SELECT id, name, sku, stock FROM products \
                 WHERE is_active AND stock <= $1 \
                 ORDER BY stock, name LIMIT $2",
            )
            .bind(low_stock_threshold)
            .bind(LOW_STOCK_LIMIT)
            .fetch_all(self.pool),
            sqlx::query_as::<_, TopProduct>(
                "SELECT p.id, p.name, SUM(oi.quantity)::int8 AS quantity_sold, \
                    SUM(oi.line_total) AS revenue \
                 FROM order_items oi \
                 JOIN orders o ON o.id = oi.order_id \
                 JOIN products p ON p.id = oi.product_id \
                 WHERE o.status <> 'cancelled' \
                 GROUP BY p.id, p.name \
                 ORDER BY quantity_sold DESC, p.name LIMIT $1",
            )
            .bind(TOP_PRODUCTS)
            .fetch_all(self.pool),
        )?;

        Ok(Dashboard {
            totals,
            orders_by_status: status_counts(&by_status),
            monthly_revenue,
            recent_orders,
            low_stock,
            top_products,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_counts_fill_missing_statuses() {
        let counts = status_counts(&[(OrderStatus::Delivered, 4), (OrderStatus::Pending, 2)]);

        assert_eq!(counts.len(), OrderStatus::ALL.len());
        assert_eq!(counts[0].status, OrderStatus::Pending);
        assert_eq!(counts[0].count, 2);
        assert_eq!(counts[1].count, 0);
        assert_eq!(
            counts
                .iter()
                .find(|c| c.status == OrderStatus::Delivered)
                .map(|c| c.count),
            Some(4)
        );
        assert_eq!(counts.iter().map(|c| c.count).sum::<i64>(), 6);
    }
}
