//! Status and role enums.

use serde::{Deserialize, Serialize};

/// Order lifecycle status.
///
/// ```text
/// pending ──> confirmed ──> shipping ──> delivered
///    │            │
///    └────────────┴──> cancelled
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "order_status", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    Pending,
    Confirmed,
    Shipping,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    /// Every status, in lifecycle order.
    pub const ALL: [Self; 5] = [
        Self::Pending,
        Self::Confirmed,
        Self::Shipping,
        Self::Delivered,
        Self::Cancelled,
    ];

    /// Whether an order may move from `self` to `next`.
    ///
    /// Re-applying the current status is always allowed.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Pending | Self::Confirmed | Self::Cancelled)
                | (Self::Confirmed, Self::Confirmed | Self::Shipping | Self::Cancelled)
                | (Self::Shipping, Self::Shipping | Self::Delivered)
                | (Self::Delivered, Self::Delivered)
                | (Self::Cancelled, Self::Cancelled)
        )
    }

    /// Whether no further transitions are possible.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Delivered | Self::Cancelled)
    }

    /// Whether the customer may still cancel the order themselves.
    #[must_use]
    pub const fn customer_cancellable(self) -> bool {
        matches!(self, Self::Pending)
    }

    /// Vietnamese label shown to customers and staff.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Pending => "Chờ xác nhận",
            Self::Confirmed => "Đã xác nhận",
            Self::Shipping => "Đang giao",
            Self::Delivered => "Đã giao",
            Self::Cancelled => "Đã hủy",
        }
    }

    /// Database/wire value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::Shipping => "shipping",
            Self::Delivered => "delivered",
            Self::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| format!("invalid order status: {s}"))
    }
}

/// How the customer pays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "payment_method", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Cash on delivery.
    #[default]
    Cod,
    /// Bank transfer before shipping.
    BankTransfer,
}

impl PaymentMethod {
    /// Vietnamese label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Cod => "Thanh toán khi nhận hàng",
            Self::BankTransfer => "Chuyển khoản ngân hàng",
        }
    }
}

/// Account role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "user_role", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    /// Storefront customer.
    #[default]
    Customer,
    /// Back-office staff with full access.
    Admin,
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Customer => write!(f, "customer"),
            Self::Admin => write!(f, "admin"),
        }
    }
}

impl std::str::FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "customer" => Ok(Self::Customer),
            "admin" => Ok(Self::Admin),
            _ => Err(format!("invalid user role: {s}")),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_forward_transitions() {
        use OrderStatus::*;
        assert!(Pending.can_transition_to(Confirmed));
        assert!(Confirmed.can_transition_to(Shipping));
        assert!(Shipping.can_transition_to(Delivered));
    }

    #[test]
    fn test_cancellation_window() {
        use OrderStatus::*;
        assert!(Pending.can_transition_to(Cancelled));
        assert!(Confirmed.can_transition_to(Cancelled));
        assert!(!Shipping.can_transition_to(Cancelled));
        assert!(!Delivered.can_transition_to(Cancelled));
    }

    #[test]
    fn test_no_skipping_or_going_back() {
        use OrderStatus::*;
        assert!(!Pending.can_transition_to(Delivered));
        assert!(!Pending.can_transition_to(Shipping));
        assert!(!Shipping.can_transition_to(Confirmed));
        assert!(!Cancelled.can_transition_to(Pending));
    }

    #[test]
    fn test_terminal_states_only_allow_self() {
        for status in [OrderStatus::Delivered, OrderStatus::Cancelled] {
            assert!(status.is_terminal());
            for next in OrderStatus::ALL {
                assert_eq!(status.can_transition_to(next), next == status);
            }
        }
    }

    #[test]
    fn test_customer_cancellable() {
        assert!(OrderStatus::Pending.customer_cancellable());
        assert!(!OrderStatus::Confirmed.customer_cancellable());
    }

    #[test]
    fn test_status_parse_and_serde() {
        assert_eq!("shipping".parse::<OrderStatus>().unwrap(), OrderStatus::Shipping);
        assert!("shipped".parse::<OrderStatus>().is_err());
        assert_eq!(
            serde_json::to_string(&OrderStatus::Cancelled).unwrap(),
            "\"cancelled\""
        );
        assert_eq!(
            serde_json::to_string(&PaymentMethod::BankTransfer).unwrap(),
            "\"bank_transfer\""
        );
    }

    #[test]
    fn test_user_role_roundtrip() {
        assert_eq!("admin".parse::<UserRole>().unwrap(), UserRole::Admin);
        assert_eq!(UserRole::Customer.to_string(), "customer");
        assert!("super_admin".parse::<UserRole>().is_err());
    }
}
