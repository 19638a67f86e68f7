//! Review eligibility and input validation.
//!
//! A customer may review a product once, and only after an order containing
//! it has been delivered to them.

use kilala_core::{ProductId, UserId};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::db::{OrderRepository, RepositoryError, ReviewRepository};

/// Longest accepted review comment.
pub const MAX_COMMENT_LENGTH: usize = 2000;

/// Why a user may not review a product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IneligibleReason {
    NotLoggedIn,
    NotPurchased,
    AlreadyReviewed,
}

impl IneligibleReason {
    /// Vietnamese explanation.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::NotLoggedIn => "Vui lòng đăng nhập để đánh giá sản phẩm",
            Self::NotPurchased => "Bạn chỉ có thể đánh giá sản phẩm đã nhận được",
            Self::AlreadyReviewed => "Bạn đã đánh giá sản phẩm này",
        }
    }
}

/// Result of the eligibility check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Eligibility {
    pub eligible: bool,
    pub reason: Option<IneligibleReason>,
}

impl Eligibility {
    const ELIGIBLE: Self = Self {
        eligible: true,
        reason: None,
    };

    const fn denied(reason: IneligibleReason) -> Self {
        Self {
            eligible: false,
            reason: Some(reason),
        }
    }
}

/// Check whether `user_id` may review `product_id`.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if a query fails.
pub async fn eligibility(
    pool: &PgPool,
    user_id: Option<UserId>,
    product_id: ProductId,
) -> Result<Eligibility, RepositoryError> {
    let Some(user_id) = user_id else {
        return Ok(Eligibility::denied(IneligibleReason::NotLoggedIn));
    };

    if !OrderRepository::new(pool)
        .has_delivered_purchase(user_id, product_id)
        .await?
    {
        return Ok(Eligibility::denied(IneligibleReason::NotPurchased));
    }

    if ReviewRepository::new(pool)
        .has_reviewed(user_id, product_id)
        .await?
    {
        return Ok(Eligibility::denied(IneligibleReason::AlreadyReviewed));
    }

    Ok(Eligibility::ELIGIBLE)
}

/// Review as posted by the client.
#[derive(Debug, Clone, Deserialize)]
pub struct ReviewInput {
    pub rating: i16,
    pub comment: Option<String>,
}

/// A review that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidReview {
    pub rating: i16,
    pub comment: Option<String>,
}

impl ReviewInput {
    /// Check the rating range and comment length. Blank comments are dropped.
    ///
    /// # Errors
    ///
    /// Returns a Vietnamese message describing the problem.
    pub fn validate(self) -> Result<ValidReview, &'static str> {
        if !(1..=5).contains(&self.rating) {
            return Err("Số sao đánh giá phải từ 1 đến 5");
        }

        let comment = self
            .comment
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty());
        if comment
            .as_ref()
            .is_some_and(|c| c.chars().count() > MAX_COMMENT_LENGTH)
        {
            return Err("Nội dung đánh giá quá dài");
        }

        Ok(ValidReview {
            rating: self.rating,
            comment,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_rating_range() {
        for rating in [0, 6, -1] {
            let input = ReviewInput { rating, comment: None };
            assert!(input.validate().is_err());
        }
        let input = ReviewInput { rating: 5, comment: None };
        assert_eq!(input.validate().unwrap().rating, 5);
    }

    #[test]
    fn test_comment_trimmed_and_bounded() {
        let input = ReviewInput {
            rating: 4,
            comment: Some("  Lens đeo êm, màu tự nhiên  ".to_string()),
        };
        assert_eq!(
            input.validate().unwrap().comment.as_deref(),
            Some("Lens đeo êm, màu tự nhiên")
        );

        let blank = ReviewInput { rating: 4, comment: Some("   ".to_string()) };
        assert_eq!(blank.validate().unwrap().comment, None);

        let long = ReviewInput {
            rating: 4,
            comment: Some("ê".repeat(MAX_COMMENT_LENGTH + 1)),
        };
        assert!(long.validate().is_err());
    }

    #[test]
    fn test_eligibility_serializes_reason() {
        let json = serde_json::to_value(Eligibility::denied(IneligibleReason::NotPurchased)).unwrap();
        assert_eq!(json["eligible"], false);
        assert_eq!(json["reason"], "not_purchased");

        let json = serde_json::to_value(Eligibility::ELIGIBLE).unwrap();
        assert!(json["reason"].is_null());
    }
}
