//! Reviews and blog posts.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::types::{PostId, ProductId, ReviewId, UserId};

/// A customer's review of a product they received.
#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::FromRow))]
pub struct Review {
    pub id: ReviewId,
    pub product_id: ProductId,
    pub user_id: UserId,
    /// 1 to 5 stars.
    pub rating: i16,
    pub comment: Option<String>,
    pub is_approved: bool,
    pub created_at: DateTime<Utc>,
}

/// A blog post written in markdown.
#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::FromRow))]
pub struct Post {
    pub id: PostId,
    pub title: String,
    pub slug: String,
    pub excerpt: Option<String>,
    pub content: String,
    pub cover_image: Option<String>,
    pub is_published: bool,
    pub published_at: Option<DateTime<Utc>>,
    pub author_id: Option<UserId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
