//! Offset pagination shared by the storefront and admin listings.

use serde::{Deserialize, Serialize};

/// Items per page when the client does not ask for a size.
pub const DEFAULT_PER_PAGE: u32 = 12;

/// Largest page size a client may request.
pub const MAX_PER_PAGE: u32 = 60;

/// Page request parsed from the query string.
///
/// Both fields are optional on the wire; out-of-range values are clamped
/// rather than rejected.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct PageParams {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

impl PageParams {
    /// Construct explicit parameters.
    #[must_use]
    pub const fn new(page: u32, per_page: u32) -> Self {
        Self {
            page: Some(page),
            per_page: Some(per_page),
        }
    }

    /// 1-based page number.
    #[must_use]
    pub fn page(&self) -> u32 {
        self.page.unwrap_or(1).max(1)
    }

    /// Page size, clamped to `1..=MAX_PER_PAGE`.
    #[must_use]
    pub fn per_page(&self) -> u32 {
        self.per_page
            .unwrap_or(DEFAULT_PER_PAGE)
            .clamp(1, MAX_PER_PAGE)
    }

    /// SQL `LIMIT`.
    #[must_use]
    pub fn limit(&self) -> i64 {
        i64::from(self.per_page())
    }

    /// SQL `OFFSET`.
    #[must_use]
    pub fn offset(&self) -> i64 {
        i64::from(self.page() - 1) * i64::from(self.per_page())
    }
}

/// One page of results.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u32,
    pub per_page: u32,
    pub total: i64,
    pub total_pages: i64,
    /// Whether another page follows this one.
    pub has_next: bool,
}

impl<T> Page<T> {
    /// Assemble a page from the rows and the unpaginated total.
    #[must_use]
    pub fn new(items: Vec<T>, params: &PageParams, total: i64) -> Self {
        let per_page = i64::from(params.per_page());
        let total = total.max(0);
        let total_pages = ((total + per_page - 1) / per_page).max(1);

        let page = params.page();

        Self {
            items,
            page,
            per_page: params.per_page(),
            total,
            total_pages,
            has_next: i64::from(page) < total_pages,
        }
    }

    /// Transform the items while keeping the paging metadata.
    #[must_use]
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            page: self.page,
            per_page: self.per_page,
            total: self.total,
            total_pages: self.total_pages,
            has_next: self.has_next,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let params = PageParams::default();
        assert_eq!(params.page(), 1);
        assert_eq!(params.per_page(), DEFAULT_PER_PAGE);
        assert_eq!(params.offset(), 0);
    }

    #[test]
    fn test_clamping() {
        let params = PageParams::new(0, 1000);
        assert_eq!(params.page(), 1);
        assert_eq!(params.per_page(), MAX_PER_PAGE);

        let params = PageParams::new(3, 0);
        assert_eq!(params.per_page(), 1);
        assert_eq!(params.offset(), 2);
    }

    #[test]
    fn test_offset() {
        let params = PageParams::new(4, 12);
        assert_eq!(params.limit(), 12);
        assert_eq!(params.offset(), 36);
    }

    #[test]
    fn test_total_pages() {
        let params = PageParams::new(1, 12);
        assert_eq!(Page::<u8>::new(vec![], &params, 0).total_pages, 1);
        assert_eq!(Page::<u8>::new(vec![], &params, 12).total_pages, 1);
        assert_eq!(Page::<u8>::new(vec![], &params, 13).total_pages, 2);
        assert_eq!(Page::<u8>::new(vec![], &params, 25).total_pages, 3);
    }

    #[test]
    fn test_has_next_and_map() {
        let params = PageParams::new(1, 2);
        let page = Page::new(vec![1, 2], &params, 5);
        assert!(page.has_next);

        let mapped = page.map(|n| n * 10);
        assert_eq!(mapped.items, vec![10, 20]);
        assert_eq!(mapped.total, 5);
        assert_eq!(mapped.total_pages, 3);

        let last = Page::new(vec![5], &PageParams::new(3, 2), 5);
        assert!(!last.has_next);
    }
}
