//! Page-based pagination utilities.

use serde::{Deserialize, Serialize};

/// Default page size when none is requested.
pub const DEFAULT_PER_PAGE: i64 = 20;

/// Upper bound on the page size a client may request.
pub const MAX_PER_PAGE: i64 = 100;

/// Pagination parameters taken from a query string.
///
/// Out-of-range values are clamped rather than rejected: page numbers start
/// at 1 and page sizes are limited to `1..=MAX_PER_PAGE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct PageRequest {
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_per_page")]
    pub per_page: i64,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: default_page(),
            per_page: default_per_page(),
        }
    }
}

impl PageRequest {
    pub fn new(page: i64, per_page: i64) -> Self {
        Self { page, per_page }
    }

    /// Page number after clamping (1-based).
    pub fn page(&self) -> i64 {
        self.page.max(1)
    }

    /// SQL `LIMIT` for this page.
    pub fn limit(&self) -> i64 {
        self.per_page.clamp(1, MAX_PER_PAGE)
    }

    /// SQL `OFFSET` for this page.
    pub fn offset(&self) -> i64 {
        (self.page() - 1) * self.limit()
    }

    /// Builds the response metadata for a result set of `total` rows.
    pub fn meta(&self, total: i64) -> PageMeta {
        let per_page = self.limit();
        let total_pages = if total <= 0 {
            0
        } else {
            (total + per_page - 1) / per_page
        };
        PageMeta {
            page: self.page(),
            per_page,
            total,
            total_pages,
        }
    }
}

/// Pagination info for list responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct PageMeta {
    pub page: i64,
    pub per_page: i64,
    pub total: i64,
    pub total_pages: i64,
}

/// A page of results together with its pagination info.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct Paginated<T> {
    pub data: Vec<T>,
    pub pagination: PageMeta,
}

impl<T> Paginated<T> {
    pub fn new(data: Vec<T>, request: &PageRequest, total: i64) -> Self {
        Self {
            data,
            pagination: request.meta(total),
        }
    }
}

fn default_page() -> i64 {
    1
}

fn default_per_page() -> i64 {
    DEFAULT_PER_PAGE
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let req: PageRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(req.page, 1);
        assert_eq!(req.per_page, DEFAULT_PER_PAGE);
        assert_eq!(req, PageRequest::default());
    }

    #[test]
    fn test_limit_and_offset() {
        let req = PageRequest::new(3, 25);
        assert_eq!(req.limit(), 25);
        assert_eq!(req.offset(), 50);
    }

    #[test]
    fn test_clamps_out_of_range_values() {
        let req = PageRequest::new(0, 10_000);
        assert_eq!(req.page(), 1);
        assert_eq!(req.limit(), MAX_PER_PAGE);
        assert_eq!(req.offset(), 0);

        let req = PageRequest::new(-4, 0);
        assert_eq!(req.page(), 1);
        assert_eq!(req.limit(), 1);
    }

    #[test]
    fn test_meta_total_pages() {
        let req = PageRequest::new(1, 20);
        assert_eq!(req.meta(0).total_pages, 0);
        assert_eq!(req.meta(1).total_pages, 1);
        assert_eq!(req.meta(20).total_pages, 1);
        assert_eq!(req.meta(21).total_pages, 2);
    }

    #[test]
    fn test_paginated_serialization() {
        let req = PageRequest::new(2, 5);
        let page = Paginated::new(vec!["a", "b"], &req, 7);
        let json = serde_json::to_value(&page).unwrap();
        assert_eq!(json["data"].as_array().unwrap().len(), 2);
        assert_eq!(json["pagination"]["page"], 2);
        assert_eq!(json["pagination"]["total"], 7);
        assert_eq!(json["pagination"]["total_pages"], 2);
    }
}
