//! Pagination helpers
//!
//! Page/limit parsing with the storefront caps (limit 1..=50, default 10)
//! and the envelope returned by list endpoints.

use serde::{Deserialize, Serialize};

const DEFAULT_LIMIT: i64 = 10;
const MAX_LIMIT: i64 = 50;

/// Raw query parameters accepted by paginated list endpoints
#[derive(Debug, Default, Clone, Deserialize)]
pub struct PageQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

/// Parsed pagination window
#[derive(Debug, Clone, Copy)]
pub struct Pagination {
    pub page: i64,
    pub limit: i64,
    pub start: i64,
}

impl Pagination {
    pub fn parse(query: &PageQuery) -> Self {
        let page = query.page.unwrap_or(1).max(1);
        let limit = query.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
        Self {
            page,
            limit,
            start: (page - 1) * limit,
        }
    }
}

/// Paginated response envelope
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Paginated<T> {
    pub items: Vec<T>,
    pub page: i64,
    pub limit: i64,
    pub total: i64,
    pub total_pages: i64,
    pub has_next_page: bool,
    pub has_prev_page: bool,
}

impl<T> Paginated<T> {
    pub fn new(items: Vec<T>, page: &Pagination, total: i64) -> Self {
        let total_pages = if total == 0 {
            0
        } else {
            (total + page.limit - 1) / page.limit
        };
        Self {
            items,
            page: page.page,
            limit: page.limit,
            total,
            total_pages,
            has_next_page: page.page < total_pages,
            has_prev_page: page.page > 1,
        }
    }

    /// Empty page (e.g. filtering on an unknown category slug)
    pub fn empty(page: &Pagination) -> Self {
        Self::new(Vec::new(), page, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn q(page: Option<i64>, limit: Option<i64>) -> PageQuery {
        PageQuery { page, limit }
    }

    #[test]
    fn defaults() {
        let p = Pagination::parse(&q(None, None));
        assert_eq!((p.page, p.limit, p.start), (1, 10, 0));
    }

    #[test]
    fn limit_is_capped_at_fifty() {
        let p = Pagination::parse(&q(Some(2), Some(500)));
        assert_eq!((p.page, p.limit, p.start), (2, 50, 50));
    }

    #[test]
    fn page_floor_is_one() {
        let p = Pagination::parse(&q(Some(0), Some(0)));
        assert_eq!((p.page, p.limit, p.start), (1, 1, 0));
    }

    #[test]
    fn envelope_math() {
        let p = Pagination::parse(&q(Some(2), Some(10)));
        let out = Paginated::new(vec![1, 2, 3], &p, 23);
        assert_eq!(out.total_pages, 3);
        assert!(out.has_next_page);
        assert!(out.has_prev_page);

        let empty: Paginated<i32> = Paginated::empty(&p);
        assert_eq!(empty.total_pages, 0);
        assert!(!empty.has_next_page);
    }
}
