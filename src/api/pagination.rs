use serde::{Deserialize, Serialize};

use crate::config;

/// `?page=&limit=` query parameters. Missing or out-of-range values are clamped, never rejected.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PaginationQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

/// Resolved page window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub page: i64,
    pub limit: i64,
}

impl PaginationQuery {
    pub fn resolve(&self) -> Page {
        let api = &config::config().api;
        Page::new(self.page, self.limit, api.default_page_size, api.max_page_size)
    }
}

impl Page {
    pub fn new(page: Option<i64>, limit: Option<i64>, default_limit: i64, max_limit: i64) -> Self {
        let page = page.unwrap_or(1).max(1);
        let limit = limit.unwrap_or(default_limit).clamp(1, max_limit.max(1));
        Self { page, limit }
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.limit)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PaginationInfo {
    pub page: i64,
    pub limit: i64,
    pub total: i64,
    pub total_pages: i64,
}

/// List response: `{ items, pagination }`
#[derive(Debug, Clone, Serialize)]
pub struct Paginated<T: Serialize> {
    pub items: Vec<T>,
    pub pagination: PaginationInfo,
}

impl<T: Serialize> Paginated<T> {
    pub fn new(items: Vec<T>, page: Page, total: i64) -> Self {
        let total_pages = if total <= 0 { 0 } else { (total + page.limit - 1) / page.limit };
        Self {
            items,
            pagination: PaginationInfo {
                page: page.page,
                limit: page.limit,
                total,
                total_pages,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_and_clamping() {
        let p = Page::new(None, None, 10, 100);
        assert_eq!(p, Page { page: 1, limit: 10 });
        assert_eq!(p.offset(), 0);

        let p = Page::new(Some(0), Some(1000), 10, 100);
        assert_eq!(p, Page { page: 1, limit: 100 });

        let p = Page::new(Some(3), Some(-5), 10, 100);
        assert_eq!(p, Page { page: 3, limit: 1 });
        assert_eq!(p.offset(), 2);
    }

    #[test]
    fn total_pages_rounds_up() {
        let page = Page::new(Some(2), Some(10), 10, 100);
        let paged = Paginated::new(vec![1, 2, 3], page, 21);
        assert_eq!(paged.pagination.total_pages, 3);
        assert_eq!(paged.pagination.page, 2);

        let empty: Paginated<i32> = Paginated::new(vec![], page, 0);
        assert_eq!(empty.pagination.total_pages, 0);
    }

    #[test]
    fn serializes_items_and_pagination() {
        let page = Page::new(None, Some(2), 10, 100);
        let value = serde_json::to_value(Paginated::new(vec!["a", "b"], page, 5)).unwrap();
        assert_eq!(value["items"], serde_json::json!(["a", "b"]));
        assert_eq!(value["pagination"]["total_pages"], 3);
    }
}
