use crate::clause::OrderRequest;
use crate::config::RepoConfig;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Listing parameters for [`Repository::all`](super::Repository::all) and
/// [`Repository::filter`](super::Repository::filter).
///
/// Deserializes straight from a request body such as
/// `{"filter": {"status": "active"}, "search": {"username": "jo"}, "order": {"field": "id", "method": "desc"}, "page": 2}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ListQuery {
    /// Exact/range/membership predicates, AND-combined.
    pub filter: Option<Value>,
    /// Substring predicates, OR-combined.
    pub search: Option<Value>,
    pub order: Option<OrderRequest>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

impl ListQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter(mut self, filter: Value) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn search(mut self, search: Value) -> Self {
        self.search = Some(search);
        self
    }

    pub fn order(mut self, order: OrderRequest) -> Self {
        self.order = Some(order);
        self
    }

    pub fn page(mut self, page: i64) -> Self {
        self.page = Some(page);
        self
    }

    pub fn limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// A clamped page window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: i64,
    pub limit: i64,
}

impl Pagination {
    /// `limit` clamps to `[1, max_page_size]`, `page` to at least 1.
    pub fn new(page: Option<i64>, limit: Option<i64>, config: &RepoConfig) -> Self {
        let max = config.max_page_size.max(1);
        Self {
            page: page.unwrap_or(1).max(1),
            limit: limit.unwrap_or(config.default_page_size).clamp(1, max),
        }
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.limit)
    }
}

/// One page of results.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageResult<T> {
    /// Rows matching the query across all pages; `None` when the page came back empty.
    pub total: Option<i64>,
    pub items: Vec<T>,
}

impl<T> Default for PageResult<T> {
    fn default() -> Self {
        Self {
            total: None,
            items: Vec::new(),
        }
    }
}

impl<T> PageResult<T> {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> PageResult<U> {
        PageResult {
            total: self.total,
            items: self.items.into_iter().map(f).collect(),
        }
    }
}
