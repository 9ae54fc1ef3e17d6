//! Pagination contract shared by every list endpoint.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};

/// Largest page size the backend accepts.
pub const MAX_LIMIT: u32 = 100;

/// Page size used when a view does not ask for one.
pub const DEFAULT_LIMIT: u32 = 10;

/// Name of the query parameter carrying the page size.
///
/// Most endpoints read `limit`; a few older ones read `perPage`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum SizeParam {
    #[default]
    Limit,
    PerPage,
}

impl SizeParam {
    pub fn as_str(&self) -> &'static str {
        match self {
            SizeParam::Limit => "limit",
            SizeParam::PerPage => "perPage",
        }
    }
}

/// Validated list query: page, page size and free-form filters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageQuery {
    page: u32,
    limit: u32,
    filters: BTreeMap<String, String>,
}

impl PageQuery {
    /// Build a query, rejecting pages below 1 and sizes outside `1..=MAX_LIMIT`.
    pub fn new(page: u32, limit: u32) -> DomainResult<Self> {
        if page == 0 {
            return Err(DomainError::validation("page must be at least 1"));
        }
        if limit == 0 || limit > MAX_LIMIT {
            return Err(DomainError::validation(format!(
                "limit must be between 1 and {MAX_LIMIT}"
            )));
        }
        Ok(Self {
            page,
            limit,
            filters: BTreeMap::new(),
        })
    }

    /// Add a filter. Blank values are dropped rather than sent as `key=`.
    pub fn with_filter(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let value = value.into();
        if !value.trim().is_empty() {
            self.filters.insert(key.into(), value);
        }
        self
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    pub fn filters(&self) -> &BTreeMap<String, String> {
        &self.filters
    }

    /// Query pairs in wire order: `page`, the size parameter, then filters by key.
    pub fn to_pairs(&self, size: SizeParam) -> Vec<(String, String)> {
        let mut pairs = Vec::with_capacity(2 + self.filters.len());
        pairs.push(("page".to_string(), self.page.to_string()));
        pairs.push((size.as_str().to_string(), self.limit.to_string()));
        pairs.extend(self.filters.iter().map(|(k, v)| (k.clone(), v.clone())));
        pairs
    }
}

impl Default for PageQuery {
    fn default() -> Self {
        Self {
            page: 1,
            limit: DEFAULT_LIMIT,
            filters: BTreeMap::new(),
        }
    }
}

/// One page of a collection as returned by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    /// Rows of this page. Older endpoints call it `items`.
    #[serde(alias = "items")]
    pub data: Vec<T>,
    /// Row count across all pages.
    #[serde(default)]
    pub total: u64,
    /// 1-based page number.
    #[serde(default)]
    pub page: u32,
    /// Page size the backend applied (`perPage` on older endpoints).
    #[serde(default, alias = "perPage")]
    pub limit: u32,
}

impl<T> Page<T> {
    /// Number of pages at this page size; `0` when the size is unknown.
    pub fn total_pages(&self) -> u64 {
        if self.limit == 0 {
            return 0;
        }
        self.total.div_ceil(u64::from(self.limit))
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}
