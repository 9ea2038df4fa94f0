//! # Pagination
//!
//! Page/offset math for sale listings.
//!
//! ## Rules
//! - `pageSize` falls back to [`DEFAULT_PAGE_SIZE`] when absent or not positive,
//!   and is clamped to [`MAX_PAGE_SIZE`]
//! - `page` falls back to 1 when absent or not positive
//! - the offset is only applied when the caller sent BOTH a usable page
//!   and a usable pageSize; otherwise listing starts at the first row

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};

/// A normalized page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    current_page: i64,
    page_size: i64,
    offset: i64,
}

impl PageRequest {
    /// Normalizes raw query parameters.
    ///
    /// ## Example
    /// ```rust
    /// use salon_core::PageRequest;
    ///
    /// let req = PageRequest::new(Some(3), Some(20));
    /// assert_eq!((req.limit(), req.offset()), (20, 40));
    ///
    /// // page without pageSize: default size, no offset
    /// let req = PageRequest::new(Some(3), None);
    /// assert_eq!((req.limit(), req.offset()), (20, 0));
    /// ```
    pub fn new(page: Option<i64>, page_size: Option<i64>) -> Self {
        let page = page.filter(|p| *p > 0);
        let page_size = page_size.filter(|s| *s > 0).map(|s| s.min(MAX_PAGE_SIZE));

        let offset = match (page, page_size) {
            (Some(p), Some(s)) => (p - 1).saturating_mul(s),
            _ => 0,
        };

        Self {
            current_page: page.unwrap_or(1),
            page_size: page_size.unwrap_or(DEFAULT_PAGE_SIZE),
            offset,
        }
    }

    pub fn limit(&self) -> i64 {
        self.page_size
    }

    pub fn offset(&self) -> i64 {
        self.offset
    }

    pub fn current_page(&self) -> i64 {
        self.current_page
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(None, None)
    }
}

/// Pagination metadata returned next to a page of rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Pagination {
    pub total_count: i64,
    pub total_pages: i64,
    pub current_page: i64,
    pub page_size: i64,
}

impl Pagination {
    pub fn new(total_count: i64, request: &PageRequest) -> Self {
        let page_size = request.limit();
        Self {
            total_count,
            total_pages: total_count / page_size + i64::from(total_count % page_size != 0),
            current_page: request.current_page(),
            page_size,
        }
    }
}
