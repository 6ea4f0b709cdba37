//! Offset pagination
//!
//! Pages are addressed as `page × size`; large offsets cost linearly in the
//! store, which is acceptable for the collection sizes this service handles.

use crate::filter::{FindOptions, SortOrder};
use serde::Serialize;

/// Default page size
pub const DEFAULT_PAGE_SIZE: u64 = 10;

/// Largest page a caller may request
pub const MAX_PAGE_SIZE: u64 = 100;

/// Zero-based page number and page size
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    /// Zero-based page number
    pub page: u64,
    /// Items per page, always within `1..=MAX_PAGE_SIZE`
    pub size: u64,
}

impl Pagination {
    /// Build from optional query parameters, applying defaults and clamping
    pub fn new(page: Option<u64>, size: Option<u64>) -> Self {
        Self {
            page: page.unwrap_or(0),
            size: size.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE),
        }
    }

    /// Number of documents to skip
    pub fn offset(&self) -> u64 {
        self.page.saturating_mul(self.size)
    }

    /// Find options selecting this page
    pub fn find_options(&self, order: SortOrder) -> FindOptions {
        FindOptions {
            skip: self.offset(),
            limit: Some(self.size),
            order,
        }
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self::new(None, None)
    }
}

/// A page of results together with the total number of matches
#[derive(Debug, Clone, Serialize)]
pub struct Paged<T> {
    /// Items on this page
    pub items: Vec<T>,
    /// Total number of matching items across all pages
    pub total: u64,
    /// Zero-based page number
    pub page: u64,
    /// Requested page size
    pub size: u64,
}

impl<T> Paged<T> {
    /// Wrap a page of items
    pub fn new(items: Vec<T>, total: u64, pagination: Pagination) -> Self {
        Self {
            items,
            total,
            page: pagination.page,
            size: pagination.size,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let p = Pagination::new(None, None);
        assert_eq!(p.page, 0);
        assert_eq!(p.size, DEFAULT_PAGE_SIZE);
        assert_eq!(p.offset(), 0);
    }

    #[test]
    fn test_offset_is_page_times_size() {
        let p = Pagination::new(Some(3), Some(20));
        assert_eq!(p.offset(), 60);

        let opts = p.find_options(SortOrder::Newest);
        assert_eq!(opts.skip, 60);
        assert_eq!(opts.limit, Some(20));
        assert_eq!(opts.order, SortOrder::Newest);
    }

    #[test]
    fn test_size_is_clamped() {
        assert_eq!(Pagination::new(None, Some(0)).size, 1);
        assert_eq!(Pagination::new(None, Some(10_000)).size, MAX_PAGE_SIZE);
    }

    #[test]
    fn test_offset_saturates() {
        let p = Pagination::new(Some(u64::MAX), Some(100));
        assert_eq!(p.offset(), u64::MAX);
    }
}
