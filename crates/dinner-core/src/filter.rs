//! # Query Filter & Filtered Results
//!
//! The pagination protocol shared by every list operation.
//!
//! ## Filter → SQL
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  QueryFilter                         SQL parameter                      │
//! │  ───────────                         ─────────────                      │
//! │  created_after   ──────────────────► $1  (lower bound, exclusive)       │
//! │  created_before  ──────────────────► $2  (upper bound, exclusive)       │
//! │  updated_after   ──────────────────► $3                                 │
//! │  updated_before  ──────────────────► $4                                 │
//! │  include_archived ─────────────────► $5                                 │
//! │  (page - 1) * limit ───────────────► $6  OFFSET                         │
//! │  limit ────────────────────────────► $7  LIMIT                          │
//! │                                                                         │
//! │  Missing bounds become NOW() ± 999 years on the SQL side.               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Default page size when the caller does not choose one.
pub const DEFAULT_QUERY_FILTER_LIMIT: u8 = 20;

/// Largest page size the store will return.
pub const MAX_QUERY_FILTER_LIMIT: u8 = 250;

// =============================================================================
// Query Filter
// =============================================================================

/// Filter applied to list operations.
///
/// Every field is optional. [`QueryFilter::default`] is the filter a list
/// method uses when the caller passes none: page 1, 20 rows, no windows,
/// archived rows excluded.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct QueryFilter {
    pub page: Option<u16>,
    pub limit: Option<u8>,
    pub created_after: Option<DateTime<Utc>>,
    pub created_before: Option<DateTime<Utc>>,
    pub updated_after: Option<DateTime<Utc>>,
    pub updated_before: Option<DateTime<Utc>>,
    pub include_archived: Option<bool>,
}

impl QueryFilter {
    /// A filter asking for one specific page.
    pub fn page(page: u16, limit: u8) -> Self {
        QueryFilter {
            page: Some(page),
            limit: Some(limit),
            ..Default::default()
        }
    }

    /// Sets whether archived rows are included.
    pub fn with_archived(mut self, include: bool) -> Self {
        self.include_archived = Some(include);
        self
    }

    /// The effective page (1-based). Zero is treated as the first page.
    pub fn effective_page(&self) -> u16 {
        self.page.unwrap_or(1).max(1)
    }

    /// The effective limit, clamped to `1..=250`.
    pub fn effective_limit(&self) -> u8 {
        self.limit
            .unwrap_or(DEFAULT_QUERY_FILTER_LIMIT)
            .clamp(1, MAX_QUERY_FILTER_LIMIT)
    }

    /// Row offset derived from page and limit.
    pub fn query_offset(&self) -> i32 {
        (i32::from(self.effective_page()) - 1) * i32::from(self.effective_limit())
    }

    pub fn query_limit(&self) -> i32 {
        i32::from(self.effective_limit())
    }

    pub fn includes_archived(&self) -> bool {
        self.include_archived.unwrap_or(false)
    }

    /// The pagination block echoed back in a [`QueryFilteredResult`].
    pub fn pagination(&self) -> Pagination {
        Pagination {
            page: self.effective_page(),
            limit: self.effective_limit(),
            filtered_count: 0,
            total_count: 0,
        }
    }
}

// =============================================================================
// Filtered Result
// =============================================================================

/// Paging metadata returned alongside list data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Pagination {
    pub page: u16,
    pub limit: u8,
    /// Rows matching every predicate, ignoring offset/limit.
    pub filtered_count: u64,
    /// Rows in the owner's partition (archived ones only when requested).
    pub total_count: u64,
}

/// The envelope every list operation returns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryFilteredResult<T> {
    pub data: Vec<T>,
    pub pagination: Pagination,
}

impl<T> QueryFilteredResult<T> {
    /// An empty page for the given filter.
    pub fn empty(filter: &QueryFilter) -> Self {
        QueryFilteredResult {
            data: Vec::new(),
            pagination: filter.pagination(),
        }
    }

    pub fn filtered_count(&self) -> u64 {
        self.pagination.filtered_count
    }

    pub fn total_count(&self) -> u64 {
        self.pagination.total_count
    }

    /// Maps the data while keeping the paging metadata.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> QueryFilteredResult<U> {
        QueryFilteredResult {
            data: self.data.into_iter().map(f).collect(),
            pagination: self.pagination,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let filter = QueryFilter::default();
        assert_eq!(filter.effective_page(), 1);
        assert_eq!(filter.effective_limit(), 20);
        assert_eq!(filter.query_offset(), 0);
        assert!(!filter.includes_archived());
    }

    #[test]
    fn test_offset_from_page() {
        let filter = QueryFilter::page(3, 10);
        assert_eq!(filter.query_offset(), 20);
        assert_eq!(filter.query_limit(), 10);
    }

    #[test]
    fn test_limit_is_clamped() {
        assert_eq!(QueryFilter::page(1, 0).effective_limit(), 1);
        assert_eq!(QueryFilter::page(1, 255).effective_limit(), 250);
        assert_eq!(QueryFilter::page(0, 10).effective_page(), 1);
    }

    #[test]
    fn test_pagination_echo() {
        let filter = QueryFilter::page(2, 50).with_archived(true);
        let result: QueryFilteredResult<u8> = QueryFilteredResult::empty(&filter);
        assert_eq!(result.pagination.page, 2);
        assert_eq!(result.pagination.limit, 50);
        assert_eq!(result.total_count(), 0);
        assert!(filter.includes_archived());
    }
}
