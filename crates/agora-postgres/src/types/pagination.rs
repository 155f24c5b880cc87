//! Offset-based pagination for feed queries.

use serde::{Deserialize, Serialize};

use super::constants::post::FEED_PAGE_SIZE;

/// Maximum number of items per page.
pub const MAX_LIMIT: i64 = 100;

/// Offset-based pagination parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OffsetPagination {
    /// Maximum number of records to return.
    pub limit: i64,
    /// Number of records to skip.
    pub offset: i64,
}

impl OffsetPagination {
    /// Creates a new pagination instance, clamping both values into range.
    pub fn new(limit: i64, offset: i64) -> Self {
        Self {
            limit: limit.clamp(1, MAX_LIMIT),
            offset: offset.max(0),
        }
    }

    /// Returns the pagination for the page that follows this one.
    pub fn next_page(&self) -> Self {
        Self {
            limit: self.limit,
            offset: self.offset.saturating_add(self.limit),
        }
    }
}

impl Default for OffsetPagination {
    fn default() -> Self {
        Self::new(FEED_PAGE_SIZE, 0)
    }
}

/// One page of results.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OffsetPage<T> {
    /// The items in this page.
    pub items: Vec<T>,
    /// The pagination that produced this page.
    pub pagination: OffsetPagination,
}

impl<T> OffsetPage<T> {
    /// Creates a new page.
    pub fn new(items: Vec<T>, pagination: OffsetPagination) -> Self {
        Self { items, pagination }
    }

    /// Returns whether a following page may exist.
    ///
    /// A page shorter than its limit is the last one.
    pub fn has_more(&self) -> bool {
        self.items.len() as i64 >= self.pagination.limit
    }

    /// Maps the items to a different type.
    pub fn map<U, F>(self, f: F) -> OffsetPage<U>
    where
        F: FnMut(T) -> U,
    {
        OffsetPage {
            items: self.items.into_iter().map(f).collect(),
            pagination: self.pagination,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pagination_clamping() {
        let pagination = OffsetPagination::new(0, -5);
        assert_eq!(pagination.limit, 1);
        assert_eq!(pagination.offset, 0);

        let pagination = OffsetPagination::new(10_000, 20);
        assert_eq!(pagination.limit, MAX_LIMIT);
        assert_eq!(pagination.offset, 20);
    }

    #[test]
    fn test_next_page() {
        let first = OffsetPagination::default();
        assert_eq!(first, OffsetPagination::new(10, 0));
        assert_eq!(first.next_page(), OffsetPagination::new(10, 10));
    }

    #[test]
    fn test_short_page_is_last() {
        let pagination = OffsetPagination::new(3, 0);
        assert!(OffsetPage::new(vec![1, 2, 3], pagination).has_more());
        assert!(!OffsetPage::new(vec![1, 2], pagination).has_more());
        assert!(!OffsetPage::<i32>::new(vec![], pagination).has_more());
    }
}
