//! Pagination parameters

use serde::Deserialize;
use utoipa::IntoParams;

use crate::error::{AppError, AppResult};

/// Fixed page size of every list view
pub const PAGE_SIZE: i64 = 10;

/// `?page=N` query parameter
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct PageQuery {
    /// Page number, starting at 1
    pub page: Option<i64>,
}

/// A resolved page within a collection of `total` records
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub number: i64,
    pub total: i64,
    pub num_pages: i64,
}

impl Page {
    /// Resolve the requested page against the collection size.
    ///
    /// An empty collection still has one (empty) first page; any other page
    /// outside `1..=num_pages` is not found.
    pub fn resolve(requested: Option<i64>, total: i64) -> AppResult<Self> {
        let number = requested.unwrap_or(1);
        let num_pages = if total <= 0 {
            1
        } else {
            (total + PAGE_SIZE - 1) / PAGE_SIZE
        };
        if number < 1 || number > num_pages {
            return Err(AppError::NotFound(format!("Invalid page ({})", number)));
        }
        Ok(Self {
            number,
            total: total.max(0),
            num_pages,
        })
    }

    pub fn offset(&self) -> i64 {
        (self.number - 1) * PAGE_SIZE
    }

    pub fn limit(&self) -> i64 {
        PAGE_SIZE
    }

    pub fn has_next(&self) -> bool {
        self.number < self.num_pages
    }

    pub fn has_previous(&self) -> bool {
        self.number > 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_first_page() {
        let page = Page::resolve(None, 25).unwrap();
        assert_eq!(page.number, 1);
        assert_eq!(page.num_pages, 3);
        assert_eq!(page.offset(), 0);
        assert!(page.has_next());
        assert!(!page.has_previous());
    }

    #[test]
    fn last_partial_page() {
        let page = Page::resolve(Some(3), 25).unwrap();
        assert_eq!(page.offset(), 20);
        assert!(!page.has_next());
        assert!(page.has_previous());
    }

    #[test]
    fn exact_multiple_has_no_extra_page() {
        assert_eq!(Page::resolve(None, 20).unwrap().num_pages, 2);
        assert!(Page::resolve(Some(3), 20).is_err());
    }

    #[test]
    fn empty_collection_has_one_empty_page() {
        let page = Page::resolve(Some(1), 0).unwrap();
        assert_eq!(page.num_pages, 1);
        assert!(!page.has_next());
        assert!(!page.has_previous());
    }

    #[test]
    fn out_of_range_pages_are_not_found() {
        assert!(matches!(Page::resolve(Some(0), 5), Err(AppError::NotFound(_))));
        assert!(matches!(Page::resolve(Some(2), 5), Err(AppError::NotFound(_))));
    }
}
