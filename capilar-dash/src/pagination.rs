//! Pagination utilities for list endpoints (100 rows/page)

use serde::Deserialize;

/// Page size constant for all pagination
pub const PAGE_SIZE: i64 = 100;

/// `?page=N` query parameter (1-indexed)
#[derive(Debug, Deserialize)]
pub struct PageQuery {
    #[serde(default = "default_page")]
    pub page: i64,
}

fn default_page() -> i64 {
    1
}

/// Pagination metadata calculated from total results
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    /// Current page number (1-indexed)
    pub page: i64,
    /// Total number of pages
    pub total_pages: i64,
    /// Index of the first row on this page
    pub offset: i64,
}

impl Pagination {
    /// Rows of `items` that fall on this page
    pub fn slice<'a, T>(&self, items: &'a [T]) -> &'a [T] {
        let start = (self.offset as usize).min(items.len());
        let end = (start + PAGE_SIZE as usize).min(items.len());
        &items[start..end]
    }
}

/// Calculate pagination metadata from total results and requested page
///
/// Ensures page is within valid bounds [1, total_pages]
///
/// # Examples
/// ```
/// use capilar_dash::pagination::calculate_pagination;
///
/// // 250 total results = 3 pages (100 + 100 + 50)
/// let p = calculate_pagination(250, 2);
/// assert_eq!(p.page, 2);
/// assert_eq!(p.total_pages, 3);
/// assert_eq!(p.offset, 100);
///
/// // Requesting out-of-bounds page gets clamped
/// let p = calculate_pagination(250, 99);
/// assert_eq!(p.page, 3);
/// assert_eq!(p.offset, 200);
/// ```
pub fn calculate_pagination(total_results: i64, requested_page: i64) -> Pagination {
    let total_pages = (total_results + PAGE_SIZE - 1) / PAGE_SIZE;
    let page = requested_page.max(1).min(total_pages.max(1));
    let offset = (page - 1) * PAGE_SIZE;

    Pagination {
        page,
        total_pages,
        offset,
    }
}
