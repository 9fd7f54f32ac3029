//! Pagination math.
//!
//! A `PageInfo` is computed from (page, per_page, total). The total comes
//! from a count query that must share the data query's predicate; the math
//! here is pure and store-independent.

use serde::{Deserialize, Serialize};

/// Pagination metadata for one result page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageInfo {
    pub page: i64,
    pub per_page: i64,
    pub total: i64,
    pub pages: i64,
    pub has_prev: bool,
    pub has_next: bool,
}

impl PageInfo {
    /// Compute pagination metadata.
    ///
    /// `pages` is `ceil(total / per_page)`, 0 when `total` is 0. A `page`
    /// beyond `pages` is not an error; it simply has no next page and the
    /// caller gets an empty data slice.
    ///
    /// Callers validate `page >= 1` and `per_page >= 1` before reaching
    /// this point.
    pub fn compute(page: i64, per_page: i64, total: i64) -> Self {
        let pages = if total == 0 {
            0
        } else {
            (total + per_page - 1) / per_page
        };
        Self {
            page,
            per_page,
            total,
            pages,
            has_prev: page > 1,
            has_next: page < pages,
        }
    }

    /// Row offset of this page's first element.
    pub fn offset(&self) -> i64 {
        (self.page - 1) * self.per_page
    }
}
