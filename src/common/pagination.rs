// src/common/pagination.rs

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

pub const DEFAULT_PAGE_SIZE: i64 = 10;
pub const MAX_PAGE_SIZE: i64 = 100;

/// Normalised page window; `page` is 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub page: i64,
    pub limit: i64,
}

impl PageWindow {
    pub fn new(page: Option<i64>, limit: Option<i64>) -> Self {
        let page = page.unwrap_or(1).max(1);
        let limit = limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
        Self { page, limit }
    }

    /// Saturates instead of overflowing; a page past the end is just empty.
    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.limit)
    }

    pub fn total_pages(&self, total: i64) -> i64 {
        if total <= 0 {
            0
        } else {
            (total + self.limit - 1) / self.limit
        }
    }
}

// Shared filters for the list endpoints. Not every resource uses every filter.
#[derive(Debug, Default, Clone, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListQuery {
    /// 1-based page number (default 1)
    pub page: Option<i64>,
    /// Page size (default 10, max 100)
    pub limit: Option<i64>,
    /// Case-insensitive substring filter
    pub search: Option<String>,
    pub category: Option<String>,
    pub status: Option<String>,
}

impl ListQuery {
    pub fn window(&self) -> PageWindow {
        PageWindow::new(self.page, self.limit)
    }

    pub fn search_pattern(&self) -> Option<String> {
        like_pattern(self.search.as_deref())
    }

    pub fn category(&self) -> Option<&str> {
        non_empty(self.category.as_deref())
    }

    pub fn status(&self) -> Option<&str> {
        non_empty(self.status.as_deref())
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Paginated<T> {
    pub data: Vec<T>,
    pub total: i64,
    pub page: i64,
    pub limit: i64,
    pub total_pages: i64,
}

impl<T> Paginated<T> {
    pub fn new(data: Vec<T>, total: i64, window: PageWindow) -> Self {
        Self {
            data,
            total,
            page: window.page,
            limit: window.limit,
            total_pages: window.total_pages(total),
        }
    }

    pub fn map<U, F>(self, f: F) -> Paginated<U>
    where
        F: FnMut(T) -> U,
    {
        Paginated {
            data: self.data.into_iter().map(f).collect(),
            total: self.total,
            page: self.page,
            limit: self.limit,
            total_pages: self.total_pages,
        }
    }
}

pub(crate) fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// `ILIKE` pattern for a user supplied substring, with wildcards escaped.
pub(crate) fn like_pattern(search: Option<&str>) -> Option<String> {
    non_empty(search).map(|s| {
        let escaped = s
            .replace('\\', "\\\\")
            .replace('%', "\\%")
            .replace('_', "\\_");
        format!("%{escaped}%")
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_page_of_five_starts_at_row_six() {
        let window = PageWindow::new(Some(2), Some(5));
        assert_eq!(window.offset(), 5);
        assert_eq!(window.total_pages(12), 3);
        assert_eq!(window.total_pages(10), 2);
        assert_eq!(window.total_pages(0), 0);
    }

    #[test]
    fn window_defaults_and_clamps() {
        assert_eq!(PageWindow::new(None, None), PageWindow { page: 1, limit: DEFAULT_PAGE_SIZE });
        assert_eq!(PageWindow::new(Some(-3), Some(0)), PageWindow { page: 1, limit: 1 });
        assert_eq!(PageWindow::new(Some(1), Some(5_000)).limit, MAX_PAGE_SIZE);
    }

    #[test]
    fn huge_page_number_saturates_offset() {
        let window = PageWindow::new(Some(i64::MAX), Some(MAX_PAGE_SIZE));
        assert_eq!(window.page, i64::MAX);
        assert_eq!(window.offset(), i64::MAX);
        assert_eq!(window.total_pages(3), 1);
    }

    #[test]
    fn search_pattern_escapes_wildcards() {
        assert_eq!(like_pattern(Some("50%_off")).as_deref(), Some("%50\\%\\_off%"));
        assert_eq!(like_pattern(Some("   ")), None);
        assert_eq!(like_pattern(None), None);
    }

    #[test]
    fn paginated_carries_page_info_through_map() {
        let page = Paginated::new(vec![1, 2, 3], 13, PageWindow::new(Some(3), Some(5)));
        let mapped = page.map(|n| n * 10);
        assert_eq!(mapped.data, vec![10, 20, 30]);
        assert_eq!(mapped.total_pages, 3);
        assert_eq!(mapped.page, 3);
    }
}
