//! Page windows over the post collection.
//!
//! Pages are 1-based. A page past the end is an empty window, never an error.

use serde::Serialize;

use super::DomainError;

pub const DEFAULT_PAGE: i64 = 1;
pub const DEFAULT_PAGE_SIZE: i64 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: i64,
    page_size: i64,
    offset: i64,
}

impl PageRequest {
    pub fn new(page: i64, page_size: i64) -> Result<Self, DomainError> {
        if page < 1 {
            return Err(DomainError::ValidationError(
                "Page must be at least 1".to_string(),
            ));
        }
        if page_size < 1 {
            return Err(DomainError::ValidationError(
                "Limit must be at least 1".to_string(),
            ));
        }

        let offset = (page - 1).checked_mul(page_size).ok_or_else(|| {
            DomainError::ValidationError("Page is out of range".to_string())
        })?;

        Ok(Self {
            page,
            page_size,
            offset,
        })
    }

    pub fn page(&self) -> i64 {
        self.page
    }

    pub fn page_size(&self) -> i64 {
        self.page_size
    }

    /// Number of items to skip before this page starts.
    pub fn offset(&self) -> i64 {
        self.offset
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            page_size: DEFAULT_PAGE_SIZE,
            offset: 0,
        }
    }
}

pub fn total_pages(total_items: i64, page_size: i64) -> i64 {
    if total_items <= 0 || page_size <= 0 {
        return 0;
    }
    (total_items + page_size - 1) / page_size
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageWindow<T> {
    pub page: i64,
    pub page_size: i64,
    pub total_items: i64,
    pub total_pages: i64,
    pub items: Vec<T>,
}

impl<T> PageWindow<T> {
    pub fn new(request: PageRequest, total_items: i64, items: Vec<T>) -> Self {
        Self {
            page: request.page(),
            page_size: request.page_size(),
            total_items,
            total_pages: total_pages(total_items, request.page_size()),
            items,
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> PageWindow<U> {
        PageWindow {
            page: self.page,
            page_size: self.page_size,
            total_items: self.total_items,
            total_pages: self.total_pages,
            items: self.items.into_iter().map(f).collect(),
        }
    }
}
