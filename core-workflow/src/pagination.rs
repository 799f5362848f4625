//! Pagination helper types

use core_runtime::config::DEFAULT_PAGE_SIZE;
use serde::{Deserialize, Serialize};

/// Page position in a paginated listing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    /// Current page number (0-indexed)
    pub page: u32,
    /// Number of items per page
    pub page_size: u32,
}

impl PageRequest {
    /// Create a new page request
    ///
    /// # Examples
    ///
    /// ```
    /// use core_workflow::pagination::PageRequest;
    ///
    /// let request = PageRequest::new(2, 25);
    /// assert_eq!(request.offset(), 50);
    /// assert_eq!(request.limit(), 25);
    /// ```
    pub fn new(page: u32, page_size: u32) -> Self {
        Self { page, page_size }
    }

    /// Page containing `offset`. A zero page size maps to page 0.
    pub fn from_offset(offset: u32, page_size: u32) -> Self {
        let page = if page_size == 0 { 0 } else { offset / page_size };
        Self { page, page_size }
    }

    pub fn offset(&self) -> u32 {
        self.page.saturating_mul(self.page_size)
    }

    pub fn limit(&self) -> u32 {
        self.page_size
    }

    /// Number of pages, or `None` while the total is unknown
    pub fn page_count(&self, total: Option<u64>) -> Option<u32> {
        let total = total?;
        if self.page_size == 0 {
            return Some(0);
        }
        let pages = total.div_ceil(u64::from(self.page_size));
        Some(u32::try_from(pages).unwrap_or(u32::MAX))
    }

    /// False while the total is unknown
    pub fn has_next(&self, total: Option<u64>) -> bool {
        match self.page_count(total) {
            Some(count) => self.page + 1 < count,
            None => false,
        }
    }

    pub fn has_previous(&self) -> bool {
        self.page > 0
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 0,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}
