//! Pagination parameters for list endpoints

use crate::error::{PaginationInfo, ResponseMetadata};
use serde::Deserialize;

/// Standard pagination parameters for list endpoints
#[derive(Debug, Deserialize, Clone, Default)]
pub struct PaginationParams {
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

impl PaginationParams {
    /// Page number, defaults to 1, minimum 1
    pub fn page(&self) -> u32 {
        self.page.unwrap_or(1).max(1)
    }

    /// Page size, defaults to 20, clamped to 1..=100
    pub fn page_size(&self) -> u32 {
        self.page_size.unwrap_or(20).clamp(1, 100)
    }

    pub fn offset(&self) -> usize {
        ((self.page() - 1) as usize) * (self.page_size() as usize)
    }

    pub fn total_pages(&self, total_count: usize) -> u32 {
        if total_count == 0 {
            return 1;
        }
        let page_size = self.page_size() as usize;
        u32::try_from(total_count.div_ceil(page_size)).unwrap_or(u32::MAX)
    }

    /// Slice one page out of an already ordered list
    pub fn paginate<T>(&self, items: Vec<T>) -> Vec<T> {
        items
            .into_iter()
            .skip(self.offset())
            .take(self.page_size() as usize)
            .collect()
    }

    /// Create response metadata with pagination info
    pub fn to_metadata(&self, total_count: usize) -> ResponseMetadata {
        let total_pages = self.total_pages(total_count);

        ResponseMetadata {
            pagination: Some(PaginationInfo {
                page: self.page(),
                page_size: self.page_size(),
                total_pages,
                has_next: self.page() < total_pages,
                has_previous: self.page() > 1,
            }),
            total_count: Some(total_count as u64),
        }
    }
}
