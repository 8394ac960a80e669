//! Page slicing with pagination metadata.

use serde::{Deserialize, Serialize};

use crate::error::{DarshanError, Result};

/// Pagination metadata for one page of a collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginationState {
    pub current_page: u32,
    pub page_size: u32,
    pub total_items: u64,
    pub total_pages: u32,
    pub has_next: bool,
    pub has_previous: bool,
}

impl PaginationState {
    /// Build metadata for `current_page`; `page_size` must be non-zero.
    pub fn new(current_page: u32, page_size: u32, total_items: u64) -> Result<Self> {
        if page_size == 0 {
            return Err(DarshanError::InvalidArgument(
                "page size must be at least 1".to_string(),
            ));
        }
        let total_pages = total_pages(total_items, page_size);
        Ok(Self {
            current_page,
            page_size,
            total_items,
            total_pages,
            has_next: current_page < total_pages,
            has_previous: current_page > 1,
        })
    }

    /// Clamp a requested page into `[1, max(total_pages, 1)]`
    pub fn clamp_page(&self, page: u32) -> u32 {
        page.clamp(1, self.total_pages.max(1))
    }
}

/// `ceil(total_items / page_size)`, saturating at `u32::MAX`
pub fn total_pages(total_items: u64, page_size: u32) -> u32 {
    if page_size == 0 {
        return 0;
    }
    let pages = total_items.div_ceil(u64::from(page_size));
    u32::try_from(pages).unwrap_or(u32::MAX)
}

/// A page of records plus its metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub pagination: PaginationState,
}

impl<T> Page<T> {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Slice `items` into page `page` (1-based) of `page_size` records.
///
/// A page past the end yields an empty slice while the metadata still
/// describes the whole collection. Page 0 is read as page 1.
pub fn paginate<T: Clone>(items: &[T], page: u32, page_size: u32) -> Result<Page<T>> {
    let page = page.max(1);
    let pagination = PaginationState::new(page, page_size, items.len() as u64)?;

    let start = (page as usize - 1).saturating_mul(page_size as usize);
    let page_items = if start >= items.len() {
        Vec::new()
    } else {
        let end = start.saturating_add(page_size as usize).min(items.len());
        items[start..end].to_vec()
    };

    Ok(Page {
        items: page_items,
        pagination,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_page() {
        let items: Vec<u32> = (1..=10).collect();
        let page = paginate(&items, 1, 4).unwrap();
        assert_eq!(page.items, vec![1, 2, 3, 4]);
        assert_eq!(page.pagination.total_pages, 3);
        assert!(page.pagination.has_next);
        assert!(!page.pagination.has_previous);
    }

    #[test]
    fn test_last_partial_page() {
        let items: Vec<u32> = (1..=10).collect();
        let page = paginate(&items, 3, 4).unwrap();
        assert_eq!(page.items, vec![9, 10]);
        assert!(!page.pagination.has_next);
        assert!(page.pagination.has_previous);
    }

    #[test]
    fn test_page_past_end_is_empty_with_metadata() {
        let items: Vec<u32> = (1..=10).collect();
        let page = paginate(&items, 7, 4).unwrap();
        assert!(page.is_empty());
        assert_eq!(page.pagination.current_page, 7);
        assert_eq!(page.pagination.total_pages, 3);
        assert_eq!(page.pagination.total_items, 10);
        assert!(!page.pagination.has_next);
        assert!(page.pagination.has_previous);
    }

    #[test]
    fn test_page_zero_reads_as_first() {
        let items: Vec<u32> = (1..=3).collect();
        let page = paginate(&items, 0, 2).unwrap();
        assert_eq!(page.items, vec![1, 2]);
        assert_eq!(page.pagination.current_page, 1);
    }

    #[test]
    fn test_zero_page_size_is_invalid() {
        let items: Vec<u32> = (1..=3).collect();
        let err = paginate(&items, 1, 0).unwrap_err();
        assert!(matches!(err, DarshanError::InvalidArgument(_)));
    }

    #[test]
    fn test_empty_collection() {
        let items: Vec<u32> = vec![];
        let page = paginate(&items, 1, 5).unwrap();
        assert!(page.is_empty());
        assert_eq!(page.pagination.total_pages, 0);
        assert!(!page.pagination.has_next);
        assert!(!page.pagination.has_previous);
    }

    #[test]
    fn test_pages_reconstruct_collection() {
        let items: Vec<u32> = (1..=23).collect();
        for page_size in 1..=25 {
            let total = total_pages(items.len() as u64, page_size);
            let mut rebuilt = Vec::new();
            for page in 1..=total {
                rebuilt.extend(paginate(&items, page, page_size).unwrap().items);
            }
            assert_eq!(rebuilt, items, "page size {page_size}");
        }
    }

    #[test]
    fn test_clamp_page() {
        let state = PaginationState::new(1, 10, 35).unwrap();
        assert_eq!(state.clamp_page(0), 1);
        assert_eq!(state.clamp_page(3), 3);
        assert_eq!(state.clamp_page(9), 4);

        let empty = PaginationState::new(1, 10, 0).unwrap();
        assert_eq!(empty.clamp_page(5), 1);
    }
}
