//! Paginator - fixed-size pages over a record sequence
//!
//! Pages are 1-based. Out-of-range pages are empty slices, not errors, and
//! navigation saturates at the first and last page.

use crate::record::Record;
use serde::{Deserialize, Serialize};

/// Default rows per page
pub const DEFAULT_PAGE_SIZE: usize = 25;

/// Page sizes a user may choose from
pub const DEFAULT_PAGE_SIZE_CHOICES: &[usize] = &[10, 25, 50, 100];

/// One page of records plus its metadata
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Page {
    pub records: Vec<Record>,
    pub page: usize,
    pub page_size: usize,
    pub total_pages: usize,
    pub total_records: usize,
}

impl Page {
    /// `"<current> / <total>"`
    pub fn info(&self) -> String {
        format!("{} / {}", self.page, self.total_pages)
    }

    pub fn has_prev(&self) -> bool {
        self.page > 1
    }

    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }
}

/// Number of pages needed for `len` records
pub fn total_pages(len: usize, page_size: usize) -> usize {
    if page_size == 0 {
        return 0;
    }
    len.div_ceil(page_size)
}

/// Slice `records[(page-1)*size .. page*size]`, clamped to the available length.
///
/// Page 0 is treated as page 1; a page size of 0 yields an empty page.
pub fn page(records: &[Record], page_number: usize, page_size: usize) -> Page {
    let page_number = page_number.max(1);
    let start = (page_number - 1).saturating_mul(page_size).min(records.len());
    let end = page_number.saturating_mul(page_size).min(records.len());

    Page {
        records: records[start..end].to_vec(),
        page: page_number,
        page_size,
        total_pages: total_pages(records.len(), page_size),
        total_records: records.len(),
    }
}

/// Current page and page size of the table view
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Paginator {
    current_page: usize,
    page_size: usize,
}

impl Default for Paginator {
    fn default() -> Self {
        Paginator::new(DEFAULT_PAGE_SIZE)
    }
}

impl Paginator {
    /// A paginator on page 1. A page size of 0 is raised to 1.
    pub fn new(page_size: usize) -> Self {
        Paginator {
            current_page: 1,
            page_size: page_size.max(1),
        }
    }

    pub fn current_page(&self) -> usize {
        self.current_page
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Back to page 1 (after a filter, search or data change)
    pub fn reset(&mut self) {
        self.current_page = 1;
    }

    /// Change the page size and return to page 1
    pub fn set_page_size(&mut self, page_size: usize) {
        self.page_size = page_size.max(1);
        self.reset();
    }

    /// Advance one page; no-op at the last page. Returns whether it moved.
    pub fn next_page(&mut self, total_records: usize) -> bool {
        if self.current_page < total_pages(total_records, self.page_size) {
            self.current_page += 1;
            true
        } else {
            false
        }
    }

    /// Go back one page; no-op at page 1. Returns whether it moved.
    pub fn prev_page(&mut self) -> bool {
        if self.current_page > 1 {
            self.current_page -= 1;
            true
        } else {
            false
        }
    }

    /// Jump to `page_number`, clamped to the first and last page.
    /// Returns the page reached.
    pub fn go_to_page(&mut self, page_number: usize, total_records: usize) -> usize {
        let last = total_pages(total_records, self.page_size).max(1);
        self.current_page = page_number.clamp(1, last);
        self.current_page
    }

    /// The current page of `records`
    pub fn page(&self, records: &[Record]) -> Page {
        page(records, self.current_page, self.page_size)
    }
}
