//! Page Slicing
//!
//! Maps a record count, a page size and an untrusted page request onto a
//! clamped page index and slice bounds. Out-of-range requests are clamped,
//! never rejected.

use serde::{Deserialize, Serialize};

/// A caller-supplied page request (1-indexed, untrusted)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    /// Requested page, before clamping
    pub requested_page: i64,
}

impl PageRequest {
    /// Build a request for an explicit page number
    pub fn new(requested_page: i64) -> Self {
        Self { requested_page }
    }

    /// Parse a raw `page` query value
    ///
    /// Missing, blank, unparseable and non-finite values all become page 1.
    /// Finite numbers (including decimals and exponents) are floored and
    /// saturated into `i64`; clamping happens later in [`paginate`].
    pub fn parse(raw: Option<&str>) -> Self {
        let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
            return Self::new(1);
        };

        match raw.parse::<f64>() {
            // `as` saturates at the i64 bounds
            Ok(value) if value.is_finite() => Self::new(value.floor() as i64),
            _ => Self::new(1),
        }
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(1)
    }
}

/// Clamped page position and slice bounds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    /// Clamped page number, always within `1..=total_pages`
    pub page: usize,
    /// Total number of pages, at least 1
    pub total_pages: usize,
    /// First index of the slice
    pub start_index: usize,
    /// One past the last index of the slice
    pub end_index_exclusive: usize,
}

impl PageWindow {
    /// Number of records covered by this window
    pub fn len(&self) -> usize {
        self.end_index_exclusive - self.start_index
    }

    /// Whether the window covers no records (only possible for empty datasets)
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Compute the page window for a dataset of `total_count` records
///
/// A `page_size` of zero is treated as 1.
pub fn paginate(total_count: usize, page_size: usize, requested_page: i64) -> PageWindow {
    let page_size = page_size.max(1);
    let total_pages = total_count.div_ceil(page_size).max(1);

    let page = if requested_page < 1 {
        1
    } else {
        usize::try_from(requested_page)
            .unwrap_or(usize::MAX)
            .min(total_pages)
    };

    let start_index = (page - 1) * page_size;
    let end_index_exclusive = (start_index + page_size).min(total_count);

    PageWindow {
        page,
        total_pages,
        start_index: start_index.min(end_index_exclusive),
        end_index_exclusive,
    }
}

/// One page of records together with its position in the dataset
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    /// Records on this page, in dataset order
    pub items: Vec<T>,
    /// Clamped page number
    pub page: usize,
    /// Total number of pages
    pub total_pages: usize,
    /// Configured page size
    pub page_size: usize,
    /// Total number of records in the dataset
    pub total_count: usize,
}

impl<T: Clone> Page<T> {
    /// Slice `records` according to `request`
    pub fn slice(records: &[T], page_size: usize, request: PageRequest) -> Self {
        let window = paginate(records.len(), page_size, request.requested_page);

        Self {
            items: records[window.start_index..window.end_index_exclusive].to_vec(),
            page: window.page,
            total_pages: window.total_pages,
            page_size: page_size.max(1),
            total_count: records.len(),
        }
    }
}
