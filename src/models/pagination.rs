//! Page-number pagination
//!
//! The requested page arrives as untyped query input. Bad input never fails a
//! request: anything that is not an integer selects the first page, and an
//! integer outside `1..=num_pages` selects the last page.

use serde::Serialize;
use std::num::IntErrorKind;

/// Splits `total` items into pages of `per_page`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Paginator {
    total: u64,
    per_page: u32,
}

impl Paginator {
    /// `per_page` of zero is treated as one
    pub fn new(total: u64, per_page: u32) -> Self {
        Self {
            total,
            per_page: per_page.max(1),
        }
    }

    /// Number of pages; an empty collection still has one (empty) page
    pub fn num_pages(&self) -> u32 {
        let pages = self.total.div_ceil(self.per_page as u64);
        pages.clamp(1, u32::MAX as u64) as u32
    }

    /// Resolve raw page input to a valid page number
    pub fn page_number(&self, raw: Option<&str>) -> u32 {
        let num_pages = self.num_pages();
        let Some(raw) = raw else {
            return 1;
        };
        match raw.trim().parse::<i64>() {
            Ok(n) if (1..=num_pages as i64).contains(&n) => n as u32,
            Ok(_) => num_pages,
            // Still an integer, just too large to represent
            Err(e) if matches!(e.kind(), IntErrorKind::PosOverflow | IntErrorKind::NegOverflow) => {
                num_pages
            }
            Err(_) => 1,
        }
    }

    /// Row offset of a (valid) page number
    pub fn offset(&self, number: u32) -> u64 {
        (number.saturating_sub(1) as u64) * self.per_page as u64
    }

    pub fn per_page(&self) -> u32 {
        self.per_page
    }

    /// Wrap an already fetched slice as page `number`
    pub fn page<T>(&self, items: Vec<T>, number: u32) -> Page<T> {
        Page {
            items,
            number,
            num_pages: self.num_pages(),
            total: self.total,
            per_page: self.per_page,
        }
    }

    /// Paginate an in-memory collection
    pub fn paginate<T>(items: Vec<T>, per_page: u32, raw: Option<&str>) -> Page<T> {
        let paginator = Self::new(items.len() as u64, per_page);
        let number = paginator.page_number(raw);
        let slice = items
            .into_iter()
            .skip(paginator.offset(number) as usize)
            .take(paginator.per_page as usize)
            .collect();
        paginator.page(slice, number)
    }
}

/// One page of results plus the metadata templates need for navigation
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Current page (1-indexed)
    pub number: u32,
    pub num_pages: u32,
    pub total: u64,
    pub per_page: u32,
}

impl<T> Page<T> {
    pub fn has_next(&self) -> bool {
        self.number < self.num_pages
    }

    pub fn has_previous(&self) -> bool {
        self.number > 1
    }

    pub fn next_page_number(&self) -> Option<u32> {
        self.has_next().then(|| self.number + 1)
    }

    pub fn previous_page_number(&self) -> Option<u32> {
        self.has_previous().then(|| self.number - 1)
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            number: self.number,
            num_pages: self.num_pages,
            total: self.total,
            per_page: self.per_page,
        }
    }
}
