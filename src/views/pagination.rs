//! Client-side pagination over an already-fetched list.

/// Entries per page when nothing else is configured
pub const DEFAULT_PAGE_SIZE: usize = 2;

/// Current page cursor for a list paged `page_size` entries at a time.
///
/// Pages are numbered from 1. The cursor is always clamped into
/// `[1, total_pages]`, where an empty list still has one (empty) page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Paginator {
    page_size: usize,
    current: usize,
}

impl Default for Paginator {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}

impl Paginator {
    /// A zero page size is treated as 1.
    pub fn new(page_size: usize) -> Self {
        Self {
            page_size: page_size.max(1),
            current: 1,
        }
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn current_page(&self) -> usize {
        self.current
    }

    pub fn total_pages(&self, total: usize) -> usize {
        total.div_ceil(self.page_size).max(1)
    }

    /// Jump to `page`, clamped to the valid range. Returns the page landed on.
    pub fn go_to_page(&mut self, page: usize, total: usize) -> usize {
        self.current = page.clamp(1, self.total_pages(total));
        self.current
    }

    pub fn next_page(&mut self, total: usize) -> usize {
        self.go_to_page(self.current.saturating_add(1), total)
    }

    pub fn previous_page(&mut self, total: usize) -> usize {
        self.go_to_page(self.current.saturating_sub(1), total)
    }

    pub fn reset(&mut self) {
        self.current = 1;
    }

    /// The current page of `items`.
    pub fn page<'a, T>(&self, items: &'a [T]) -> Page<'a, T> {
        let total = items.len();
        let total_pages = self.total_pages(total);
        let number = self.current.min(total_pages);

        let start = ((number - 1) * self.page_size).min(total);
        let end = (start + self.page_size).min(total);

        Page {
            items: &items[start..end],
            number,
            total_pages,
            total,
            offset: start,
        }
    }
}

/// One page of a list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page<'a, T> {
    pub items: &'a [T],
    pub number: usize,
    pub total_pages: usize,
    pub total: usize,
    offset: usize,
}

impl<T> Page<'_, T> {
    /// 1-based position of the first entry on this page (0 if empty)
    pub fn first_index(&self) -> usize {
        if self.items.is_empty() {
            0
        } else {
            self.offset + 1
        }
    }

    /// 1-based position of the last entry on this page (0 if empty)
    pub fn last_index(&self) -> usize {
        self.offset + self.items.len()
    }

    pub fn has_previous(&self) -> bool {
        self.number > 1
    }

    pub fn has_next(&self) -> bool {
        self.number < self.total_pages
    }

    pub fn summary(&self) -> String {
        format!(
            "Showing {} to {} of {}",
            self.first_index(),
            self.last_index(),
            self.total
        )
    }
}
