/// A slice of an ordered sequence corresponding to one page of results.
///
/// Derived from a 1-based page number and a page size. Never persisted;
/// recompute it whenever the backing sequence or the page size changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PageWindow {
    pub start: usize,
    pub count: usize,
}

impl PageWindow {
    /// Window for a 1-based page. Page 0 and a zero page size give an empty window.
    pub fn for_page(page: usize, page_size: usize) -> Self {
        if page == 0 || page_size == 0 {
            return Self::default();
        }
        Self {
            start: (page - 1).saturating_mul(page_size),
            count: page_size,
        }
    }

    /// Exclusive end offset, saturating.
    pub fn end(&self) -> usize {
        self.start.saturating_add(self.count)
    }

    /// The part of `items` covered by this window, clamped to its bounds.
    pub fn slice<'a, T>(&self, items: &'a [T]) -> &'a [T] {
        let start = self.start.min(items.len());
        let end = self.end().min(items.len());
        &items[start..end]
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }
}

/// Number of pages needed for `len` items. Always at least 1 so a pager
/// has somewhere to sit when the list is empty.
pub fn total_pages(len: usize, page_size: usize) -> usize {
    if page_size == 0 {
        return 1;
    }
    len.div_ceil(page_size).max(1)
}

/// Page after `current`, clamped to `total`.
pub fn next_page(current: usize, total: usize) -> usize {
    current.saturating_add(1).clamp(1, total.max(1))
}

/// Page before `current`, never below 1.
pub fn previous_page(current: usize) -> usize {
    current.saturating_sub(1).max(1)
}
