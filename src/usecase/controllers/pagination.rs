use crate::domain::entities::query::{PageSpec, DEFAULT_PAGE_SIZE};
use crate::usecase::ports::source::ValidationError;

pub const DEFAULT_WINDOW_RADIUS: usize = 5;

/// Page position and size, plus the totals reported by the last response
/// for the active query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaginationController {
    page_index: usize,
    page_size: usize,
    total_results: usize,
    total_pages: usize,
    radius: usize,
}

impl Default for PaginationController {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE, DEFAULT_WINDOW_RADIUS)
    }
}

impl PaginationController {
    pub fn new(page_size: usize, radius: usize) -> Self {
        Self {
            page_index: 0,
            page_size: page_size.max(1),
            total_results: 0,
            total_pages: 0,
            radius,
        }
    }

    pub fn page(&self) -> PageSpec {
        PageSpec {
            index: self.page_index,
            size: self.page_size,
        }
    }

    pub fn page_index(&self) -> usize {
        self.page_index
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn total_results(&self) -> usize {
        self.total_results
    }

    pub fn total_pages(&self) -> usize {
        self.total_pages
    }

    fn last_index(&self) -> usize {
        self.total_pages.saturating_sub(1)
    }

    /// Move to `index`, clamped into `[0, max(total_pages - 1, 0)]`.
    pub fn set_page(&mut self, index: usize) -> usize {
        self.page_index = index.min(self.last_index());
        self.page_index
    }

    /// Change the page size; the position restarts at the first page.
    pub fn set_page_size(&mut self, size: usize) -> Result<usize, ValidationError> {
        if size == 0 {
            return Err(ValidationError::InvalidPageSize(size));
        }
        self.page_size = size;
        self.page_index = 0;
        Ok(self.page_size)
    }

    /// Back to the first page, keeping the page size. Used whenever the
    /// filter or sort changes.
    pub fn reset(&mut self) {
        self.page_index = 0;
    }

    /// Record response totals. Returns `true` when the current position had
    /// to be clamped into the new bounds.
    pub fn on_response(&mut self, total_results: usize, total_pages: usize) -> bool {
        self.total_results = total_results;
        self.total_pages = total_pages;
        let clamped = self.page_index.min(self.last_index());
        let moved = clamped != self.page_index;
        self.page_index = clamped;
        moved
    }

    pub fn window(&self) -> PageWindow {
        PageWindow::build(self.page_index, self.total_pages, self.radius)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageControl {
    pub label: String,
    /// Zero-based page index the control navigates to.
    pub target: usize,
    pub enabled: bool,
    pub current: bool,
}

impl PageControl {
    fn link(label: String, target: usize) -> Self {
        Self {
            label,
            target,
            enabled: true,
            current: false,
        }
    }
}

/// The pagination controls to render around the current page.
///
/// First/previous appear only when a previous page exists and next/last
/// only when a next page exists. Numbered controls cover at most
/// `2 * radius + 1` pages, clipped to `[1, total_pages]`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageWindow {
    pub first: Option<PageControl>,
    pub previous: Option<PageControl>,
    pub pages: Vec<PageControl>,
    pub next: Option<PageControl>,
    pub last: Option<PageControl>,
}

impl PageWindow {
    pub fn build(page_index: usize, total_pages: usize, radius: usize) -> Self {
        if total_pages == 0 {
            return Self::default();
        }

        let current = page_index + 1;
        let lo_page = current.saturating_sub(radius).max(1);
        let hi_page = (current + radius).min(total_pages);

        let pages = (lo_page..=hi_page)
            .map(|page| PageControl {
                label: page.to_string(),
                target: page - 1,
                enabled: page != current,
                current: page == current,
            })
            .collect();

        let has_previous = page_index > 0;
        let has_next = current < total_pages;

        Self {
            first: has_previous.then(|| PageControl::link("[1]".to_string(), 0)),
            previous: has_previous.then(|| PageControl::link("< Prev".to_string(), page_index - 1)),
            pages,
            next: has_next.then(|| PageControl::link("Next >".to_string(), page_index + 1)),
            last: has_next.then(|| PageControl::link(format!("[{total_pages}]"), total_pages - 1)),
        }
    }

    pub fn page_numbers(&self) -> Vec<usize> {
        self.pages.iter().map(|control| control.target + 1).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// All controls in display order.
    pub fn controls(&self) -> Vec<PageControl> {
        self.first
            .iter()
            .chain(self.previous.iter())
            .chain(self.pages.iter())
            .chain(self.next.iter())
            .chain(self.last.iter())
            .cloned()
            .collect()
    }
}
