//! Per-viewer pagination state.
//!
//! One `SessionState` lives as long as a viewer's session and is passed
//! explicitly into every presenter call. It only changes through the
//! transitions below:
//!
//! - `select`: a different movie resets the cursor to one page and clears
//!   the trigger; re-selecting the same movie does nothing
//! - `trigger`: recommendations were requested, the first page is visible
//! - `show_more`: one more page, capped by `max_shown` and by what exists

use data_loader::MovieId;

/// Recommendations added per page
pub const DEFAULT_PAGE_SIZE: usize = 5;
/// Hard cap on recommendations shown for one selection
pub const DEFAULT_MAX_SHOWN: usize = 50;

#[derive(Debug, Clone)]
pub struct SessionState {
    selected: Option<MovieId>,
    /// Pagination cursor (number of entries to show)
    shown: usize,
    recommend_triggered: bool,
    page_size: usize,
    max_shown: usize,
}

impl SessionState {
    /// `page_size` must be at least 1 and no larger than `max_shown`
    pub fn new(page_size: usize, max_shown: usize) -> Self {
        let page_size = page_size.clamp(1, max_shown.max(1));
        Self {
            selected: None,
            shown: page_size,
            recommend_triggered: false,
            page_size,
            max_shown,
        }
    }

    pub fn selected(&self) -> Option<MovieId> {
        self.selected
    }

    /// Current cursor value
    pub fn shown(&self) -> usize {
        self.shown
    }

    pub fn is_triggered(&self) -> bool {
        self.recommend_triggered
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn max_shown(&self) -> usize {
        self.max_shown
    }

    /// Select a movie. Returns true if the selection changed.
    pub fn select(&mut self, movie_id: MovieId) -> bool {
        if self.selected == Some(movie_id) {
            return false;
        }
        self.selected = Some(movie_id);
        self.shown = self.page_size;
        self.recommend_triggered = false;
        true
    }

    /// Mark recommendations as requested and show the first page
    pub fn trigger(&mut self, available: usize) {
        self.recommend_triggered = true;
        self.shown = self.page_size.min(self.max_shown).min(available);
    }

    /// Grow the cursor by one page. Returns true if more entries became visible.
    ///
    /// Does nothing before `trigger`.
    pub fn show_more(&mut self, available: usize) -> bool {
        if !self.recommend_triggered {
            return false;
        }
        let next = (self.shown + self.page_size)
            .min(self.max_shown)
            .min(available);
        if next > self.shown {
            self.shown = next;
            true
        } else {
            false
        }
    }

    /// Number of entries to present out of `available`
    pub fn visible(&self, available: usize) -> usize {
        if self.recommend_triggered {
            self.shown.min(available)
        } else {
            0
        }
    }

    /// Whether a further `show_more` could reveal anything
    pub fn can_show_more(&self, available: usize) -> bool {
        self.recommend_triggered && self.shown < self.max_shown.min(available)
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE, DEFAULT_MAX_SHOWN)
    }
}
