//! Horizontally scrollable row with start/end navigation controls.
//!
//! Rows are rebuilt from the current viewport and content on every render, so a resize or a
//! data/filter change is a fresh row replaying the last reported offset, clamped to the new bounds.

/// Visibility of a row's navigation controls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScrollControls {
    /// Show the "scroll towards start" control.
    pub show_start: bool,
    /// Show the "scroll towards end" control.
    pub show_end: bool,
}

/// Scroll geometry of one row. Every mutation recomputes the controls.
#[derive(Debug, Clone, PartialEq)]
pub struct ScrollRow {
    offset: f64,
    viewport: f64,
    content: f64,
    tolerance: f64,
}

impl ScrollRow {
    /// Row scrolled to the start.
    pub fn new(viewport: f64, content: f64, tolerance: f64) -> Self {
        Self {
            offset: 0.0,
            viewport: viewport.max(0.0),
            content: content.max(0.0),
            tolerance: tolerance.max(0.0),
        }
    }

    /// Current scroll offset.
    pub fn offset(&self) -> f64 {
        self.offset
    }

    /// Largest reachable offset.
    pub fn max_offset(&self) -> f64 {
        (self.content - self.viewport).max(0.0)
    }

    /// Controls for the current geometry.
    pub fn controls(&self) -> ScrollControls {
        ScrollControls {
            show_start: self.offset > self.tolerance,
            show_end: self.offset + self.viewport < self.content - self.tolerance,
        }
    }

    /// Record a scroll event.
    pub fn on_scroll(&mut self, offset: f64) -> ScrollControls {
        self.offset = self.clamp(offset);
        self.controls()
    }

    /// Scroll by `delta`, negative towards the start, staying within bounds.
    pub fn scroll_by(&mut self, delta: f64) -> ScrollControls {
        self.on_scroll(self.offset + delta)
    }

    fn clamp(&self, offset: f64) -> f64 {
        offset.clamp(0.0, self.max_offset())
    }
}

/// Content width of a row of `cards` cards separated by `gap`.
pub fn row_content_width(cards: usize, card_width: f64, gap: f64) -> f64 {
    if cards == 0 {
        return 0.0;
    }
    cards as f64 * card_width + (cards - 1) as f64 * gap
}
