//! Vertical scroll bookkeeping shared by the schema, form and result panes.

/// Content height, viewport height and offset in terminal rows, so the
/// offset can be handed straight to `Paragraph::scroll`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScrollMetrics {
    offset: u16,
    content_height: u16,
    viewport_height: u16,
}

impl ScrollMetrics {
    pub const fn offset(&self) -> u16 {
        self.offset
    }

    pub fn max_offset(&self) -> u16 {
        self.content_height.saturating_sub(self.viewport_height)
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Records the measured sizes and clamps the offset.
    pub fn update(&mut self, content_height: usize, viewport_height: u16) {
        self.content_height = u16::try_from(content_height).unwrap_or(u16::MAX);
        self.viewport_height = viewport_height;
        self.offset = self.offset.min(self.max_offset());
    }

    /// Scrolls by relative line count (`+` down, `-` up).
    pub fn scroll_lines(&mut self, delta: i32) {
        let next = (i32::from(self.offset) + delta).clamp(0, i32::from(self.max_offset()));
        self.offset = next as u16;
    }

    pub fn scroll_pages(&mut self, delta_pages: i32) {
        self.scroll_lines(i32::from(self.viewport_height.max(1)) * delta_pages);
    }

    /// Moves the offset the least amount needed to show rows `start..end`.
    pub fn ensure_visible(&mut self, start: usize, end: usize) {
        let start = u16::try_from(start).unwrap_or(u16::MAX);
        let end = u16::try_from(end).unwrap_or(u16::MAX);
        if start < self.offset {
            self.offset = start;
        } else if end > self.offset.saturating_add(self.viewport_height) {
            self.offset = end.saturating_sub(self.viewport_height).min(start);
        }
    }
}
