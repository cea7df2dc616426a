//! Carousel navigation over a card's screenshots

/// Display mode derived from the carousel length
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CarouselState {
    /// Nothing to show
    Empty,
    /// One item; navigation controls hidden
    Single,
    /// Several items; arrows and dot indicators shown
    Multi,
}

/// Cyclic index over `[0, len)`
///
/// Transitions are purely local. Fetching the media behind the new index is the
/// media cache's job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CarouselController {
    index: usize,
    len: usize,
}

impl CarouselController {
    /// A carousel over `len` items, positioned on the first
    #[must_use]
    pub const fn new(len: usize) -> Self {
        Self { index: 0, len }
    }

    /// Active index (always 0 when empty)
    #[must_use]
    pub const fn index(&self) -> usize {
        self.index
    }

    /// Number of items
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Whether there is nothing to navigate
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[must_use]
    pub const fn state(&self) -> CarouselState {
        match self.len {
            0 => CarouselState::Empty,
            1 => CarouselState::Single,
            _ => CarouselState::Multi,
        }
    }

    /// Whether arrows and dots should be drawn
    #[must_use]
    pub const fn shows_controls(&self) -> bool {
        matches!(self.state(), CarouselState::Multi)
    }

    /// Advance one item, wrapping to the start. Returns the new index.
    pub const fn next(&mut self) -> usize {
        if self.len > 0 {
            self.index = (self.index + 1) % self.len;
        }
        self.index
    }

    /// Step back one item, wrapping to the end. Returns the new index.
    pub const fn prev(&mut self) -> usize {
        if self.len > 0 {
            self.index = (self.index + self.len - 1) % self.len;
        }
        self.index
    }

    /// Jump straight to `index`
    ///
    /// Returns `false` and leaves the position unchanged when `index` is out of range.
    pub const fn jump(&mut self, index: usize) -> bool {
        if index < self.len {
            self.index = index;
            true
        } else {
            false
        }
    }

    /// Index the one-ahead preload should target, if any
    #[must_use]
    pub const fn preload_target(&self) -> Option<usize> {
        if self.len > 1 {
            Some((self.index + 1) % self.len)
        } else {
            None
        }
    }

    /// Position counter, e.g. "2 / 5"
    #[must_use]
    pub fn counter_label(&self) -> Option<String> {
        self.shows_controls()
            .then(|| format!("{} / {}", self.index + 1, self.len))
    }

    /// Dot indicator row, `true` for the active item
    #[must_use]
    pub fn dots(&self) -> Vec<bool> {
        if !self.shows_controls() {
            return Vec::new();
        }
        (0..self.len).map(|i| i == self.index).collect()
    }
}
