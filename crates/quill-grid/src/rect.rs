#![forbid(unsafe_code)]

//! Damage tracking: inclusive cell rectangles and the coalescing list.
//!
//! [`DirtyRects`] holds the set of rectangles whose cells may disagree
//! with what the terminal currently displays. Insertion unions the new
//! rectangle with any stored rectangle it touches or overlaps, and
//! repeats until no such neighbour remains, so the list is always
//! pairwise disjoint *and* non-touching. The flush path drains it.
//!
//! Touching counts as mergeable: repainting two adjacent rectangles as
//! one bounding box costs at most the seam cells and saves a cursor
//! reposition per row.

use smallvec::SmallVec;

/// An inclusive rectangle of cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub top: usize,
    pub bot: usize,
    pub left: usize,
    pub right: usize,
}

impl Rect {
    #[must_use]
    pub fn new(top: usize, bot: usize, left: usize, right: usize) -> Self {
        debug_assert!(top <= bot && left <= right, "degenerate rect");
        Self {
            top,
            bot,
            left,
            right,
        }
    }

    /// Number of cells covered.
    #[must_use]
    pub fn area(&self) -> usize {
        (self.bot - self.top + 1) * (self.right - self.left + 1)
    }

    /// True when `pos` lies inside the rectangle.
    #[must_use]
    pub fn contains(&self, row: usize, col: usize) -> bool {
        (self.top..=self.bot).contains(&row) && (self.left..=self.right).contains(&col)
    }

    /// Smallest rectangle covering both.
    #[must_use]
    pub fn union(&self, other: &Self) -> Self {
        Self {
            top: self.top.min(other.top),
            bot: self.bot.max(other.bot),
            left: self.left.min(other.left),
            right: self.right.max(other.right),
        }
    }

    /// True when the rectangles overlap or share an edge/corner.
    ///
    /// Implemented by growing `self` one cell outward and testing plain
    /// intersection, so "touching" needs no special cases.
    #[must_use]
    pub fn touches(&self, other: &Self) -> bool {
        let top = self.top.saturating_sub(1);
        let left = self.left.saturating_sub(1);
        let bot = self.bot + 1;
        let right = self.right + 1;
        !(top > other.bot || bot < other.top || left > other.right || right < other.left)
    }
}

/// The coalescing dirty-rectangle list.
///
/// Empty after a flush; bounded in practice by screen-partition counts,
/// so a small inline buffer avoids heap traffic entirely.
#[derive(Debug, Default)]
pub struct DirtyRects {
    rects: SmallVec<[Rect; 8]>,
}

impl DirtyRects {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a rectangle, merging with every stored rectangle it touches.
    ///
    /// The union of two touching rectangles may touch rectangles that
    /// neither part did, so merging repeats until a fixpoint: the stored
    /// list stays pairwise non-touching.
    pub fn insert(&mut self, rect: Rect) {
        let mut merged = rect;
        loop {
            let Some(idx) = self.rects.iter().position(|r| r.touches(&merged)) else {
                break;
            };
            let existing = self.rects.swap_remove(idx);
            merged = merged.union(&existing);
        }
        self.rects.push(merged);
    }

    /// Remove and return one rectangle, in no particular order.
    pub fn pop(&mut self) -> Option<Rect> {
        self.rects.pop()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rects.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rects.len()
    }

    pub fn clear(&mut self) {
        self.rects.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = &Rect> {
        self.rects.iter()
    }
}
