#![forbid(unsafe_code)]

//! In-memory model of the terminal screen.
//!
//! This crate is pure data: a rectangular array of [`Cell`]s plus cursor,
//! scroll-region, default-color and pen state ([`Grid`]), and the
//! damage-tracking rectangle list ([`DirtyRects`]) used to schedule
//! repaints. No I/O happens here; the renderer reads this model and
//! decides what bytes the terminal needs.

pub mod cell;
pub mod grid;
pub mod rect;

pub use cell::{Attrs, AttrFlags, CELL_TEXT_MAX, Cell};
pub use grid::Grid;
pub use rect::{DirtyRects, Rect};
