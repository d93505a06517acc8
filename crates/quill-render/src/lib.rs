#![forbid(unsafe_code)]

//! Damage-tracked terminal renderer.
//!
//! [`Renderer`] owns the screen model, the capability database and the
//! output buffer. It consumes the editor's draw commands, keeps a
//! dirty-rect list for regions that need repainting, and at flush time
//! emits the minimal byte sequence that makes the terminal match the
//! model: incremental SGR, hardware scrolling where the terminal can do
//! it, and fast clears where they cover a rectangle exactly.

pub mod mode;
pub mod renderer;

pub use mode::{
    CursorShape, HighlightLookup, MODE_COUNT, ModeEntry, ModeIdx, ModeTable, NoHighlights,
};
pub use renderer::{RenderOptions, Renderer};
