#![forbid(unsafe_code)]

//! Quill public facade crate.
//!
//! Re-exports the user-facing surface of the terminal UI subsystem so
//! an embedding editor core depends on one crate:
//!
//! - screen model: `quill-grid`
//! - capability layer: `quill-term`
//! - renderer: `quill-render`
//! - input decoding: `quill-input`
//! - cross-thread bridge and event loop: `quill-bridge`
//! - multi-level event queue: `quill-queue`
//!
//! The typical embedding calls [`Bridge::attach`], programs against
//! [`UserInterface`], and drains decoded [`Event`]s from the input
//! callback - usually into a [`MultiQueue`] child on its main loop.

// --- Bridge ----------------------------------------------------------------

pub use quill_bridge::{Bridge, InputCallback, TOO_MANY_EVENTS, TuiOptions, UiCommand, UserInterface};

// --- Screen model ----------------------------------------------------------

pub use quill_grid::{AttrFlags, Attrs, CELL_TEXT_MAX, Cell, DirtyRects, Grid, Rect};

// --- Renderer --------------------------------------------------------------

pub use quill_render::{
    CursorShape, HighlightLookup, ModeEntry, ModeIdx, ModeTable, NoHighlights, RenderOptions,
    Renderer,
};

// --- Capability layer ------------------------------------------------------

pub use quill_term::{
    BackspaceFix, BoolCap, ExtCap, NumCap, OutBuf, StrCap, TermDb, TermEnv, TermFamily,
};

// --- Input -----------------------------------------------------------------

pub use quill_input::{
    Event, InputDecoder, KeyCode, KeyEvent, KeyFix, Modifiers, MouseButton, MouseEvent,
    MouseEventKind,
};

// --- Core-side event queue -------------------------------------------------

pub use quill_queue::MultiQueue;
