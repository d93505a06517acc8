#![forbid(unsafe_code)]

//! Cross-thread UI bridge and the UI thread's event loop.
//!
//! The editor core schedules draw commands through [`Bridge`] (which
//! implements [`UserInterface`]); the UI thread executes them against
//! the renderer, pumps decoded input back to the core, and handles
//! SIGWINCH/SIGCONT plus the SIGTSTP suspend rendez-vous.

pub mod bridge;
pub mod size;
pub mod ui;

#[cfg(unix)]
mod signals;

pub use bridge::{Bridge, InputCallback, TOO_MANY_EVENTS, TuiOptions};
pub use ui::{UiCommand, UserInterface};
