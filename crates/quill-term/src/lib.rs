#![forbid(unsafe_code)]

//! Terminal capability layer.
//!
//! This crate owns everything between "the renderer wants to move the
//! cursor" and "these bytes go on the wire":
//!
//! - [`TermDb`]: the capability set - parameterised escape strings keyed
//!   by symbolic name, plus booleans and numbers. Immutable once built.
//! - [`detect`]: terminal family detection from the environment.
//! - [`patch`]: the data-driven fix pass that fills in missing
//!   capabilities and overrides broken ones per family.
//! - [`expand`]: the parameter-substitution formatter the capability
//!   strings are written in (`%p1`..`%p9`, arithmetic, conditionals).
//! - [`OutBuf`]: the output buffer with a reserved tail for the
//!   cursor-restore suffix.
//!
//! No terminfo database file is read: base entries are built in per
//! family and then patched, which covers the terminals the subsystem
//! targets without dragging in a terminfo parser.

pub mod caps;
pub mod detect;
pub mod expand;
pub mod keys;
pub mod outbuf;
pub mod patch;

pub use caps::{BoolCap, ExtCap, NumCap, StrCap, TermDb};
pub use detect::{TermEnv, TermFamily};
pub use expand::expand_into;
pub use keys::{BackspaceFix, CTRL_H, DEL};
pub use outbuf::{CURSOR_TAIL_RESERVE, OUTBUF_SIZE, OutBuf};
