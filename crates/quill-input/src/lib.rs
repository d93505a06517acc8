#![forbid(unsafe_code)]

//! Input decoding.
//!
//! The decoder owns the input side of the terminal: it reads decoded
//! events from the backend, translates them into the canonical event
//! types the editor core consumes, applies the Backspace/Delete
//! reconciliation, and answers the one question the capability layer
//! asks of it - the tty driver's VERASE byte.
//!
//! Resize events are *never* decoded from terminal bytes; they are
//! synthesised from SIGWINCH by the signal watcher.

pub mod decoder;
pub mod event;

pub use decoder::{InputDecoder, KeyFix, set_stdin_blocking, tty_size, verase};
pub use event::{Event, KeyCode, KeyEvent, Modifiers, MouseButton, MouseEvent, MouseEventKind};
