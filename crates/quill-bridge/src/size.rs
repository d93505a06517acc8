#![forbid(unsafe_code)]

//! Terminal size probing.
//!
//! Probe order, first hit wins:
//!
//! 1. dimensions explicitly configured at startup;
//! 2. the tty driver;
//! 3. `$LINES` / `$COLUMNS`;
//! 4. the capability entry's numbers;
//! 5. 80×24.

use quill_term::{NumCap, TermDb, TermEnv};

use crate::TuiOptions;

/// Default dimensions when nothing else answers.
pub const DEFAULT_SIZE: (u16, u16) = (80, 24);

/// Probe the terminal size as `(width, height)`.
#[must_use]
pub fn probe(options: &TuiOptions, env: &TermEnv, db: &TermDb) -> (u16, u16) {
    if let (Some(columns), Some(rows)) = (options.columns, options.rows)
        && columns > 0
        && rows > 0
    {
        return (columns, rows);
    }

    if let Some(size) = quill_input::tty_size() {
        return size;
    }

    if let Some(size) = env.size_hint() {
        return size;
    }

    let columns = db.get_num(NumCap::Columns);
    let lines = db.get_num(NumCap::Lines);
    if columns > 0 && lines > 0 {
        return (columns as u16, lines as u16);
    }

    tracing::warn!("terminal size unavailable, assuming 80x24");
    DEFAULT_SIZE
}
