#![forbid(unsafe_code)]

//! Cell types and invariants.
//!
//! A [`Cell`] is one screen position: an inline UTF-8 payload (the primary
//! scalar plus any combining marks) and an attribute record. The payload is
//! stored as opaque bytes - the grid does not interpret grapheme boundaries
//! or display width; double-wide placement is the producer's responsibility.
//!
//! # Layout
//!
//! ```text
//! Cell {
//!     text:  CellText,   // 29 bytes - inline UTF-8, length-prefixed
//!     attrs: Attrs,      // 16 bytes - flags + fg/bg/sp
//! }
//! ```
//!
//! Colors are `i32`: `-1` means "terminal default"; non-negative values are
//! palette indices or packed `0xRRGGBB`, depending on whether the session
//! runs in RGB mode.

use std::fmt;

/// Maximum payload bytes per cell: one scalar plus up to six combining
/// code points, four bytes each.
pub const CELL_TEXT_MAX: usize = 28;

bitflags::bitflags! {
    /// Boolean cell attributes.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct AttrFlags: u8 {
        /// Bold / increased intensity.
        const BOLD      = 0b0000_0001;
        /// Straight underline.
        const UNDERLINE = 0b0000_0010;
        /// Curly underline. Rendered as plain underline on the wire.
        const UNDERCURL = 0b0000_0100;
        /// Italic text.
        const ITALIC    = 0b0000_1000;
        /// Reverse video (swap fg/bg).
        const REVERSE   = 0b0001_0000;
    }
}

/// A full attribute record: style flags plus the three color channels.
///
/// `sp` (the "special" color, used for underline tinting by GUIs) is
/// carried but never emitted by the terminal renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Attrs {
    pub flags: AttrFlags,
    pub fg: i32,
    pub bg: i32,
    pub sp: i32,
}

impl Attrs {
    /// No styling, all colors at the terminal default.
    pub const EMPTY: Self = Self {
        flags: AttrFlags::empty(),
        fg: -1,
        bg: -1,
        sp: -1,
    };

    /// True when `self` and `other` would require different SGR state.
    ///
    /// `sp` is excluded: it never reaches the wire.
    #[inline]
    #[must_use]
    pub fn differs(&self, other: &Self) -> bool {
        self.flags != other.flags || self.fg != other.fg || self.bg != other.bg
    }

    /// Builder: set the foreground.
    #[must_use]
    pub const fn with_fg(mut self, fg: i32) -> Self {
        self.fg = fg;
        self
    }

    /// Builder: set the background.
    #[must_use]
    pub const fn with_bg(mut self, bg: i32) -> Self {
        self.bg = bg;
        self
    }

    /// Builder: set the style flags.
    #[must_use]
    pub const fn with_flags(mut self, flags: AttrFlags) -> Self {
        self.flags = flags;
        self
    }
}

impl Default for Attrs {
    fn default() -> Self {
        Self::EMPTY
    }
}

/// Inline, length-prefixed UTF-8 payload.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct CellText {
    bytes: [u8; CELL_TEXT_MAX],
    len: u8,
}

impl CellText {
    /// A single ASCII space - the content of every freshly cleared cell.
    pub const SPACE: Self = {
        let mut bytes = [0u8; CELL_TEXT_MAX];
        bytes[0] = b' ';
        Self { bytes, len: 1 }
    };

    /// Store `payload`, truncating at the capacity if the producer hands
    /// us more than a cell can hold.
    ///
    /// A cell holds at most one grapheme cluster; the producer splits
    /// wider runs before calling.
    #[inline]
    pub fn set(&mut self, payload: &[u8]) {
        debug_assert!(payload.len() <= CELL_TEXT_MAX, "cell payload overflow");
        debug_assert!(
            std::str::from_utf8(payload).map_or(true, |s| {
                use unicode_segmentation::UnicodeSegmentation;
                s.graphemes(true).count() <= 1
            }),
            "cell payload spans grapheme clusters"
        );
        let len = payload.len().min(CELL_TEXT_MAX);
        self.bytes[..len].copy_from_slice(&payload[..len]);
        self.len = len as u8;
    }

    /// Display-width hint for the payload. Double-wide *placement* is
    /// the producer's job; this answers how many columns the content
    /// wants, for consumers sizing continuation cells.
    #[must_use]
    pub fn width(&self) -> usize {
        match std::str::from_utf8(self.as_bytes()) {
            Ok(s) => unicode_width::UnicodeWidthStr::width(s),
            Err(_) => 1,
        }
    }

    /// The stored payload.
    #[inline]
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[..self.len as usize]
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.len as usize
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl Default for CellText {
    fn default() -> Self {
        Self::SPACE
    }
}

impl fmt::Debug for CellText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match std::str::from_utf8(self.as_bytes()) {
            Ok(s) => write!(f, "CellText({s:?})"),
            Err(_) => write!(f, "CellText({:02x?})", self.as_bytes()),
        }
    }
}

/// A single screen cell: payload plus attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Cell {
    pub text: CellText,
    pub attrs: Attrs,
}

impl Cell {
    /// A blank cell using the given clearing attributes.
    #[must_use]
    pub fn blank(attrs: Attrs) -> Self {
        Self {
            text: CellText::SPACE,
            attrs,
        }
    }

    /// Overwrite this cell with `payload` rendered in `attrs`.
    #[inline]
    pub fn write(&mut self, payload: &[u8], attrs: Attrs) {
        self.text.set(payload);
        self.attrs = attrs;
    }
}
