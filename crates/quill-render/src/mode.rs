#![forbid(unsafe_code)]

//! Cursor-shape mode table.
//!
//! The editor core describes how the cursor should look per mode
//! (normal, insert, the command-line variants, ...) in one
//! `mode_info_set` call. The renderer keeps that table plus the index
//! of the mode currently showing, and turns entries into DECSCUSR (or
//! the Konsole proprietary sequence) on mode changes.

/// Fixed mode slots, in table order. The mouse-only entries exist so
/// the core's table indices line up; the renderer never styles them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(usize)]
pub enum ModeIdx {
    Normal = 0,
    Visual = 1,
    Insert = 2,
    Replace = 3,
    CmdNormal = 4,
    CmdInsert = 5,
    CmdReplace = 6,
    OperatorPending = 7,
    VisualExclusive = 8,
    OnCmdLine = 9,
    OnStatusLine = 10,
    DragStatusLine = 11,
    OnVertSep = 12,
    DragVertSep = 13,
    HitReturn = 14,
    HitReturnLast = 15,
    ShowMatch = 16,
}

/// Number of mode slots.
pub const MODE_COUNT: usize = ModeIdx::ShowMatch as usize + 1;

impl ModeIdx {
    /// Clamp an untrusted index from the wire into the table.
    #[must_use]
    pub fn from_index(idx: usize) -> Self {
        match idx {
            0 => Self::Normal,
            1 => Self::Visual,
            2 => Self::Insert,
            3 => Self::Replace,
            4 => Self::CmdNormal,
            5 => Self::CmdInsert,
            6 => Self::CmdReplace,
            7 => Self::OperatorPending,
            8 => Self::VisualExclusive,
            9 => Self::OnCmdLine,
            10 => Self::OnStatusLine,
            11 => Self::DragStatusLine,
            12 => Self::OnVertSep,
            13 => Self::DragVertSep,
            14 => Self::HitReturn,
            15 => Self::HitReturnLast,
            _ => Self::ShowMatch,
        }
    }
}

/// Cursor shapes a mode can request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CursorShape {
    #[default]
    Block,
    Horizontal,
    Vertical,
}

impl CursorShape {
    /// Parse the wire name. Unknown names fall back to a block cursor.
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        match name {
            "vertical" => Self::Vertical,
            "horizontal" => Self::Horizontal,
            _ => Self::Block,
        }
    }

    /// DECSCUSR style for the *blinking* variant of this shape; the
    /// non-blinking variant is one higher.
    #[must_use]
    pub fn decscusr_base(self) -> i64 {
        match self {
            Self::Block => 1,
            Self::Horizontal => 3,
            Self::Vertical => 5,
        }
    }

    /// Konsole's proprietary shape code.
    #[must_use]
    pub fn konsole_code(self) -> i64 {
        match self {
            Self::Block => 0,
            Self::Vertical => 1,
            Self::Horizontal => 2,
        }
    }
}

/// One mode's cursor description.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModeEntry {
    pub shape: CursorShape,
    /// Milliseconds before blinking starts; 0 disables the wait.
    pub blinkwait: i32,
    /// Blink on-time in milliseconds; 0 means a steady cursor.
    pub blinkon: i32,
    /// Blink off-time in milliseconds.
    pub blinkoff: i32,
    /// Percentage of the cell the bar shapes occupy. Informational for
    /// terminals; GUIs consume it.
    pub cell_percentage: i32,
    /// Highlight group backing the cursor color; 0 means none.
    pub hl_id: i32,
}

impl Default for ModeEntry {
    fn default() -> Self {
        Self {
            shape: CursorShape::Block,
            blinkwait: 0,
            blinkon: 0,
            blinkoff: 0,
            cell_percentage: 0,
            hl_id: 0,
        }
    }
}

/// The full per-mode table plus the enable flag from the core.
#[derive(Debug, Clone)]
pub struct ModeTable {
    entries: [ModeEntry; MODE_COUNT],
    enabled: bool,
}

impl Default for ModeTable {
    fn default() -> Self {
        Self {
            entries: [ModeEntry::default(); MODE_COUNT],
            enabled: false,
        }
    }
}

impl ModeTable {
    /// Replace the table from a `mode_info_set` payload. Entries beyond
    /// the table are ignored; missing ones keep their previous value.
    pub fn set(&mut self, enabled: bool, entries: &[ModeEntry]) {
        self.enabled = enabled;
        for (slot, entry) in self.entries.iter_mut().zip(entries.iter()) {
            *slot = *entry;
        }
    }

    /// Whether cursor-shape sequences may be emitted at all.
    #[must_use]
    pub fn enabled(&self) -> bool {
        self.enabled
    }

    #[must_use]
    pub fn entry(&self, mode: ModeIdx) -> ModeEntry {
        self.entries[mode as usize]
    }
}

/// Resolver from a highlight group to the cursor color.
///
/// The renderer holds no highlight tables; the embedding core supplies
/// the mapping. The returned color is packed `0xRRGGBB`.
pub trait HighlightLookup {
    fn cursor_color(&self, hl_id: i32) -> Option<i32>;
}

/// A resolver that knows no highlight groups.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoHighlights;

impl HighlightLookup for NoHighlights {
    fn cursor_color(&self, _hl_id: i32) -> Option<i32> {
        None
    }
}
