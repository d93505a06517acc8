#![forbid(unsafe_code)]

//! The capability database.
//!
//! [`TermDb`] is a flat table of parameterised escape strings keyed by
//! symbolic name ([`StrCap`]), extension slots for sequences terminfo
//! has no name for ([`ExtCap`]), plus the booleans and numbers the
//! renderer consults. It is built once at startup (base entry for the
//! detected family, then the [`crate::patch`] pass) and never mutated
//! afterwards.
//!
//! A missing capability is simply `None`; callers skip the operation.

use crate::detect::{TermEnv, TermFamily};

/// Named string capabilities.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(usize)]
pub enum StrCap {
    /// Move cursor to absolute position (`cup`).
    CursorAddress,
    /// Clear the whole screen and home the cursor (`clear`).
    ClearScreen,
    /// Clear from the cursor to the end of the line (`el`).
    ClrEol,
    /// Clear from the cursor to the end of the screen (`ed`).
    ClrEos,
    /// Set top/bottom scroll margins (`csr`).
    ChangeScrollRegion,
    /// Set left/right margins in one call (`smglr`).
    SetLrMargin,
    /// Set the left margin alone (`smglp`).
    SetLeftMarginParm,
    /// Set the right margin alone (`smgrp`).
    SetRightMarginParm,
    /// Delete one line at the cursor (`dl1`).
    DeleteLine,
    /// Delete N lines (`dl`).
    ParmDeleteLine,
    /// Insert one line at the cursor (`il1`).
    InsertLine,
    /// Insert N lines (`il`).
    ParmInsertLine,
    /// Enter the alternate screen (`smcup`).
    EnterCaMode,
    /// Leave the alternate screen (`rmcup`).
    ExitCaMode,
    /// Make the cursor visible (`cnorm`).
    CursorNormal,
    /// Hide the cursor (`civis`).
    CursorInvisible,
    /// Reset all attributes (`sgr0`).
    ExitAttributeMode,
    /// Bold on (`bold`).
    EnterBoldMode,
    /// Italics on (`sitm`).
    EnterItalicsMode,
    /// Underline on (`smul`).
    EnterUnderlineMode,
    /// Reverse video on (`rev`).
    EnterReverseMode,
    /// Set palette foreground (`setaf`).
    SetAForeground,
    /// Set palette background (`setab`).
    SetABackground,
    /// Audible bell (`bel`).
    Bell,
    /// Visible bell (`flash`).
    FlashScreen,
    /// Open the status/title line (`tsl`).
    ToStatusLine,
    /// Close the status/title line (`fsl`).
    FromStatusLine,
    /// Byte(s) the terminal sends for Backspace (`kbs`).
    KeyBackspace,
    /// Byte(s) the terminal sends for Delete (`kdch1`).
    KeyDeleteChar,
}

const STR_CAP_COUNT: usize = StrCap::KeyDeleteChar as usize + 1;

/// Extension slots: sequences with no terminfo name, appended by the
/// patch pass. Either unavailable or a parameterised format string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(usize)]
pub enum ExtCap {
    /// SGR mouse reporting on (`CSI ?1002h CSI ?1006h`).
    EnableMouse,
    /// SGR mouse reporting off.
    DisableMouse,
    /// Bracketed paste on (`CSI ?2004h`).
    EnableBracketedPaste,
    /// Bracketed paste off.
    DisableBracketedPaste,
    /// Left/right margin mode on (`CSI ?69h`).
    EnableLrMargin,
    /// Left/right margin mode off.
    DisableLrMargin,
    /// Focus reporting on (`CSI ?1004h`).
    EnableFocusReporting,
    /// Focus reporting off.
    DisableFocusReporting,
    /// 24-bit SGR foreground.
    SetRgbForeground,
    /// 24-bit SGR background.
    SetRgbBackground,
    /// Set the cursor color (OSC 12 or the iTerm variant).
    SetCursorColor,
    /// Ask the terminal to resize its window (`CSI 8;h;w t`).
    ResizeScreen,
    /// Reset scroll margins to the full screen (`CSI r`).
    ResetScrollRegion,
}

const EXT_CAP_COUNT: usize = ExtCap::ResetScrollRegion as usize + 1;

/// Boolean capabilities.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoolCap {
    /// Erase operations fill with the current background (`bce`).
    BackColorErase,
}

/// Numeric capabilities.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumCap {
    /// Colors the terminal claims to support (`colors`).
    MaxColors,
    /// Rows per the entry (`lines`).
    Lines,
    /// Columns per the entry (`cols`).
    Columns,
}

/// The capability set for one terminal.
#[derive(Debug, Clone)]
pub struct TermDb {
    strs: [Option<Box<str>>; STR_CAP_COUNT],
    exts: [Option<Box<str>>; EXT_CAP_COUNT],
    back_color_erase: bool,
    max_colors: i32,
    lines: i32,
    columns: i32,
    family: TermFamily,
    in_tmux: bool,
}

impl TermDb {
    /// An entry with nothing in it. The patch pass (or a test) fills it.
    #[must_use]
    pub fn empty(family: TermFamily, in_tmux: bool) -> Self {
        Self {
            strs: std::array::from_fn(|_| None),
            exts: std::array::from_fn(|_| None),
            back_color_erase: false,
            max_colors: 8,
            lines: 24,
            columns: 80,
            family,
            in_tmux,
        }
    }

    /// Build the database for the given environment: detect the family,
    /// install the built-in base entry, then run the patch pass.
    #[must_use]
    pub fn from_term_env(env: &TermEnv) -> Self {
        let mut db = crate::patch::base_entry(env);
        crate::patch::apply(&mut db, env);
        tracing::debug!(
            family = ?db.family(),
            in_tmux = db.in_tmux(),
            colors = db.max_colors,
            "capability database built"
        );
        db
    }

    #[inline]
    #[must_use]
    pub fn family(&self) -> TermFamily {
        self.family
    }

    /// True when an enclosing tmux was detected at startup.
    #[inline]
    #[must_use]
    pub fn in_tmux(&self) -> bool {
        self.in_tmux
    }

    #[inline]
    #[must_use]
    pub fn get_str(&self, cap: StrCap) -> Option<&str> {
        self.strs[cap as usize].as_deref()
    }

    #[inline]
    #[must_use]
    pub fn has(&self, cap: StrCap) -> bool {
        self.strs[cap as usize].is_some()
    }

    pub fn set_str(&mut self, cap: StrCap, value: &str) {
        self.strs[cap as usize] = Some(value.into());
    }

    /// Install `value` only when the slot is empty: the fill used for
    /// entries a real database would normally provide.
    pub fn set_if_empty(&mut self, cap: StrCap, value: &str) {
        if self.strs[cap as usize].is_none() {
            self.set_str(cap, value);
        }
    }

    pub fn clear_str(&mut self, cap: StrCap) {
        self.strs[cap as usize] = None;
    }

    #[inline]
    #[must_use]
    pub fn get_ext(&self, cap: ExtCap) -> Option<&str> {
        self.exts[cap as usize].as_deref()
    }

    #[inline]
    #[must_use]
    pub fn has_ext(&self, cap: ExtCap) -> bool {
        self.exts[cap as usize].is_some()
    }

    pub fn set_ext(&mut self, cap: ExtCap, value: &str) {
        self.exts[cap as usize] = Some(value.into());
    }

    #[inline]
    #[must_use]
    pub fn get_bool(&self, cap: BoolCap) -> bool {
        match cap {
            BoolCap::BackColorErase => self.back_color_erase,
        }
    }

    pub fn set_bool(&mut self, cap: BoolCap, value: bool) {
        match cap {
            BoolCap::BackColorErase => self.back_color_erase = value,
        }
    }

    #[inline]
    #[must_use]
    pub fn get_num(&self, cap: NumCap) -> i32 {
        match cap {
            NumCap::MaxColors => self.max_colors,
            NumCap::Lines => self.lines,
            NumCap::Columns => self.columns,
        }
    }

    pub fn set_num(&mut self, cap: NumCap, value: i32) {
        match cap {
            NumCap::MaxColors => self.max_colors = value,
            NumCap::Lines => self.lines = value,
            NumCap::Columns => self.columns = value,
        }
    }

    /// Wrap `seq` for tmux passthrough (`DCS tmux; ... ST`) when running
    /// under tmux, so the outer multiplexer forwards it unmodified.
    #[must_use]
    pub fn tmux_wrap(&self, seq: &str) -> String {
        if self.in_tmux {
            let escaped = seq.replace('\x1b', "\x1b\x1b");
            format!("\x1bPtmux;{escaped}\x1b\\")
        } else {
            seq.to_string()
        }
    }
}
