#![forbid(unsafe_code)]

//! The renderer: draw commands in, escape bytes out.
//!
//! One [`Renderer`] lives on the UI thread and is the sole owner of the
//! grid, the capability database, the output buffer and the output
//! stream. Draw commands mutate the grid immediately; bytes are emitted
//! either eagerly (cursor moves, puts, clears that map 1:1 onto a
//! capability) or lazily at [`Renderer::flush`] via the dirty-rect list.
//!
//! # Pen discipline
//!
//! The terminal's current SGR state is tracked in `print_attrs`. A cell
//! whose attributes equal the pen costs zero SGR bytes; a transition
//! costs one attribute reset plus the new attributes. SGR is never
//! emitted between two cells with identical records.
//!
//! # Cursor visibility discipline
//!
//! Every flush appends "cursor normal" (unless busy) from the reserved
//! buffer tail, and queues "cursor invisible" as the first bytes of the
//! next flush, so the cursor is hidden for the whole of every paint.
//!
//! # Failure semantics
//!
//! Output errors are swallowed here - a dead tty is detected by the
//! stream owner. Missing capabilities silently skip their operation;
//! the grid still records the intent and a later repaint repairs it.

use std::io::Write;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use quill_grid::{Attrs, AttrFlags, DirtyRects, Grid, Rect};
use quill_term::{
    BoolCap, CURSOR_TAIL_RESERVE, ExtCap, OutBuf, StrCap, TermDb, TermFamily, expand_into,
};

use crate::mode::{HighlightLookup, ModeEntry, ModeIdx, ModeTable, NoHighlights};

/// Konsole predates DECSCUSR and uses its own OSC for cursor shape.
const KONSOLE_CURSOR_SHAPE: &str =
    "\x1b]50;CursorShape=%p1%d;BlinkingCursorEnabled=%p2%d\x07";

/// DECSCUSR: `CSI <n> SP q`.
const DECSCUSR: &str = "\x1b[%p1%d q";

/// Renderer construction options.
#[derive(Debug, Clone, Default)]
pub struct RenderOptions {
    /// Emit 24-bit SGR (colors are packed `0xRRGGBB`) instead of
    /// palette indices.
    pub rgb: bool,
    /// `$VTE_VERSION` when advertised. Old VTE terminals (< 0.39)
    /// ignore DECSCUSR, so shape codes are suppressed for them.
    pub vte_version: Option<u32>,
}

/// The terminal renderer. Generic over the output stream so tests can
/// capture the byte stream in memory.
pub struct Renderer<W: Write> {
    grid: Grid,
    db: TermDb,
    out: OutBuf,
    sink: W,
    invalid: DirtyRects,
    scratch: Vec<u8>,
    /// SGR state currently on the wire.
    print_attrs: Attrs,
    /// Where the terminal's cursor actually is; `None` when unknown
    /// (after a resize, a margin change, or anything else that moves it
    /// behind our back). A goto to the tracked position costs nothing.
    wire_cursor: Option<(usize, usize)>,
    rgb: bool,
    busy: bool,
    mouse_enabled: bool,
    scroll_region_is_full_screen: bool,
    can_change_scroll_region: bool,
    can_set_lr_margin: bool,
    can_set_left_right_margin: bool,
    mode_table: ModeTable,
    showing_mode: ModeIdx,
    vte_version: Option<u32>,
    got_winch: Arc<AtomicBool>,
    hl: Box<dyn HighlightLookup + Send>,
}

impl<W: Write> Renderer<W> {
    /// Build a renderer over `sink` for a terminal described by `db`.
    ///
    /// The grid starts at the database's advertised size; the bridge
    /// resizes it once the real size has been probed.
    pub fn new(db: TermDb, sink: W, options: RenderOptions) -> Self {
        let width = db.get_num(quill_term::NumCap::Columns).max(1) as usize;
        let height = db.get_num(quill_term::NumCap::Lines).max(1) as usize;
        let can_change_scroll_region = db.has(StrCap::ChangeScrollRegion);
        let can_set_lr_margin = db.has(StrCap::SetLrMargin);
        let can_set_left_right_margin =
            db.has(StrCap::SetLeftMarginParm) && db.has(StrCap::SetRightMarginParm);

        Self {
            grid: Grid::new(width, height),
            db,
            out: OutBuf::new(),
            sink,
            invalid: DirtyRects::new(),
            scratch: Vec::with_capacity(64),
            print_attrs: Attrs::EMPTY,
            wire_cursor: None,
            rgb: options.rgb,
            busy: false,
            mouse_enabled: false,
            scroll_region_is_full_screen: true,
            can_change_scroll_region,
            can_set_lr_margin,
            can_set_left_right_margin,
            mode_table: ModeTable::default(),
            showing_mode: ModeIdx::Normal,
            vte_version: options.vte_version,
            got_winch: Arc::new(AtomicBool::new(false)),
            hl: Box::new(NoHighlights),
        }
    }

    /// The flag the SIGWINCH watcher sets. Checked (and cleared) by
    /// `resize` to avoid fighting the signal path over the window size.
    #[must_use]
    pub fn winch_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.got_winch)
    }

    /// Install the highlight resolver used for cursor colors.
    pub fn set_highlight_lookup(&mut self, hl: Box<dyn HighlightLookup + Send>) {
        self.hl = hl;
    }

    #[must_use]
    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    #[must_use]
    pub fn db(&self) -> &TermDb {
        &self.db
    }

    /// The underlying output stream.
    pub fn sink_mut(&mut self) -> &mut W {
        &mut self.sink
    }

    #[must_use]
    pub fn busy(&self) -> bool {
        self.busy
    }

    #[must_use]
    pub fn mouse_enabled(&self) -> bool {
        self.mouse_enabled
    }

    // ── Lifecycle ────────────────────────────────────────────────────

    /// Put the terminal into TUI state: alternate screen, cleared, with
    /// bracketed paste and focus reporting on.
    pub fn start(&mut self) {
        tracing::debug!("terminal start");
        self.print_attrs = Attrs::EMPTY;
        self.wire_cursor = None;
        self.emit_str(StrCap::EnterCaMode, &[]);
        self.emit_str(StrCap::ClearScreen, &[]);
        self.wire_cursor = Some((0, 0));
        self.emit_ext(ExtCap::EnableBracketedPaste, &[]);
        self.emit_ext(ExtCap::EnableFocusReporting, &[]);
    }

    /// Restore the terminal: normal cursor, attributes reset, primary
    /// screen, reporting modes off. Flushes everything.
    pub fn stop(&mut self) {
        tracing::debug!("terminal stop");
        self.wire_cursor = None;
        self.mode_change("normal", ModeIdx::Normal as usize);
        self.mouse_off();
        self.emit_str(StrCap::ExitAttributeMode, &[]);
        // Cursor back to normal before leaving the alternate screen.
        self.emit_str(StrCap::CursorNormal, &[]);
        self.emit_str(StrCap::ExitCaMode, &[]);
        self.emit_ext(ExtCap::DisableBracketedPaste, &[]);
        self.emit_ext(ExtCap::DisableFocusReporting, &[]);
        self.flush_buf(true);
    }

    // ── Draw commands ────────────────────────────────────────────────

    /// Adopt new dimensions. When the size change did not come from
    /// SIGWINCH, ask the terminal to resize its window; otherwise the
    /// signal path already handled it and a second resize would fight.
    pub fn resize(&mut self, width: usize, height: usize) {
        self.grid.resize(width, height);
        self.wire_cursor = None;

        if !self.got_winch.load(Ordering::Relaxed) {
            self.emit_ext(ExtCap::ResizeScreen, &[height as i64, width as i64]);
            // DECSLPP does not reset the scroll region.
            if self.scroll_region_is_full_screen {
                self.reset_scroll_region_emit();
            }
        } else {
            self.got_winch.store(false, Ordering::Relaxed);
        }
        self.scroll_region_is_full_screen = true;
    }

    /// Blank the scroll region in the model and on the terminal.
    pub fn clear(&mut self) {
        self.grid.clear();
        let region = self.grid.scroll_region();
        self.clear_region_emit(region.top, region.bot, region.left, region.right);
    }

    /// Blank from the cursor to the region's right edge.
    pub fn eol_clear(&mut self) {
        let (row, col) = self.grid.cursor();
        let right = self.grid.scroll_region().right;
        self.grid.eol_clear();
        if col <= right {
            self.clear_region_emit(row, row, col, right);
        }
    }

    pub fn cursor_goto(&mut self, row: usize, col: usize) {
        self.grid.goto(row, col);
        let (row, col) = self.grid.cursor();
        self.emit_goto(row, col.min(self.grid.width() - 1));
    }

    /// Store the mode table. With `enabled == false` no cursor-shape
    /// codes are ever sent; re-enabling re-applies the showing mode.
    pub fn mode_info_set(&mut self, enabled: bool, entries: &[ModeEntry]) {
        self.mode_table.set(enabled, entries);
        if enabled {
            self.apply_mode(self.showing_mode);
        }
    }

    /// Menus are a GUI concern.
    pub fn update_menu(&mut self) {}

    pub fn busy_start(&mut self) {
        self.busy = true;
    }

    pub fn busy_stop(&mut self) {
        self.busy = false;
    }

    pub fn mouse_on(&mut self) {
        if !self.mouse_enabled {
            self.emit_ext(ExtCap::EnableMouse, &[]);
            self.mouse_enabled = true;
        }
    }

    pub fn mouse_off(&mut self) {
        if self.mouse_enabled {
            self.emit_ext(ExtCap::DisableMouse, &[]);
            self.mouse_enabled = false;
        }
    }

    /// Switch the showing mode, emitting its cursor shape and color.
    pub fn mode_change(&mut self, _name: &str, idx: usize) {
        let mode = ModeIdx::from_index(idx);
        self.apply_mode(mode);
        self.showing_mode = mode;
    }

    pub fn set_scroll_region(&mut self, top: usize, bot: usize, left: usize, right: usize) {
        self.grid.set_scroll_region(top, bot, left, right);
        let r = self.grid.scroll_region();
        self.scroll_region_is_full_screen = r.top == 0
            && r.bot == self.grid.height() - 1
            && r.left == 0
            && r.right == self.grid.width() - 1;
    }

    /// Scroll the region by `count` rows (positive: up). Uses the
    /// terminal's delete/insert-line hardware path when the region can
    /// be expressed in margins; otherwise the region is invalidated and
    /// repainted at the next flush.
    pub fn scroll(&mut self, count: i64) {
        if count == 0 {
            return;
        }
        let band = self.grid.scroll(count as isize);
        let region = self.grid.scroll_region();

        if self.can_use_scroll() {
            // With back-color-erase, the terminal fills the opened band
            // with the current background: pre-set the default colors or
            // the band inherits whatever pen happened to be active.
            let clears_to_current = self.db.get_bool(BoolCap::BackColorErase);

            if !self.scroll_region_is_full_screen {
                self.set_scroll_region_emit();
            }
            self.emit_goto(region.top, region.left);

            if clears_to_current {
                let clear_attrs = self.grid.clear_attrs();
                self.update_attrs(clear_attrs);
            }

            if count > 0 {
                if count == 1 {
                    self.emit_str(StrCap::DeleteLine, &[]);
                } else {
                    self.emit_str(StrCap::ParmDeleteLine, &[count]);
                }
            } else if count == -1 {
                self.emit_str(StrCap::InsertLine, &[]);
            } else {
                self.emit_str(StrCap::ParmInsertLine, &[-count]);
            }

            if !self.scroll_region_is_full_screen {
                self.reset_scroll_region_emit();
            }
            let (row, col) = self.grid.cursor();
            self.emit_goto(row, col.min(self.grid.width() - 1));

            if !clears_to_current {
                // Without bce the opened band keeps a stale background.
                self.clear_region_emit(band.top, band.bot, band.left, band.right);
            }
        } else {
            self.invalid
                .insert(Rect::new(region.top, region.bot, region.left, region.right));
        }
    }

    /// Set the pen. Pure model update; SGR is emitted lazily when a
    /// cell actually needs it.
    pub fn highlight_set(&mut self, attrs: Attrs) {
        self.grid.set_pen(attrs);
    }

    /// Write one cell's payload at the cursor and echo it.
    pub fn put(&mut self, text: &[u8]) {
        if let Some(cell) = self.grid.put(text) {
            self.print_cell(cell);
        }
    }

    pub fn bell(&mut self) {
        self.emit_str(StrCap::Bell, &[]);
    }

    pub fn visual_bell(&mut self) {
        self.emit_str(StrCap::FlashScreen, &[]);
    }

    pub fn update_fg(&mut self, fg: i32) {
        self.grid.set_default_fg(fg);
    }

    pub fn update_bg(&mut self, bg: i32) {
        self.grid.set_default_bg(bg);
    }

    pub fn update_sp(&mut self, sp: i32) {
        self.grid.set_default_sp(sp);
    }

    /// Set the terminal title through the status line, when the entry
    /// has one.
    pub fn set_title(&mut self, title: &str) {
        if !(self.db.has(StrCap::ToStatusLine) && self.db.has(StrCap::FromStatusLine)) {
            return;
        }
        self.emit_str(StrCap::ToStatusLine, &[]);
        self.out.write(title.as_bytes(), &mut self.sink);
        self.emit_str(StrCap::FromStatusLine, &[]);
    }

    /// The icon name travels over the same status-line codes.
    pub fn set_icon(&mut self, icon: &str) {
        self.set_title(icon);
    }

    /// Repaint every invalid rectangle, park the cursor at its logical
    /// position, and push the buffer to the device.
    pub fn flush(&mut self) {
        tracing::trace!(rects = self.invalid.len(), "flush");
        while let Some(r) = self.invalid.pop() {
            // Rectangles can outlive a shrink; clip to current bounds.
            let bot = r.bot.min(self.grid.height() - 1);
            let right = r.right.min(self.grid.width() - 1);
            if r.top > bot || r.left > right {
                continue;
            }
            for row in r.top..=bot {
                self.emit_goto(row, r.left);
                for col in r.left..=right {
                    if let Some(cell) = self.grid.cell(row, col).copied() {
                        self.print_cell(cell);
                    }
                }
            }
        }

        let (row, col) = self.grid.cursor();
        self.emit_goto(row, col.min(self.grid.width() - 1));
        self.flush_buf(true);
    }

    // ── Emission internals ───────────────────────────────────────────

    fn emit_str(&mut self, cap: StrCap, params: &[i64]) {
        if let Some(template) = self.db.get_str(cap) {
            self.scratch.clear();
            expand_into(&mut self.scratch, template, params);
            self.out.write(&self.scratch, &mut self.sink);
        }
    }

    fn emit_ext(&mut self, cap: ExtCap, params: &[i64]) {
        if let Some(template) = self.db.get_ext(cap) {
            self.scratch.clear();
            expand_into(&mut self.scratch, template, params);
            self.out.write(&self.scratch, &mut self.sink);
        }
    }

    fn emit_goto(&mut self, row: usize, col: usize) {
        if self.wire_cursor == Some((row, col)) {
            return;
        }
        self.emit_str(StrCap::CursorAddress, &[row as i64, col as i64]);
        self.wire_cursor = Some((row, col));
    }

    /// Bring the wire SGR state to `attrs`. No-op when nothing visible
    /// changes; otherwise a full reset followed by the new attributes,
    /// with `-1` channels falling back to the grid defaults.
    fn update_attrs(&mut self, attrs: Attrs) {
        if !attrs.differs(&self.print_attrs) {
            return;
        }
        self.print_attrs = attrs;
        self.emit_str(StrCap::ExitAttributeMode, &[]);

        let fg = if attrs.fg != -1 {
            attrs.fg
        } else {
            self.grid.default_fg()
        };
        let bg = if attrs.bg != -1 {
            attrs.bg
        } else {
            self.grid.default_bg()
        };

        if self.rgb {
            if fg != -1 {
                let p = [(fg >> 16) & 0xff, (fg >> 8) & 0xff, fg & 0xff];
                self.emit_ext(
                    ExtCap::SetRgbForeground,
                    &[p[0] as i64, p[1] as i64, p[2] as i64],
                );
            }
            if bg != -1 {
                let p = [(bg >> 16) & 0xff, (bg >> 8) & 0xff, bg & 0xff];
                self.emit_ext(
                    ExtCap::SetRgbBackground,
                    &[p[0] as i64, p[1] as i64, p[2] as i64],
                );
            }
        } else {
            if fg != -1 {
                self.emit_str(StrCap::SetAForeground, &[fg as i64]);
            }
            if bg != -1 {
                self.emit_str(StrCap::SetABackground, &[bg as i64]);
            }
        }

        if attrs.flags.contains(AttrFlags::BOLD) {
            self.emit_str(StrCap::EnterBoldMode, &[]);
        }
        if attrs.flags.contains(AttrFlags::ITALIC) {
            self.emit_str(StrCap::EnterItalicsMode, &[]);
        }
        if attrs
            .flags
            .intersects(AttrFlags::UNDERLINE | AttrFlags::UNDERCURL)
        {
            self.emit_str(StrCap::EnterUnderlineMode, &[]);
        }
        if attrs.flags.contains(AttrFlags::REVERSE) {
            self.emit_str(StrCap::EnterReverseMode, &[]);
        }
    }

    fn print_cell(&mut self, cell: quill_grid::Cell) {
        self.update_attrs(cell.attrs);
        self.out.write(cell.text.as_bytes(), &mut self.sink);
        if let Some((_, col)) = self.wire_cursor.as_mut() {
            *col += 1;
        }
    }

    /// Make the terminal blank `top..=bot × left..=right`, preferring
    /// whole-screen / to-end-of-screen / per-line clears when they cover
    /// the rectangle exactly, falling back to a cell repaint. Restores
    /// the cursor afterwards.
    fn clear_region_emit(&mut self, top: usize, bot: usize, left: usize, right: usize) {
        let mut cleared = false;
        let width = self.grid.width();
        let height = self.grid.height();

        if self.grid.default_bg() == -1 && right == width - 1 {
            // Erase fills with the terminal's default background here,
            // which is exactly what the model now contains.
            let clear_attrs = self.grid.clear_attrs();
            self.update_attrs(clear_attrs);

            if left == 0 && bot == height - 1 {
                if top == 0 {
                    self.emit_str(StrCap::ClearScreen, &[]);
                    // clear_screen homes the cursor.
                    self.wire_cursor = Some((0, 0));
                } else {
                    self.emit_goto(top, 0);
                    self.emit_str(StrCap::ClrEos, &[]);
                }
                cleared = true;
            }

            if !cleared {
                for row in top..=bot {
                    self.emit_goto(row, left);
                    self.emit_str(StrCap::ClrEol, &[]);
                }
                cleared = true;
            }
        }

        if !cleared {
            // No erase covers the area: paint the blanks from the grid.
            for row in top..=bot {
                self.emit_goto(row, left);
                for col in left..=right {
                    if let Some(cell) = self.grid.cell(row, col).copied() {
                        self.print_cell(cell);
                    }
                }
            }
        }

        let (row, col) = self.grid.cursor();
        self.emit_goto(row, col.min(width - 1));
    }

    /// Hardware scroll is usable when the region is the full screen, or
    /// the terminal has a scroll-region command and either the region
    /// spans every column or left/right margins are available.
    fn can_use_scroll(&self) -> bool {
        let region = self.grid.scroll_region();
        self.scroll_region_is_full_screen
            || (self.can_change_scroll_region
                && ((region.left == 0 && region.right == self.grid.width() - 1)
                    || self.can_set_lr_margin
                    || self.can_set_left_right_margin))
    }

    fn set_scroll_region_emit(&mut self) {
        let region = self.grid.scroll_region();
        self.emit_str(
            StrCap::ChangeScrollRegion,
            &[region.top as i64, region.bot as i64],
        );

        if region.left != 0 || region.right != self.grid.width() - 1 {
            self.emit_ext(ExtCap::EnableLrMargin, &[]);
            if self.can_set_lr_margin {
                self.emit_str(
                    StrCap::SetLrMargin,
                    &[region.left as i64, region.right as i64],
                );
            } else {
                self.emit_str(StrCap::SetLeftMarginParm, &[region.left as i64]);
                self.emit_str(StrCap::SetRightMarginParm, &[0, region.right as i64]);
            }
        }

        // DECSTBM and margin changes home the cursor.
        self.wire_cursor = None;
        let (row, col) = self.grid.cursor();
        self.emit_goto(row, col.min(self.grid.width() - 1));
    }

    fn reset_scroll_region_emit(&mut self) {
        let width = self.grid.width();
        let height = self.grid.height();
        let region = self.grid.scroll_region();

        if self.db.has_ext(ExtCap::ResetScrollRegion) {
            self.emit_ext(ExtCap::ResetScrollRegion, &[]);
        } else {
            self.emit_str(StrCap::ChangeScrollRegion, &[0, height as i64 - 1]);
        }

        if region.left != 0 || region.right != width - 1 {
            if self.can_set_lr_margin {
                self.emit_str(StrCap::SetLrMargin, &[0, width as i64 - 1]);
            } else {
                self.emit_str(StrCap::SetLeftMarginParm, &[0]);
                self.emit_str(StrCap::SetRightMarginParm, &[0, width as i64 - 1]);
            }
            self.emit_ext(ExtCap::DisableLrMargin, &[]);
        }

        self.wire_cursor = None;
        let (row, col) = self.grid.cursor();
        self.emit_goto(row, col.min(width - 1));
    }

    fn apply_mode(&mut self, mode: ModeIdx) {
        if !self.mode_table.enabled() {
            return;
        }
        let entry = self.mode_table.entry(mode);

        if entry.hl_id != 0
            && self.rgb
            && let Some(color) = self.hl.cursor_color(entry.hl_id)
        {
            self.emit_ext(ExtCap::SetCursorColor, &[i64::from(color)]);
        }

        if self.db.family() == TermFamily::Konsole {
            let template = self.db.tmux_wrap(KONSOLE_CURSOR_SHAPE);
            self.scratch.clear();
            expand_into(
                &mut self.scratch,
                &template,
                &[entry.shape.konsole_code(), i64::from(entry.blinkon != 0)],
            );
            self.out.write(&self.scratch, &mut self.sink);
        } else if self.vte_version.is_none_or(|v| v >= 3900) {
            // Anything not an old VTE is assumed to speak DECSCUSR.
            // tmux forwards it via its Ss/Se overrides, so no wrapping.
            let param = entry.shape.decscusr_base() + i64::from(entry.blinkon == 0);
            self.scratch.clear();
            expand_into(&mut self.scratch, DECSCUSR, &[param]);
            self.out.write(&self.scratch, &mut self.sink);
        }
    }

    /// Push the buffer to the device. With `toggle_cursor` (every
    /// command flush), the cursor-normal suffix goes out from the
    /// reserved tail and cursor-invisible is queued for the next paint.
    fn flush_buf(&mut self, toggle_cursor: bool) {
        let show = toggle_cursor && !self.busy;
        if show {
            self.out.release_tail(CURSOR_TAIL_RESERVE);
            self.emit_str(StrCap::CursorNormal, &[]);
        }
        self.out.flush_to(&mut self.sink);
        if show {
            self.out.reserve_tail(CURSOR_TAIL_RESERVE);
            // Hidden again from the first byte of the next flush.
            self.emit_str(StrCap::CursorInvisible, &[]);
        }
    }
}


#[cfg(test)]
mod mode_emission_tests {
    use super::{RenderOptions, Renderer};
    use crate::mode::{CursorShape, HighlightLookup, ModeEntry, ModeIdx};
    use quill_term::{TermDb, TermEnv};

    fn entries() -> Vec<ModeEntry> {
        let mut entries = vec![ModeEntry::default(); 3];
        entries[ModeIdx::Insert as usize] = ModeEntry {
            shape: CursorShape::Vertical,
            blinkon: 500,
            blinkoff: 500,
            ..ModeEntry::default()
        };
        entries
    }

    fn drain(r: &mut Renderer<Vec<u8>>) -> Vec<u8> {
        r.flush();
        std::mem::take(&mut r.sink)
    }

    fn contains(haystack: &[u8], needle: &[u8]) -> bool {
        haystack.windows(needle.len()).any(|w| w == needle)
    }

    #[test]
    fn decscusr_for_blinking_vertical_bar() {
        let db = TermDb::from_term_env(&TermEnv::with_term("xterm"));
        let mut r = Renderer::new(db, Vec::new(), RenderOptions::default());
        r.mode_info_set(true, &entries());
        r.mode_change("insert", ModeIdx::Insert as usize);
        let bytes = drain(&mut r);
        assert!(contains(&bytes, b"\x1b[5 q"));
    }

    #[test]
    fn steady_block_is_decscusr_two() {
        let db = TermDb::from_term_env(&TermEnv::with_term("xterm"));
        let mut r = Renderer::new(db, Vec::new(), RenderOptions::default());
        r.mode_info_set(true, &entries());
        r.mode_change("normal", ModeIdx::Normal as usize);
        let bytes = drain(&mut r);
        assert!(contains(&bytes, b"\x1b[2 q"));
    }

    #[test]
    fn disabled_styling_emits_nothing() {
        let db = TermDb::from_term_env(&TermEnv::with_term("xterm"));
        let mut r = Renderer::new(db, Vec::new(), RenderOptions::default());
        r.mode_info_set(false, &entries());
        r.mode_change("insert", ModeIdx::Insert as usize);
        let bytes = drain(&mut r);
        assert!(!contains(&bytes, b" q"));
    }

    #[test]
    fn re_enabling_applies_the_pending_mode() {
        let db = TermDb::from_term_env(&TermEnv::with_term("xterm"));
        let mut r = Renderer::new(db, Vec::new(), RenderOptions::default());
        r.mode_info_set(false, &entries());
        r.mode_change("insert", ModeIdx::Insert as usize);
        let _ = drain(&mut r);
        // The showing mode is insert; enabling must emit its shape.
        r.mode_info_set(true, &entries());
        let bytes = drain(&mut r);
        assert!(contains(&bytes, b"\x1b[5 q"));
    }

    #[test]
    fn konsole_uses_its_proprietary_sequence() {
        let env = TermEnv {
            konsole_profile: Some("Shell".into()),
            ..TermEnv::with_term("xterm-256color")
        };
        let db = TermDb::from_term_env(&env);
        let mut r = Renderer::new(db, Vec::new(), RenderOptions::default());
        r.mode_info_set(true, &entries());
        r.mode_change("insert", ModeIdx::Insert as usize);
        let bytes = drain(&mut r);
        assert!(contains(
            &bytes,
            b"\x1b]50;CursorShape=1;BlinkingCursorEnabled=1\x07"
        ));
        assert!(!contains(&bytes, b" q"));
    }

    #[test]
    fn konsole_inside_tmux_is_wrapped() {
        let env = TermEnv {
            konsole_profile: Some("Shell".into()),
            tmux: Some("/tmp/tmux".into()),
            ..TermEnv::with_term("screen-256color")
        };
        let db = TermDb::from_term_env(&env);
        let mut r = Renderer::new(db, Vec::new(), RenderOptions::default());
        r.mode_info_set(true, &entries());
        r.mode_change("insert", ModeIdx::Insert as usize);
        let bytes = drain(&mut r);
        assert!(contains(&bytes, b"\x1bPtmux;\x1b\x1b]50;CursorShape=1"));
        assert!(contains(&bytes, b"\x1b\\"));
    }

    #[test]
    fn old_vte_suppresses_shape_codes() {
        let db = TermDb::from_term_env(&TermEnv::with_term("xterm"));
        let mut r = Renderer::new(
            db,
            Vec::new(),
            RenderOptions {
                rgb: false,
                vte_version: Some(3405),
            },
        );
        r.mode_info_set(true, &entries());
        r.mode_change("insert", ModeIdx::Insert as usize);
        let bytes = drain(&mut r);
        assert!(!contains(&bytes, b" q"));
    }

    struct RedCursor;
    impl HighlightLookup for RedCursor {
        fn cursor_color(&self, hl_id: i32) -> Option<i32> {
            (hl_id == 7).then_some(0xff0000)
        }
    }

    #[test]
    fn cursor_color_follows_the_mode_highlight_in_rgb() {
        let db = TermDb::from_term_env(&TermEnv::with_term("xterm-256color"));
        let mut r = Renderer::new(
            db,
            Vec::new(),
            RenderOptions {
                rgb: true,
                vte_version: None,
            },
        );
        r.set_highlight_lookup(Box::new(RedCursor));
        let mut entries = entries();
        entries[ModeIdx::Insert as usize].hl_id = 7;
        r.mode_info_set(true, &entries);
        r.mode_change("insert", ModeIdx::Insert as usize);
        let bytes = drain(&mut r);
        assert!(contains(&bytes, b"\x1b]12;#ff0000\x07"));
    }

    #[test]
    fn cursor_color_suppressed_without_rgb() {
        let db = TermDb::from_term_env(&TermEnv::with_term("xterm-256color"));
        let mut r = Renderer::new(db, Vec::new(), RenderOptions::default());
        r.set_highlight_lookup(Box::new(RedCursor));
        let mut entries = entries();
        entries[ModeIdx::Insert as usize].hl_id = 7;
        r.mode_info_set(true, &entries);
        r.mode_change("insert", ModeIdx::Insert as usize);
        let bytes = drain(&mut r);
        assert!(!contains(&bytes, b"\x1b]12;"));
    }
}
