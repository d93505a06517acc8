#![forbid(unsafe_code)]

//! Built-in entries and the capability fix pass.
//!
//! [`base_entry`] plays the role of the system capability database: it
//! returns what a stock entry for the detected family would contain.
//! [`apply`] then runs the ordered patch table - fill what real entries
//! commonly omit, and override the handful of entries known to be wrong
//! in the wild. The distinction matters: fills use `set_if_empty`,
//! overrides replace unconditionally.
//!
//! Patch order is fixed and runs exactly once at startup:
//!
//! 1. family-specific fills (rxvt italics/bell/status, xterm status,
//!    screen/tmux status open+close);
//! 2. xterm/rxvt repairs (cursor-normal DECRST 12 strip, margins,
//!    scroll region, clear, back-color-erase);
//! 3. extension slots every terminal gets (margins, paste, focus,
//!    mouse, RGB SGR, cursor color);
//! 4. 256-color promotion when the environment promises more than the
//!    entry admits;
//! 5. window-resize and scroll-region-reset slots for the families
//!    documented to understand them;
//! 6. common fills for anything still empty.

use crate::caps::{BoolCap, ExtCap, NumCap, StrCap, TermDb};
use crate::detect::{TermEnv, TermFamily};

/// 256-color `setaf`: standard colors via SGR 30-37, bright via 90-97,
/// the rest via `38;5;N`.
pub const SETAF_256: &str =
    "\x1b[%?%p1%{8}%<%t3%p1%d%e%p1%{16}%<%t9%p1%{8}%-%d%e38;5;%p1%d%;m";

/// 256-color `setab`, same shape on the 40/100/48;5 ranges.
pub const SETAB_256: &str =
    "\x1b[%?%p1%{8}%<%t4%p1%d%e%p1%{16}%<%t10%p1%{8}%-%d%e48;5;%p1%d%;m";

const SETAF_8: &str = "\x1b[3%p1%dm";
const SETAB_8: &str = "\x1b[4%p1%dm";

/// Build the stock entry for the detected family.
///
/// This stands in for reading the terminfo database (a non-goal): the
/// fields below mirror what the real entries for these terminals carry,
/// including their known gaps - the patch pass exists to fix those.
#[must_use]
pub fn base_entry(env: &TermEnv) -> TermDb {
    let family = env.family();
    let mut db = TermDb::empty(family, env.in_tmux());

    match family {
        TermFamily::XTerm
        | TermFamily::Gnome
        | TermFamily::ITerm
        | TermFamily::Konsole
        | TermFamily::DTTerm
        | TermFamily::TeraTerm => {
            ansi_core(&mut db);
            line_ops(&mut db);
            db.set_str(StrCap::EnterCaMode, "\x1b[?1049h");
            db.set_str(StrCap::ExitCaMode, "\x1b[?1049l");
            // Stock xterm cursor_normal carries DECRST 12; the patch
            // pass strips it so cursor-shape control stays ours.
            db.set_str(StrCap::CursorNormal, "\x1b[?12l\x1b[?25h");
            db.set_str(StrCap::CursorInvisible, "\x1b[?25l");
            db.set_str(StrCap::EnterItalicsMode, "\x1b[3m");
            db.set_str(StrCap::SetAForeground, SETAF_8);
            db.set_str(StrCap::SetABackground, SETAB_8);
            db.set_str(StrCap::KeyBackspace, "\x7f");
            db.set_str(StrCap::KeyDeleteChar, "\x1b[3~");
            // Konsole, gnome-terminal and iTerm ship entries with the
            // title caps already present.
            if matches!(
                family,
                TermFamily::Konsole | TermFamily::Gnome | TermFamily::ITerm
            ) {
                db.set_str(StrCap::ToStatusLine, "\x1b]2;");
                db.set_str(StrCap::FromStatusLine, "\x07");
            }
        }
        TermFamily::Rxvt => {
            ansi_core(&mut db);
            line_ops(&mut db);
            db.set_str(StrCap::EnterCaMode, "\x1b7\x1b[?47h");
            db.set_str(StrCap::ExitCaMode, "\x1b[2J\x1b[?47l\x1b8");
            db.set_str(StrCap::CursorNormal, "\x1b[?25h");
            db.set_str(StrCap::CursorInvisible, "\x1b[?25l");
            db.clear_str(StrCap::ExitAttributeMode);
            db.set_str(StrCap::SetAForeground, SETAF_8);
            db.set_str(StrCap::SetABackground, SETAB_8);
            db.set_str(StrCap::KeyBackspace, "\x08");
            db.set_str(StrCap::KeyDeleteChar, "\x1b[3~");
        }
        TermFamily::Screen => {
            ansi_core(&mut db);
            line_ops(&mut db);
            db.set_str(StrCap::EnterCaMode, "\x1b[?1049h");
            db.set_str(StrCap::ExitCaMode, "\x1b[?1049l");
            db.set_str(StrCap::CursorNormal, "\x1b[34h\x1b[?25h");
            db.set_str(StrCap::CursorInvisible, "\x1b[?25l");
            db.set_str(StrCap::SetAForeground, SETAF_8);
            db.set_str(StrCap::SetABackground, SETAB_8);
            db.set_str(StrCap::FlashScreen, "\x1bg");
            db.set_str(StrCap::KeyBackspace, "\x7f");
            db.set_str(StrCap::KeyDeleteChar, "\x1b[3~");
        }
        TermFamily::Linux => {
            ansi_core(&mut db);
            line_ops(&mut db);
            db.set_str(StrCap::CursorNormal, "\x1b[?25h\x1b[?0c");
            db.set_str(StrCap::CursorInvisible, "\x1b[?25l\x1b[?1c");
            db.set_str(StrCap::SetAForeground, SETAF_8);
            db.set_str(StrCap::SetABackground, SETAB_8);
            db.set_bool(BoolCap::BackColorErase, true);
            db.set_str(StrCap::KeyBackspace, "\x7f");
            db.set_str(StrCap::KeyDeleteChar, "\x1b[3~");
        }
        TermFamily::Vt100 => {
            db.set_str(StrCap::CursorAddress, "\x1b[%i%p1%d;%p2%dH");
            db.set_str(StrCap::ClearScreen, "\x1b[H\x1b[J");
            db.set_str(StrCap::ClrEol, "\x1b[K");
            db.set_str(StrCap::ClrEos, "\x1b[J");
            db.set_str(StrCap::ChangeScrollRegion, "\x1b[%i%p1%d;%p2%dr");
            db.set_str(StrCap::ExitAttributeMode, "\x1b[m");
            db.set_str(StrCap::EnterBoldMode, "\x1b[1m");
            db.set_str(StrCap::EnterUnderlineMode, "\x1b[4m");
            db.set_str(StrCap::EnterReverseMode, "\x1b[7m");
            db.set_str(StrCap::Bell, "\x07");
            db.set_str(StrCap::KeyBackspace, "\x08");
        }
        TermFamily::Unknown => {
            // Nothing: the common fills below produce a plain ANSI set.
        }
    }

    db
}

/// The ANSI operations shared by every full-featured family.
fn ansi_core(db: &mut TermDb) {
    db.set_str(StrCap::CursorAddress, "\x1b[%i%p1%d;%p2%dH");
    db.set_str(StrCap::ClearScreen, "\x1b[H\x1b[2J");
    db.set_str(StrCap::ClrEol, "\x1b[K");
    db.set_str(StrCap::ClrEos, "\x1b[J");
    db.set_str(StrCap::ChangeScrollRegion, "\x1b[%i%p1%d;%p2%dr");
    db.set_str(StrCap::ExitAttributeMode, "\x1b(B\x1b[m");
    db.set_str(StrCap::EnterBoldMode, "\x1b[1m");
    db.set_str(StrCap::EnterUnderlineMode, "\x1b[4m");
    db.set_str(StrCap::EnterReverseMode, "\x1b[7m");
    db.set_str(StrCap::Bell, "\x07");
}

fn line_ops(db: &mut TermDb) {
    db.set_str(StrCap::DeleteLine, "\x1b[M");
    db.set_str(StrCap::ParmDeleteLine, "\x1b[%p1%dM");
    db.set_str(StrCap::InsertLine, "\x1b[L");
    db.set_str(StrCap::ParmInsertLine, "\x1b[%p1%dL");
}

/// Run the ordered patch table over a freshly built entry.
pub fn apply(db: &mut TermDb, env: &TermEnv) {
    let family = db.family();
    let term = env.term();

    // 1. Family-specific fills.
    if family == TermFamily::Rxvt {
        db.set_if_empty(StrCap::ExitAttributeMode, "\x1b[m\x1b(B");
        db.set_if_empty(StrCap::FlashScreen, "\x1b[?5h$<20/>\x1b[?5l");
        db.set_if_empty(StrCap::EnterItalicsMode, "\x1b[3m");
        db.set_if_empty(StrCap::ToStatusLine, "\x1b]2");
    } else if family == TermFamily::XTerm {
        db.set_if_empty(StrCap::ToStatusLine, "\x1b]0;");
    } else if term.starts_with("screen") || term.starts_with("tmux") {
        db.set_if_empty(StrCap::ToStatusLine, "\x1b_");
        db.set_if_empty(StrCap::FromStatusLine, "\x1b\\");
    }

    // 2. xterm/rxvt repairs.
    if matches!(family, TermFamily::XTerm | TermFamily::Rxvt) {
        match db.get_str(StrCap::CursorNormal) {
            None => db.set_str(StrCap::CursorNormal, "\x1b[?25h"),
            Some(normal) => {
                // Entries bundle DECRST 12 into cursor_normal, which
                // fights explicit cursor-shape control. Keep the rest.
                if let Some(rest) = normal.strip_prefix("\x1b[?12l") {
                    let rest = rest.to_string();
                    db.set_str(StrCap::CursorNormal, &rest);
                }
            }
        }
        db.set_if_empty(StrCap::CursorInvisible, "\x1b[?25l");
        db.set_if_empty(StrCap::FlashScreen, "\x1b[?5h$<100/>\x1b[?5l");
        db.set_if_empty(StrCap::ExitAttributeMode, "\x1b(B\x1b[m");
        db.set_if_empty(StrCap::SetLrMargin, "\x1b[%i%p1%d;%p2%ds");
        db.set_if_empty(StrCap::SetLeftMarginParm, "\x1b[%i%p1%ds");
        db.set_if_empty(StrCap::SetRightMarginParm, "\x1b[%i;%p2%ds");
        db.set_if_empty(StrCap::ChangeScrollRegion, "\x1b[%i%p1%d;%p2%dr");
        db.set_if_empty(StrCap::ClearScreen, "\x1b[H\x1b[2J");
        db.set_if_empty(StrCap::FromStatusLine, "\x07");
        db.set_bool(BoolCap::BackColorErase, true);
    }

    // 3. Extension slots every terminal gets.
    db.set_ext(ExtCap::EnableLrMargin, "\x1b[?69h");
    db.set_ext(ExtCap::DisableLrMargin, "\x1b[?69l");
    db.set_ext(ExtCap::EnableBracketedPaste, "\x1b[?2004h");
    db.set_ext(ExtCap::DisableBracketedPaste, "\x1b[?2004l");
    db.set_ext(ExtCap::EnableFocusReporting, "\x1b[?1004h");
    db.set_ext(ExtCap::DisableFocusReporting, "\x1b[?1004l");

    // 4. 256-color promotion: Linux 4.8+ and every xterm-alike speak
    //    256-color SGR even when the entry admits only 8.
    if env.promises_256_colors() {
        db.set_num(NumCap::MaxColors, 256);
        db.set_str(StrCap::SetAForeground, SETAF_256);
        db.set_str(StrCap::SetABackground, SETAB_256);
    }

    // 5. Window resize, only where the extension is documented.
    if matches!(
        family,
        TermFamily::DTTerm
            | TermFamily::XTerm
            | TermFamily::Konsole
            | TermFamily::TeraTerm
            | TermFamily::Rxvt
    ) {
        db.set_ext(ExtCap::ResizeScreen, "\x1b[8;%p1%d;%p2%dt");
    }

    if matches!(family, TermFamily::XTerm | TermFamily::Rxvt) {
        db.set_ext(ExtCap::ResetScrollRegion, "\x1b[r");
    }

    // Cursor color: iTerm has its own OSC; everything else takes OSC 12.
    // Both travel through tmux wrapped, or the outer tmux eats them.
    let cursor_color = if family == TermFamily::ITerm {
        db.tmux_wrap("\x1b]Pl%p1%06x\x1b\\")
    } else {
        db.tmux_wrap("\x1b]12;#%p1%06x\x07")
    };
    db.set_ext(ExtCap::SetCursorColor, &cursor_color);

    db.set_ext(ExtCap::EnableMouse, "\x1b[?1002h\x1b[?1006h");
    db.set_ext(ExtCap::DisableMouse, "\x1b[?1002l\x1b[?1006l");
    db.set_ext(ExtCap::SetRgbForeground, "\x1b[38;2;%p1%d;%p2%d;%p3%dm");
    db.set_ext(ExtCap::SetRgbBackground, "\x1b[48;2;%p1%d;%p2%d;%p3%dm");

    // 6. Common fills for anything still empty.
    db.set_if_empty(StrCap::CursorAddress, "\x1b[%i%p1%d;%p2%dH");
    db.set_if_empty(StrCap::ExitAttributeMode, "\x1b[0;10m");
    db.set_if_empty(StrCap::SetAForeground, SETAF_256);
    db.set_if_empty(StrCap::SetABackground, SETAB_256);
    db.set_if_empty(StrCap::EnterBoldMode, "\x1b[1m");
    db.set_if_empty(StrCap::EnterUnderlineMode, "\x1b[4m");
    db.set_if_empty(StrCap::EnterReverseMode, "\x1b[7m");
    db.set_if_empty(StrCap::Bell, "\x07");
    db.set_if_empty(StrCap::EnterCaMode, "\x1b[?1049h");
    db.set_if_empty(StrCap::ExitCaMode, "\x1b[?1049l");
    db.set_if_empty(StrCap::DeleteLine, "\x1b[M");
    db.set_if_empty(StrCap::ParmDeleteLine, "\x1b[%p1%dM");
    db.set_if_empty(StrCap::InsertLine, "\x1b[L");
    db.set_if_empty(StrCap::ParmInsertLine, "\x1b[%p1%dL");
    db.set_if_empty(StrCap::ClearScreen, "\x1b[H\x1b[J");
    db.set_if_empty(StrCap::ClrEol, "\x1b[K");
    db.set_if_empty(StrCap::ClrEos, "\x1b[J");
    db.set_if_empty(StrCap::CursorNormal, "\x1b[?25h");
    db.set_if_empty(StrCap::CursorInvisible, "\x1b[?25l");
}

#[cfg(test)]
mod tests {
    use super::{SETAB_256, SETAF_256};
    use crate::caps::{BoolCap, ExtCap, NumCap, StrCap, TermDb};
    use crate::detect::TermEnv;

    fn db_for(term: &str) -> TermDb {
        TermDb::from_term_env(&TermEnv::with_term(term))
    }

    #[test]
    fn xterm_gets_256_colors_even_with_an_8_color_entry() {
        let db = db_for("xterm");
        assert_eq!(db.get_num(NumCap::MaxColors), 256);
        assert_eq!(db.get_str(StrCap::SetAForeground), Some(SETAF_256));
        assert_eq!(db.get_str(StrCap::SetABackground), Some(SETAB_256));
    }

    #[test]
    fn xterm_cursor_normal_drops_the_blink_reset() {
        let db = db_for("xterm-256color");
        assert_eq!(db.get_str(StrCap::CursorNormal), Some("\x1b[?25h"));
    }

    #[test]
    fn xterm_has_margins_resize_and_region_reset() {
        let db = db_for("xterm");
        assert!(db.has(StrCap::SetLrMargin));
        assert!(db.has(StrCap::SetLeftMarginParm));
        assert!(db.has(StrCap::SetRightMarginParm));
        assert_eq!(db.get_ext(ExtCap::ResizeScreen), Some("\x1b[8;%p1%d;%p2%dt"));
        assert_eq!(db.get_ext(ExtCap::ResetScrollRegion), Some("\x1b[r"));
        assert!(db.get_bool(BoolCap::BackColorErase));
        assert_eq!(db.get_str(StrCap::ToStatusLine), Some("\x1b]0;"));
        assert_eq!(db.get_str(StrCap::FromStatusLine), Some("\x07"));
    }

    #[test]
    fn rxvt_gets_italics_flash_and_its_status_line() {
        let db = db_for("rxvt-unicode");
        assert_eq!(db.get_str(StrCap::EnterItalicsMode), Some("\x1b[3m"));
        assert_eq!(db.get_str(StrCap::ExitAttributeMode), Some("\x1b[m\x1b(B"));
        assert_eq!(
            db.get_str(StrCap::FlashScreen),
            Some("\x1b[?5h$<20/>\x1b[?5l")
        );
        assert_eq!(db.get_str(StrCap::ToStatusLine), Some("\x1b]2"));
        assert!(db.has_ext(ExtCap::ResizeScreen));
    }

    #[test]
    fn screen_gets_status_codes_but_no_margins() {
        let db = db_for("screen-256color");
        assert_eq!(db.get_str(StrCap::ToStatusLine), Some("\x1b_"));
        assert_eq!(db.get_str(StrCap::FromStatusLine), Some("\x1b\\"));
        assert!(!db.has(StrCap::SetLrMargin));
        assert!(!db.has(StrCap::SetLeftMarginParm));
        assert!(!db.has_ext(ExtCap::ResizeScreen));
        assert!(!db.has_ext(ExtCap::ResetScrollRegion));
    }

    #[test]
    fn linux_console_is_promoted_to_256_colors() {
        let db = db_for("linux");
        assert_eq!(db.get_num(NumCap::MaxColors), 256);
        assert!(db.get_bool(BoolCap::BackColorErase));
        assert!(!db.has_ext(ExtCap::ResizeScreen));
    }

    #[test]
    fn vt100_keeps_its_minimal_set() {
        let db = db_for("vt100");
        assert_eq!(db.get_num(NumCap::MaxColors), 8);
        assert!(db.has(StrCap::ChangeScrollRegion));
        assert!(!db.has(StrCap::SetLrMargin));
        assert!(!db.has_ext(ExtCap::ResizeScreen));
        // Common fills still give it the ANSI basics.
        assert!(db.has(StrCap::DeleteLine));
        assert!(db.has(StrCap::CursorNormal));
    }

    #[test]
    fn unknown_terminal_still_gets_a_working_ansi_set() {
        let db = db_for("mystery-term");
        assert_eq!(db.get_str(StrCap::CursorAddress), Some("\x1b[%i%p1%d;%p2%dH"));
        assert_eq!(db.get_str(StrCap::ExitAttributeMode), Some("\x1b[0;10m"));
        assert_eq!(db.get_str(StrCap::ClearScreen), Some("\x1b[H\x1b[J"));
        assert!(db.has_ext(ExtCap::EnableMouse));
        assert!(db.has_ext(ExtCap::EnableBracketedPaste));
    }

    #[test]
    fn every_terminal_gets_the_shared_extensions() {
        for term in ["xterm", "rxvt", "screen", "linux", "vt100", "nope"] {
            let db = db_for(term);
            assert_eq!(db.get_ext(ExtCap::EnableMouse), Some("\x1b[?1002h\x1b[?1006h"));
            assert_eq!(db.get_ext(ExtCap::DisableMouse), Some("\x1b[?1002l\x1b[?1006l"));
            assert_eq!(db.get_ext(ExtCap::EnableBracketedPaste), Some("\x1b[?2004h"));
            assert_eq!(db.get_ext(ExtCap::EnableFocusReporting), Some("\x1b[?1004h"));
            assert_eq!(db.get_ext(ExtCap::EnableLrMargin), Some("\x1b[?69h"));
            assert_eq!(
                db.get_ext(ExtCap::SetRgbForeground),
                Some("\x1b[38;2;%p1%d;%p2%d;%p3%dm")
            );
        }
    }

    #[test]
    fn cursor_color_wraps_for_tmux() {
        let plain = db_for("xterm");
        assert_eq!(
            plain.get_ext(ExtCap::SetCursorColor),
            Some("\x1b]12;#%p1%06x\x07")
        );

        let env = TermEnv {
            tmux: Some("/tmp/tmux-1000/default,1234,0".into()),
            ..TermEnv::with_term("screen-256color")
        };
        let wrapped = TermDb::from_term_env(&env);
        assert_eq!(
            wrapped.get_ext(ExtCap::SetCursorColor),
            Some("\x1bPtmux;\x1b\x1b]12;#%p1%06x\x07\x1b\\")
        );
    }

    #[test]
    fn iterm_uses_its_proprietary_cursor_color() {
        let env = TermEnv {
            term_program: Some("iTerm.app".into()),
            ..TermEnv::with_term("xterm-256color")
        };
        let db = TermDb::from_term_env(&env);
        assert_eq!(
            db.get_ext(ExtCap::SetCursorColor),
            Some("\x1b]Pl%p1%06x\x1b\\")
        );
    }

    #[test]
    fn plain_vt100_keeps_8_color_entry_untouched() {
        let db = db_for("vt100");
        // No COLORTERM promise: setaf comes from the common fill, which
        // is safe on a colorless terminal because it is never consulted
        // when max_colors stays at 8.
        assert_eq!(db.get_num(NumCap::MaxColors), 8);
    }
}
