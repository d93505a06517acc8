#![forbid(unsafe_code)]

//! Terminal family detection.
//!
//! Detection is based on environment variables only; no bytes are sent
//! to the terminal. Given the same environment the result is always the
//! same.
//!
//! # Inputs
//!
//! | Variable | Used for |
//! |----------|----------|
//! | `TERM` | primary family match (`xterm*`, `rxvt*`, ...) |
//! | `COLORTERM` | gnome-terminal detection, 256-color promotion |
//! | `KONSOLE_PROFILE_NAME`, `KONSOLE_DBUS_SESSION` | Konsole |
//! | `TERM_PROGRAM` | iTerm |
//! | `VTE_VERSION` | old-VTE cursor-shape suppression |
//! | `TMUX` | passthrough wrapping |
//! | `LINES`, `COLUMNS` | size probe fallback |

use std::env;

/// Recognised terminal families.
///
/// Families gate capability patches; an unknown terminal still gets the
/// common fills, just none of the family-specific overrides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TermFamily {
    Unknown,
    Gnome,
    ITerm,
    Konsole,
    Rxvt,
    DTTerm,
    XTerm,
    TeraTerm,
    Screen,
    Linux,
    Vt100,
}

/// Snapshot of the environment variables that drive detection.
///
/// Kept as plain data so tests can fabricate any terminal without
/// touching the process environment.
#[derive(Debug, Clone, Default)]
pub struct TermEnv {
    pub term: Option<String>,
    pub colorterm: Option<String>,
    pub term_program: Option<String>,
    pub konsole_profile: Option<String>,
    pub konsole_dbus: Option<String>,
    pub vte_version: Option<String>,
    pub tmux: Option<String>,
    pub lines: Option<String>,
    pub columns: Option<String>,
}

impl TermEnv {
    /// Snapshot the real process environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            term: env::var("TERM").ok(),
            colorterm: env::var("COLORTERM").ok(),
            term_program: env::var("TERM_PROGRAM").ok(),
            konsole_profile: env::var("KONSOLE_PROFILE_NAME").ok(),
            konsole_dbus: env::var("KONSOLE_DBUS_SESSION").ok(),
            vte_version: env::var("VTE_VERSION").ok(),
            tmux: env::var("TMUX").ok(),
            lines: env::var("LINES").ok(),
            columns: env::var("COLUMNS").ok(),
        }
    }

    /// Convenience constructor for tests: a bare `TERM`.
    #[must_use]
    pub fn with_term(term: &str) -> Self {
        Self {
            term: Some(term.to_string()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn term(&self) -> &str {
        self.term.as_deref().unwrap_or("")
    }

    #[must_use]
    pub fn colorterm(&self) -> &str {
        self.colorterm.as_deref().unwrap_or("")
    }

    /// True when an enclosing tmux is visible (`$TMUX` set).
    #[must_use]
    pub fn in_tmux(&self) -> bool {
        self.tmux.is_some()
    }

    /// VTE version as an integer, if advertised.
    #[must_use]
    pub fn vte_version(&self) -> Option<u32> {
        self.vte_version.as_deref()?.trim().parse().ok()
    }

    /// `$LINES`/`$COLUMNS` as a `(width, height)` pair, when both parse.
    #[must_use]
    pub fn size_hint(&self) -> Option<(u16, u16)> {
        let height = self.lines.as_deref()?.trim().parse().ok()?;
        let width = self.columns.as_deref()?.trim().parse().ok()?;
        Some((width, height))
    }

    /// Detect the terminal family.
    ///
    /// Konsole and iTerm advertise themselves through dedicated
    /// variables and win over the `TERM` prefix, which they typically
    /// leave at `xterm-256color`.
    #[must_use]
    pub fn family(&self) -> TermFamily {
        let term = self.term();

        if term.starts_with("rxvt") {
            return TermFamily::Rxvt;
        }
        if self.konsole_profile.is_some() || self.konsole_dbus.is_some() {
            return TermFamily::Konsole;
        }
        if self
            .term_program
            .as_deref()
            .is_some_and(|p| p.contains("iTerm.app"))
        {
            return TermFamily::ITerm;
        }
        if self.colorterm().contains("gnome-terminal") {
            return TermFamily::Gnome;
        }
        if term.starts_with("xterm") {
            return TermFamily::XTerm;
        }
        if term.starts_with("dtterm") {
            return TermFamily::DTTerm;
        }
        if term.starts_with("teraterm") {
            return TermFamily::TeraTerm;
        }
        if term.starts_with("screen") || term.starts_with("tmux") {
            return TermFamily::Screen;
        }
        if term.starts_with("linux") {
            return TermFamily::Linux;
        }
        if term.starts_with("vt100") || term.starts_with("vt102") || term.starts_with("vt220") {
            return TermFamily::Vt100;
        }
        TermFamily::Unknown
    }

    /// Whether the environment promises (or strongly implies) 256-color
    /// SGR support even if the base entry says 8.
    #[must_use]
    pub fn promises_256_colors(&self) -> bool {
        let term = self.term();
        self.colorterm().contains("256")
            || term.starts_with("linux")
            || term.contains("256")
            || term.contains("xterm")
    }
}
