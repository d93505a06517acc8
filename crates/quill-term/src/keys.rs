#![forbid(unsafe_code)]

//! Backspace/Delete reconciliation.
//!
//! Database `kbs` entries are unreliable: what actually arrives for the
//! Backspace key is whatever the tty driver's VERASE character is, and
//! the two frequently disagree (`^H` vs `DEL`). Shells and multiplexers
//! solve this by asking termios, and so do we:
//!
//! - if VERASE is known and differs from the entry's `key_backspace`,
//!   VERASE wins;
//! - if the entry's `key_delete` then collides with the resolved
//!   Backspace, Delete is re-pointed at the opposite byte, so the two
//!   keys stay distinguishable.

use crate::caps::{StrCap, TermDb};

/// The DEL byte, `0x7f`.
pub const DEL: &str = "\x7f";
/// The `^H` byte, `0x08`.
pub const CTRL_H: &str = "\x08";

/// Resolved overrides for the two contested keys.
///
/// `None` means "keep whatever the entry says".
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BackspaceFix {
    pub key_backspace: Option<String>,
    pub key_delete: Option<String>,
}

impl BackspaceFix {
    /// Compute the overrides from the tty's VERASE byte and the entry's
    /// current `kbs`/`kdch1` values.
    #[must_use]
    pub fn resolve(verase: Option<u8>, kbs: Option<&str>, kdch1: Option<&str>) -> Self {
        let mut fix = Self::default();

        let Some(erase) = verase.filter(|&b| b != 0) else {
            return fix;
        };
        let erase_str = String::from(erase as char);

        if kbs != Some(erase_str.as_str()) {
            fix.key_backspace = Some(erase_str.clone());
        }

        // "If Backspace and Delete are now the same, redefine Delete."
        if kdch1.is_some() && kdch1 == Some(erase_str.as_str()) {
            fix.key_delete = Some(if erase_str == DEL { CTRL_H } else { DEL }.to_string());
        }

        fix
    }

    /// Compute the overrides directly against a database.
    #[must_use]
    pub fn for_db(db: &TermDb, verase: Option<u8>) -> Self {
        Self::resolve(
            verase,
            db.get_str(StrCap::KeyBackspace),
            db.get_str(StrCap::KeyDeleteChar),
        )
    }

    /// Write the overrides into the database.
    pub fn apply(&self, db: &mut TermDb) {
        if let Some(kbs) = &self.key_backspace {
            db.set_str(StrCap::KeyBackspace, kbs);
        }
        if let Some(kdch1) = &self.key_delete {
            db.set_str(StrCap::KeyDeleteChar, kdch1);
        }
    }

    /// True when no override was needed.
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.key_backspace.is_none() && self.key_delete.is_none()
    }
}
