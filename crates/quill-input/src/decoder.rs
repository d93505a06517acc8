#![forbid(unsafe_code)]

//! The terminal input decoder.
//!
//! Byte-level decoding is delegated to the crossterm backend; this
//! module owns the policy around it:
//!
//! - translation into the canonical [`Event`] types, dropping (and
//!   logging) anything the core has no representation for;
//! - the Backspace/Delete swap computed by the capability layer from
//!   VERASE;
//! - bracketed paste framed between explicit start/end markers;
//! - the VERASE probe itself, via termios on the controlling tty.
//!
//! Resize is deliberately absent here: SIGWINCH owns it.

use std::io;
use std::time::Duration;

use crossterm::event as cte;
use quill_term::{BackspaceFix, CTRL_H, DEL};

use crate::event::{Event, KeyCode, KeyEvent, Modifiers, MouseButton, MouseEvent, MouseEventKind};

/// Key remapping derived from a [`BackspaceFix`].
///
/// The backend has already collapsed the raw bytes into named keys, so
/// the fix is applied at the event level: `0x7f` arrives as `Backspace`
/// and `0x08` as `Ctrl+H`.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeyFix {
    /// Backspace is the `^H` byte: `Ctrl+H` becomes `Backspace`.
    bs_is_ctrl_h: bool,
    /// Delete was re-pointed at the DEL byte: plain `Backspace` (the
    /// DEL byte) becomes `Delete`.
    del_is_del_byte: bool,
    /// Delete was re-pointed at the `^H` byte.
    del_is_ctrl_h: bool,
}

impl KeyFix {
    /// Derive the event-level remap from the capability-level fix.
    #[must_use]
    pub fn from_fix(fix: &BackspaceFix) -> Self {
        Self {
            bs_is_ctrl_h: fix.key_backspace.as_deref() == Some(CTRL_H),
            del_is_del_byte: fix.key_delete.as_deref() == Some(DEL),
            del_is_ctrl_h: fix.key_delete.as_deref() == Some(CTRL_H),
        }
    }

    fn remap(&self, code: KeyCode, modifiers: Modifiers) -> (KeyCode, Modifiers) {
        match code {
            KeyCode::Backspace if self.bs_is_ctrl_h && self.del_is_del_byte => {
                // The DEL byte no longer means Backspace here.
                (KeyCode::Delete, modifiers)
            }
            KeyCode::Char('h') if modifiers.contains(Modifiers::CTRL) => {
                if self.bs_is_ctrl_h {
                    (KeyCode::Backspace, modifiers - Modifiers::CTRL)
                } else if self.del_is_ctrl_h {
                    (KeyCode::Delete, modifiers - Modifiers::CTRL)
                } else {
                    (code, modifiers)
                }
            }
            _ => (code, modifiers),
        }
    }
}

/// Decoder over the terminal input stream.
#[derive(Debug, Default)]
pub struct InputDecoder {
    fix: KeyFix,
}

impl InputDecoder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Install the Backspace/Delete remap.
    pub fn set_key_fix(&mut self, fix: KeyFix) {
        self.fix = fix;
    }

    /// True when an event is available within `timeout`.
    pub fn poll(&self, timeout: Duration) -> io::Result<bool> {
        cte::poll(timeout)
    }

    /// Read one backend event and append its canonical translation to
    /// `out`. Undecodable events are logged and dropped; a bracketed
    /// paste expands to its marker pair around the payload.
    pub fn read_into(&mut self, out: &mut Vec<Event>) -> io::Result<()> {
        let event = cte::read()?;
        self.translate_into(event, out);
        Ok(())
    }

    /// Pure translation step, separated for tests.
    pub fn translate_into(&self, event: cte::Event, out: &mut Vec<Event>) {
        match event {
            cte::Event::Key(key) => {
                if key.kind == cte::KeyEventKind::Release {
                    return;
                }
                let Some(code) = translate_keycode(key.code) else {
                    tracing::debug!(?key, "discarding unmapped key");
                    return;
                };
                let modifiers = translate_modifiers(key.modifiers);
                let (code, modifiers) = self.fix.remap(code, modifiers);
                out.push(Event::Key(KeyEvent { code, modifiers }));
            }
            cte::Event::Mouse(mouse) => {
                let Some(kind) = translate_mouse_kind(mouse.kind) else {
                    tracing::debug!(?mouse, "discarding unmapped mouse event");
                    return;
                };
                out.push(Event::Mouse(MouseEvent {
                    kind,
                    row: mouse.row,
                    col: mouse.column,
                    modifiers: translate_modifiers(mouse.modifiers),
                }));
            }
            cte::Event::Paste(text) => {
                out.push(Event::PasteStart);
                out.push(Event::Paste(text));
                out.push(Event::PasteEnd);
            }
            cte::Event::FocusGained => out.push(Event::FocusGained),
            cte::Event::FocusLost => out.push(Event::FocusLost),
            // The signal path owns resize; the backend's version would
            // race it and is dropped.
            cte::Event::Resize(..) => {}
        }
    }
}

fn translate_keycode(code: cte::KeyCode) -> Option<KeyCode> {
    Some(match code {
        cte::KeyCode::Char(c) => KeyCode::Char(c),
        cte::KeyCode::Enter => KeyCode::Enter,
        cte::KeyCode::Esc => KeyCode::Escape,
        cte::KeyCode::Backspace => KeyCode::Backspace,
        cte::KeyCode::Tab => KeyCode::Tab,
        cte::KeyCode::BackTab => KeyCode::BackTab,
        cte::KeyCode::Delete => KeyCode::Delete,
        cte::KeyCode::Insert => KeyCode::Insert,
        cte::KeyCode::Home => KeyCode::Home,
        cte::KeyCode::End => KeyCode::End,
        cte::KeyCode::PageUp => KeyCode::PageUp,
        cte::KeyCode::PageDown => KeyCode::PageDown,
        cte::KeyCode::Up => KeyCode::Up,
        cte::KeyCode::Down => KeyCode::Down,
        cte::KeyCode::Left => KeyCode::Left,
        cte::KeyCode::Right => KeyCode::Right,
        cte::KeyCode::F(n) => KeyCode::F(n),
        cte::KeyCode::Null => KeyCode::Null,
        _ => return None,
    })
}

fn translate_modifiers(mods: cte::KeyModifiers) -> Modifiers {
    let mut out = Modifiers::empty();
    if mods.contains(cte::KeyModifiers::SHIFT) {
        out |= Modifiers::SHIFT;
    }
    if mods.contains(cte::KeyModifiers::ALT) {
        out |= Modifiers::ALT;
    }
    if mods.contains(cte::KeyModifiers::CONTROL) {
        out |= Modifiers::CTRL;
    }
    out
}

fn translate_mouse_kind(kind: cte::MouseEventKind) -> Option<MouseEventKind> {
    Some(match kind {
        cte::MouseEventKind::Down(b) => MouseEventKind::Press(translate_button(b)?),
        cte::MouseEventKind::Drag(b) => MouseEventKind::Drag(translate_button(b)?),
        cte::MouseEventKind::Up(b) => MouseEventKind::Release(translate_button(b)?),
        cte::MouseEventKind::ScrollUp => MouseEventKind::WheelUp,
        cte::MouseEventKind::ScrollDown => MouseEventKind::WheelDown,
        _ => return None,
    })
}

fn translate_button(button: cte::MouseButton) -> Option<MouseButton> {
    Some(match button {
        cte::MouseButton::Left => MouseButton::Left,
        cte::MouseButton::Middle => MouseButton::Middle,
        cte::MouseButton::Right => MouseButton::Right,
    })
}

/// The terminal size as reported by the tty driver, when it looks sane.
#[must_use]
pub fn tty_size() -> Option<(u16, u16)> {
    crossterm::terminal::size()
        .ok()
        .filter(|&(w, h)| w > 0 && h > 0)
}

/// The tty driver's VERASE byte (what the user's Backspace sends).
///
/// Returns `None` when there is no controlling tty or termios cannot be
/// read - the capability layer then leaves the entry untouched.
#[cfg(unix)]
#[must_use]
pub fn verase() -> Option<u8> {
    let tty = std::fs::File::open("/dev/tty").ok()?;
    let termios = nix::sys::termios::tcgetattr(&tty).ok()?;
    let byte = termios.control_chars[nix::sys::termios::SpecialCharacterIndices::VERASE as usize];
    (byte != 0).then_some(byte)
}

#[cfg(not(unix))]
#[must_use]
pub fn verase() -> Option<u8> {
    None
}

/// Toggle O_NONBLOCK on stdin. Suspend switches the fd to blocking so
/// the shell behaves, and back to non-blocking on resume.
#[cfg(unix)]
pub fn set_stdin_blocking(blocking: bool) -> io::Result<()> {
    use nix::fcntl::{F_GETFL, F_SETFL, OFlag, fcntl};

    let stdin = io::stdin();
    let flags = fcntl(&stdin, F_GETFL).map_err(io::Error::other)?;
    let mut flags = OFlag::from_bits_truncate(flags);
    flags.set(OFlag::O_NONBLOCK, !blocking);
    fcntl(&stdin, F_SETFL(flags)).map_err(io::Error::other)?;
    Ok(())
}

#[cfg(not(unix))]
pub fn set_stdin_blocking(_blocking: bool) -> io::Result<()> {
    Ok(())
}
