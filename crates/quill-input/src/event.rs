#![forbid(unsafe_code)]

//! Canonical input events.
//!
//! These are the logical events the UI side delivers to the editor
//! core. Coordinates are 0-indexed. Pasted text travels between
//! explicit start/end markers so the core can suppress mappings and
//! indentation for the payload.

use bitflags::bitflags;

/// A logical input event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// A keyboard event.
    Key(KeyEvent),
    /// A mouse event.
    Mouse(MouseEvent),
    /// Bracketed paste began.
    PasteStart,
    /// Pasted text (between the start/end markers).
    Paste(String),
    /// Bracketed paste ended.
    PasteEnd,
    /// The terminal gained focus.
    FocusGained,
    /// The terminal lost focus.
    FocusLost,
    /// New terminal dimensions, synthesised from SIGWINCH.
    Resize { width: u16, height: u16 },
}

bitflags! {
    /// Modifier mask carried by key and mouse events.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Modifiers: u8 {
        const SHIFT = 0b001;
        const ALT   = 0b010;
        const CTRL  = 0b100;
    }
}

/// A key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    pub code: KeyCode,
    pub modifiers: Modifiers,
}

impl KeyEvent {
    #[must_use]
    pub const fn new(code: KeyCode) -> Self {
        Self {
            code,
            modifiers: Modifiers::empty(),
        }
    }

    #[must_use]
    pub const fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }
}

/// Named keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCode {
    /// A printable character (including keypad digits/operators).
    Char(char),
    Enter,
    Escape,
    Backspace,
    Tab,
    BackTab,
    Delete,
    Insert,
    Home,
    End,
    PageUp,
    PageDown,
    Up,
    Down,
    Left,
    Right,
    /// Function key (F1-F24).
    F(u8),
    /// NUL (Ctrl-Space / Ctrl-@).
    Null,
}

/// A mouse event: button/wheel action plus the cell it happened in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MouseEvent {
    pub kind: MouseEventKind,
    pub row: u16,
    pub col: u16,
    pub modifiers: Modifiers,
}

/// What the mouse did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseEventKind {
    Press(MouseButton),
    Drag(MouseButton),
    Release(MouseButton),
    WheelUp,
    WheelDown,
}

/// Mouse buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    Left,
    Middle,
    Right,
}

#[cfg(test)]
mod tests {
    use super::{Event, KeyCode, KeyEvent, Modifiers};

    #[test]
    fn key_event_builder_sets_modifiers() {
        let ev = KeyEvent::new(KeyCode::Char('x')).with_modifiers(Modifiers::CTRL);
        assert_eq!(ev.code, KeyCode::Char('x'));
        assert!(ev.modifiers.contains(Modifiers::CTRL));
        assert!(!ev.modifiers.contains(Modifiers::SHIFT));
    }

    #[test]
    fn events_compare_structurally() {
        assert_eq!(
            Event::Resize {
                width: 80,
                height: 24
            },
            Event::Resize {
                width: 80,
                height: 24
            }
        );
        assert_ne!(Event::PasteStart, Event::PasteEnd);
    }
}
