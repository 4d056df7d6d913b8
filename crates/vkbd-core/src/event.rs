#![forbid(unsafe_code)]

//! Canonical input/event types.
//!
//! This module defines every input the keyboard core reacts to. Hosts
//! translate their native events (DOM listeners, winit callbacks, test
//! scripts) into these values before handing them to the runtime.
//!
//! # Design Notes
//!
//! - Physical keys only matter for Shift and CapsLock; everything else a
//!   physical keyboard types lands in the field natively and is observed via
//!   [`Event::FieldInput`].
//! - Virtual key presses carry a [`PressPhase`] so that hold-repeat can tell
//!   release, pointer-leave, and cancel apart in logs (they behave the same).
//! - `Modifiers` use bitflags for easy combination.

use bitflags::bitflags;

use crate::layout::KeyId;

/// Canonical input event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// A physical keyboard event.
    Key(KeyEvent),

    /// A press on one of the on-screen keys.
    Press(PressEvent),

    /// The bound field's value changed natively (physical typing, paste).
    FieldInput,

    /// The native selection changed.
    SelectionChange,

    /// Mouse button released over the bound field.
    PointerUp,

    /// Touch ended over the bound field.
    TouchEnd,

    /// Pointer pressed outside both the keyboard and any managed field.
    PointerDownOutside,

    /// Pointer pressed on the keyboard surface (not necessarily on a key).
    PointerDownInside,

    /// Nothing happened; only advances timers.
    Tick,
}

impl Event {
    /// Short, stable name used in logs and binding tables.
    #[must_use]
    pub const fn kind_name(&self) -> &'static str {
        match self {
            Self::Key(k) => match k.kind {
                KeyEventKind::Press => "key_down",
                KeyEventKind::Release => "key_up",
            },
            Self::Press(p) => p.phase.name(),
            Self::FieldInput => "field_input",
            Self::SelectionChange => "selection_change",
            Self::PointerUp => "pointer_up",
            Self::TouchEnd => "touch_end",
            Self::PointerDownOutside => "pointer_down_outside",
            Self::PointerDownInside => "pointer_down_inside",
            Self::Tick => "tick",
        }
    }

    /// Convenience constructor for a mouse press on a virtual key.
    #[must_use]
    pub fn press(key: impl Into<KeyId>, phase: PressPhase) -> Self {
        Self::Press(PressEvent::new(key, phase))
    }
}

/// A physical keyboard event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    /// The key code that was pressed.
    pub code: KeyCode,

    /// Modifier keys held during the event.
    pub modifiers: Modifiers,

    /// Key down or key up.
    pub kind: KeyEventKind,
}

impl KeyEvent {
    /// Create a new key event with default modifiers and Press kind.
    #[must_use]
    pub const fn new(code: KeyCode) -> Self {
        Self {
            code,
            modifiers: Modifiers::NONE,
            kind: KeyEventKind::Press,
        }
    }

    /// Create a key event with modifiers.
    #[must_use]
    pub const fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    /// Create a key event with a specific kind.
    #[must_use]
    pub const fn with_kind(mut self, kind: KeyEventKind) -> Self {
        self.kind = kind;
        self
    }

    /// Check if this is a specific key code.
    #[must_use]
    pub fn is_code(&self, code: KeyCode) -> bool {
        self.code == code
    }
}

/// Physical key codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCode {
    /// A character key.
    Char(char),
    /// Either Shift key.
    Shift,
    /// Caps Lock.
    CapsLock,
    /// Enter/Return.
    Enter,
    /// Backspace.
    Backspace,
    /// Delete (forward).
    Delete,
    /// Escape.
    Escape,
    /// Tab.
    Tab,
    /// Left arrow.
    Left,
    /// Right arrow.
    Right,
    /// Up arrow.
    Up,
    /// Down arrow.
    Down,
    /// Any key the core does not distinguish.
    Other,
}

impl KeyCode {
    /// Map a DOM `KeyboardEvent.key` string to a key code.
    #[must_use]
    pub fn from_dom_key(key: &str) -> Self {
        match key {
            "Shift" => Self::Shift,
            "CapsLock" => Self::CapsLock,
            "Enter" => Self::Enter,
            "Backspace" => Self::Backspace,
            "Delete" => Self::Delete,
            "Escape" => Self::Escape,
            "Tab" => Self::Tab,
            "ArrowLeft" => Self::Left,
            "ArrowRight" => Self::Right,
            "ArrowUp" => Self::Up,
            "ArrowDown" => Self::Down,
            other => {
                let mut chars = other.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Self::Char(c),
                    _ => Self::Other,
                }
            }
        }
    }
}

/// Key down or key up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum KeyEventKind {
    /// Key was pressed (default).
    #[default]
    Press,
    /// Key was released.
    Release,
}

bitflags! {
    /// Modifier keys that can be held during a key event.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Modifiers: u8 {
        /// No modifiers.
        const NONE  = 0b0000;
        /// Shift key.
        const SHIFT = 0b0001;
        /// Alt/Option key.
        const ALT   = 0b0010;
        /// Control key.
        const CTRL  = 0b0100;
        /// Super/Meta/Command key.
        const SUPER = 0b1000;
    }
}

impl Default for Modifiers {
    fn default() -> Self {
        Self::NONE
    }
}

/// A press-lifecycle event on an on-screen key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PressEvent {
    /// The key identifier from the layout.
    pub key: KeyId,
    /// Where in the press lifecycle this event sits.
    pub phase: PressPhase,
    /// Which pointer produced the event.
    pub source: PointerSource,
}

impl PressEvent {
    /// Create a mouse press event.
    #[must_use]
    pub fn new(key: impl Into<KeyId>, phase: PressPhase) -> Self {
        Self {
            key: key.into(),
            phase,
            source: PointerSource::Mouse,
        }
    }

    /// Set the pointer source.
    #[must_use]
    pub fn with_source(mut self, source: PointerSource) -> Self {
        self.source = source;
        self
    }
}

/// Press lifecycle phases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PressPhase {
    /// Mouse-down or touch-start on the key.
    Start,
    /// Mouse-up or touch-end on the key.
    End,
    /// Pointer left the key while pressed.
    Leave,
    /// The platform cancelled the press (touchcancel, focus loss).
    Cancel,
}

impl PressPhase {
    /// Whether this phase terminates a press.
    #[must_use]
    #[inline]
    pub const fn is_termination(self) -> bool {
        !matches!(self, Self::Start)
    }

    /// Stable name for logs and binding tables.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Start => "press_start",
            Self::End => "press_end",
            Self::Leave => "press_leave",
            Self::Cancel => "press_cancel",
        }
    }
}

/// Pointer device behind a press.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PointerSource {
    /// Mouse or pen.
    #[default]
    Mouse,
    /// Finger on a touch screen.
    Touch,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_event_builders() {
        let ev = KeyEvent::new(KeyCode::Shift)
            .with_modifiers(Modifiers::SHIFT)
            .with_kind(KeyEventKind::Release);
        assert!(ev.is_code(KeyCode::Shift));
        assert_eq!(ev.kind, KeyEventKind::Release);
        assert!(ev.modifiers.contains(Modifiers::SHIFT));
    }

    #[test]
    fn dom_key_mapping() {
        assert_eq!(KeyCode::from_dom_key("Shift"), KeyCode::Shift);
        assert_eq!(KeyCode::from_dom_key("CapsLock"), KeyCode::CapsLock);
        assert_eq!(KeyCode::from_dom_key("ä"), KeyCode::Char('ä'));
        assert_eq!(KeyCode::from_dom_key("F13"), KeyCode::Other);
        assert_eq!(KeyCode::from_dom_key(""), KeyCode::Other);
    }

    #[test]
    fn press_phase_termination() {
        assert!(!PressPhase::Start.is_termination());
        assert!(PressPhase::End.is_termination());
        assert!(PressPhase::Leave.is_termination());
        assert!(PressPhase::Cancel.is_termination());
    }

    #[test]
    fn kind_names_are_distinct_for_key_direction() {
        let down = Event::Key(KeyEvent::new(KeyCode::Shift));
        let up = Event::Key(KeyEvent::new(KeyCode::Shift).with_kind(KeyEventKind::Release));
        assert_eq!(down.kind_name(), "key_down");
        assert_eq!(up.kind_name(), "key_up");
        assert_eq!(Event::press("a", PressPhase::Leave).kind_name(), "press_leave");
    }

    #[test]
    fn press_defaults_to_mouse() {
        let p = PressEvent::new("q", PressPhase::Start);
        assert_eq!(p.source, PointerSource::Mouse);
        assert_eq!(p.with_source(PointerSource::Touch).source, PointerSource::Touch);
    }
}
