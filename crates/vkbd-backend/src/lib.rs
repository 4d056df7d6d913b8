#![forbid(unsafe_code)]
#![doc = "Host traits for vkbd: text field, presentation layer, event source, and time."]
#![doc = ""]
#![doc = "This crate defines the boundary between the keyboard runtime and whatever hosts"]
#![doc = "it (a DOM binding, a native toolkit, a headless test harness)."]

use core::time::Duration;
use std::cell::RefCell;
use std::rc::Rc;

use vkbd_core::caps::CapsState;
use vkbd_core::edit::{EditContext, FieldKind, grapheme_len};
use vkbd_core::event::Event;
use vkbd_core::layout::KeyId;
use vkbd_core::registry::Glyph;

/// Monotonic clock abstraction.
///
/// Native hosts use `std::time::Instant`; WASM hosts use `performance.now()`.
pub trait Clock {
    /// Returns elapsed time since an unspecified epoch, monotonically increasing.
    fn now_mono(&self) -> Duration;
}

/// A text-input-like object the keyboard writes into.
///
/// Offsets are grapheme-cluster indices. Implementations clamp out-of-range
/// selections rather than failing.
pub trait HostField {
    /// Current value.
    fn value(&self) -> String;

    /// Replace the value.
    fn set_value(&mut self, value: &str);

    /// Current selection as `(start, end)`.
    fn selection(&self) -> (usize, usize);

    /// Set the selection; `start == end` collapses it to a caret.
    fn set_selection(&mut self, start: usize, end: usize);

    /// Give the field input focus.
    fn focus(&mut self);

    /// Remove input focus.
    fn blur(&mut self);

    /// Single-line or multi-line.
    fn field_kind(&self) -> FieldKind {
        FieldKind::SingleLine
    }

    /// Split the live value around the live selection.
    fn edit_context(&self) -> EditContext {
        let (start, end) = self.selection();
        EditContext::split(&self.value(), start, end, self.field_kind())
    }
}

/// Presentation abstraction: everything the core asks the UI to show.
pub trait Presenter {
    /// Platform-specific error type.
    type Error: core::fmt::Debug + core::fmt::Display;

    /// Show caps state on the caps key (active/locked styling).
    fn render_caps_visual_state(&mut self, state: CapsState) -> Result<(), Self::Error>;

    /// Update the label or icon of one key.
    fn render_key_glyph(&mut self, key: &KeyId, glyph: &Glyph) -> Result<(), Self::Error>;

    /// Toggle pressed styling on one key.
    fn render_key_pressed(&mut self, key: &KeyId, pressed: bool) -> Result<(), Self::Error>;

    /// Show or hide the whole keyboard.
    fn set_visible(&mut self, visible: bool) -> Result<(), Self::Error>;
}

/// Source of canonical input events.
pub trait EventSource {
    /// Platform-specific error type.
    type Error: core::fmt::Debug + core::fmt::Display;

    /// Read the next available event, or `None` if none is ready.
    fn read_event(&mut self) -> Result<Option<Event>, Self::Error>;
}

// ---------------------------------------------------------------------------
// In-memory field
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct FieldState {
    value: String,
    selection: (usize, usize),
    focused: bool,
}

/// A field kept in memory. Clones share state, so a test can hand one clone
/// to the keyboard and inspect another.
#[derive(Debug, Clone, Default)]
pub struct MemoryField {
    state: Rc<RefCell<FieldState>>,
    kind: FieldKind,
}

impl MemoryField {
    /// Single-line field holding `value`, caret at the end.
    #[must_use]
    pub fn new(value: &str) -> Self {
        let end = grapheme_len(value);
        Self {
            state: Rc::new(RefCell::new(FieldState {
                value: value.to_owned(),
                selection: (end, end),
                focused: false,
            })),
            kind: FieldKind::SingleLine,
        }
    }

    /// Multi-line field holding `value`, caret at the end.
    #[must_use]
    pub fn multi_line(value: &str) -> Self {
        Self {
            kind: FieldKind::MultiLine,
            ..Self::new(value)
        }
    }

    /// Whether the field currently has focus.
    #[must_use]
    pub fn is_focused(&self) -> bool {
        self.state.borrow().focused
    }

    /// Collapse the caret to `pos` (like a user click).
    pub fn place_caret(&self, pos: usize) {
        let clamped = pos.min(grapheme_len(&self.state.borrow().value));
        self.state.borrow_mut().selection = (clamped, clamped);
    }

    /// Replace value and caret as if the user typed natively.
    pub fn type_natively(&self, value: &str, caret: usize) {
        let mut s = self.state.borrow_mut();
        s.value = value.to_owned();
        let c = caret.min(grapheme_len(value));
        s.selection = (c, c);
    }
}

impl HostField for MemoryField {
    fn value(&self) -> String {
        self.state.borrow().value.clone()
    }

    fn set_value(&mut self, value: &str) {
        let mut s = self.state.borrow_mut();
        s.value = value.to_owned();
        let len = grapheme_len(value);
        s.selection = (s.selection.0.min(len), s.selection.1.min(len));
    }

    fn selection(&self) -> (usize, usize) {
        self.state.borrow().selection
    }

    fn set_selection(&mut self, start: usize, end: usize) {
        let mut s = self.state.borrow_mut();
        let len = grapheme_len(&s.value);
        let (lo, hi) = (start.min(end).min(len), start.max(end).min(len));
        s.selection = (lo, hi);
    }

    fn focus(&mut self) {
        self.state.borrow_mut().focused = true;
    }

    fn blur(&mut self) {
        self.state.borrow_mut().focused = false;
    }

    fn field_kind(&self) -> FieldKind {
        self.kind
    }
}
