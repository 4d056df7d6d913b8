#![forbid(unsafe_code)]

//! Keyboard session: field binding, value/caret mirror, and callbacks.
//!
//! A [`Session`] is the only thing that writes to the bound field. Edit
//! functions compute [`EditResult`]s; [`Session::apply_edit`] writes them,
//! updates the mirror, and notifies the input callback.
//!
//! # Lifecycle
//!
//! ```text
//!   closed ──open()/bind()──▶ open ──close()──▶ closed
//!                              │ ▲
//!                              └─┘ open()/bind() again: silently replaces
//! ```
//!
//! # Failure Modes
//!
//! Every operation that needs the bound field is a no-op when nothing is
//! bound. No operation on this type can fail.

use vkbd_backend::HostField;
use vkbd_core::edit::{EditContext, EditResult};

/// Called with the new field value after every applied edit.
pub type InputCallback = Box<dyn FnMut(&str)>;

/// Called with the final value when the user finishes with the done key.
pub type CloseCallback = Box<dyn FnMut(&str)>;

/// What [`Session::close`] tore down.
pub struct Closed {
    /// Mirror value at the moment of closing.
    pub final_value: String,
    /// The close callback that was registered, if any.
    pub on_close: Option<CloseCallback>,
    /// The field that was bound, if any.
    pub field: Option<Box<dyn HostField>>,
}

impl std::fmt::Debug for Closed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Closed")
            .field("final_value_len", &self.final_value.len())
            .field("has_on_close", &self.on_close.is_some())
            .field("had_field", &self.field.is_some())
            .finish()
    }
}

/// Session state owned by one keyboard instance.
#[derive(Default)]
pub struct Session {
    open: bool,
    value: String,
    caret: usize,
    field: Option<Box<dyn HostField>>,
    on_input: Option<InputCallback>,
    on_close: Option<CloseCallback>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("open", &self.open)
            .field("value_len", &self.value.len())
            .field("caret", &self.caret)
            .field("bound", &self.field.is_some())
            .finish()
    }
}

impl Session {
    /// A closed session with nothing bound.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Open with an initial value and callbacks. Any previous callbacks are
    /// replaced; the bound field, if any, is kept.
    pub fn open(
        &mut self,
        initial_value: &str,
        on_input: Option<InputCallback>,
        on_close: Option<CloseCallback>,
    ) {
        self.value = initial_value.to_owned();
        self.on_input = on_input;
        self.on_close = on_close;
        self.open = true;
        tracing::debug!(
            value_len = self.value.len(),
            bound = self.field.is_some(),
            "session open"
        );
    }

    /// Clear the value, drop both callbacks, and release the field binding.
    /// The field is not blurred here.
    pub fn close(&mut self) -> Closed {
        self.open = false;
        self.caret = 0;
        self.on_input = None;
        let closed = Closed {
            final_value: std::mem::take(&mut self.value),
            on_close: self.on_close.take(),
            field: self.field.take(),
        };
        tracing::debug!(had_field = closed.field.is_some(), "session close");
        closed
    }

    /// Bind `field`, replacing any previous binding, and mirror its state.
    pub fn bind(&mut self, field: Box<dyn HostField>) {
        self.value = field.value();
        self.caret = field.selection().0;
        self.field = Some(field);
        self.open = true;
        tracing::debug!(value_len = self.value.len(), caret = self.caret, "field bound");
    }

    /// Release the bound field without closing.
    pub fn unbind(&mut self) -> Option<Box<dyn HostField>> {
        self.field.take()
    }

    /// Write `result` to the field, mirror it, and notify the input callback.
    /// Returns `false` when no field is bound.
    pub fn apply_edit(&mut self, result: &EditResult) -> bool {
        let Some(field) = self.field.as_mut() else {
            tracing::trace!("apply_edit with no bound field");
            return false;
        };
        field.set_value(&result.new_value);
        field.set_selection(result.new_caret, result.new_caret);
        self.value = field.value();
        self.caret = result.new_caret;
        tracing::trace!(value_len = self.value.len(), caret = self.caret, "edit applied");
        if let Some(cb) = self.on_input.as_mut() {
            cb(&self.value);
        }
        true
    }

    /// Refresh the caret mirror from the field's selection start.
    pub fn sync_caret(&mut self) {
        if let Some(field) = self.field.as_ref() {
            self.caret = field.selection().0;
        }
    }

    /// Refresh value and caret mirror after a native edit.
    pub fn sync_from_field(&mut self) {
        if let Some(field) = self.field.as_ref() {
            self.value = field.value();
            self.caret = field.selection().0;
        }
    }

    /// Re-focus the field and collapse its selection to the caret mirror.
    pub fn restore_selection(&mut self) {
        let caret = self.caret;
        if let Some(field) = self.field.as_mut() {
            field.focus();
            field.set_selection(caret, caret);
        }
    }

    /// Blur the bound field, if any.
    pub fn blur_field(&mut self) {
        if let Some(field) = self.field.as_mut() {
            field.blur();
        }
    }

    /// Live split of the bound field, read now.
    #[must_use]
    pub fn edit_context(&self) -> Option<EditContext> {
        self.field.as_ref().map(|f| f.edit_context())
    }

    /// Whether the session is open.
    #[must_use]
    #[inline]
    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Whether a field is bound.
    #[must_use]
    #[inline]
    pub fn is_bound(&self) -> bool {
        self.field.is_some()
    }

    /// Mirrored value.
    #[must_use]
    #[inline]
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Mirrored caret.
    #[must_use]
    #[inline]
    pub fn caret(&self) -> usize {
        self.caret
    }

    /// Whether an input callback is registered.
    #[must_use]
    pub fn has_input_callback(&self) -> bool {
        self.on_input.is_some()
    }

    /// Whether a close callback is registered.
    #[must_use]
    pub fn has_close_callback(&self) -> bool {
        self.on_close.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;
    use vkbd_backend::MemoryField;

    fn recorder() -> (Rc<RefCell<Vec<String>>>, InputCallback) {
        let log = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&log);
        let cb: InputCallback = Box::new(move |v: &str| sink.borrow_mut().push(v.to_owned()));
        (log, cb)
    }

    #[test]
    fn apply_edit_round_trips() {
        let field = MemoryField::new("abc");
        let mut s = Session::new();
        s.bind(Box::new(field.clone()));
        let result = EditResult::new("abXc", 3);
        assert!(s.apply_edit(&result));
        assert_eq!(field.value(), result.new_value);
        assert_eq!(field.selection(), (3, 3));
        assert_eq!(s.value(), "abXc");
        assert_eq!(s.caret(), 3);
    }

    #[test]
    fn apply_edit_without_field_is_noop() {
        let (log, cb) = recorder();
        let mut s = Session::new();
        s.open("x", Some(cb), None);
        assert!(!s.apply_edit(&EditResult::new("y", 1)));
        assert!(log.borrow().is_empty());
        assert_eq!(s.value(), "x");
    }

    #[test]
    fn input_callback_sees_new_value() {
        let (log, cb) = recorder();
        let mut s = Session::new();
        s.bind(Box::new(MemoryField::new("")));
        s.open("", Some(cb), None);
        s.apply_edit(&EditResult::new("a", 1));
        s.apply_edit(&EditResult::new("ab", 2));
        assert_eq!(*log.borrow(), vec!["a".to_string(), "ab".to_string()]);
    }

    #[test]
    fn reopen_replaces_callbacks() {
        let (first, cb1) = recorder();
        let (second, cb2) = recorder();
        let mut s = Session::new();
        s.bind(Box::new(MemoryField::new("")));
        s.open("", Some(cb1), None);
        s.open("", Some(cb2), None);
        s.apply_edit(&EditResult::new("z", 1));
        assert!(first.borrow().is_empty());
        assert_eq!(second.borrow().len(), 1);
    }

    #[test]
    fn close_clears_everything() {
        let (_log, cb) = recorder();
        let mut s = Session::new();
        s.bind(Box::new(MemoryField::new("hello")));
        s.open("hello", Some(cb), Some(Box::new(|_: &str| {})));
        let closed = s.close();
        assert_eq!(closed.final_value, "hello");
        assert!(closed.on_close.is_some());
        assert!(closed.field.is_some());
        assert!(!s.is_open());
        assert!(!s.is_bound());
        assert!(!s.has_input_callback());
        assert!(!s.has_close_callback());
        assert_eq!(s.value(), "");
    }

    #[test]
    fn caret_mirror_tracks_field() {
        let field = MemoryField::new("hello");
        let mut s = Session::new();
        s.bind(Box::new(field.clone()));
        assert_eq!(s.caret(), 5);
        field.place_caret(2);
        assert_eq!(s.caret(), 5);
        s.sync_caret();
        assert_eq!(s.caret(), 2);
        field.type_natively("hey", 3);
        s.sync_from_field();
        assert_eq!((s.value(), s.caret()), ("hey", 3));
    }

    #[test]
    fn restore_selection_refocuses_at_mirror() {
        let field = MemoryField::new("hello");
        let mut s = Session::new();
        s.bind(Box::new(field.clone()));
        field.place_caret(1);
        s.sync_caret();
        field.place_caret(4);
        s.restore_selection();
        assert!(field.is_focused());
        assert_eq!(field.selection(), (1, 1));
    }

    #[test]
    fn edit_context_reads_live_field() {
        let field = MemoryField::new("abc");
        let mut s = Session::new();
        assert!(s.edit_context().is_none());
        s.bind(Box::new(field.clone()));
        field.place_caret(1);
        assert_eq!(s.edit_context().unwrap().value_before, "a");
    }
}
