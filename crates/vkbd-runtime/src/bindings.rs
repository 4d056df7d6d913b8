#![forbid(unsafe_code)]

//! Declarative event bindings.
//!
//! Instead of wiring listeners imperatively, the keyboard describes which
//! operations run for each `(event kind, target)` pair. The table is derived
//! once from the key registry. Hosts enumerate [`BindingTable::rows`] to
//! learn which native events to subscribe; the runtime uses
//! [`BindingTable::lookup`] to dispatch.
//!
//! # Invariants
//!
//! 1. Every `(EventKind, KeyTarget)` pair appears in at most one row.
//! 2. Spacer keys have no rows.
//! 3. Every row that starts a hold has matching rows for all three
//!    termination kinds that end it.

use std::collections::HashMap;

use vkbd_core::event::{Event, KeyCode, KeyEventKind, PressPhase};
use vkbd_core::layout::KeyId;
use vkbd_core::registry::{KeyAction, KeyRegistry};

/// Kind of host event a row reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    PressStart,
    PressEnd,
    PressLeave,
    PressCancel,
    KeyDown,
    KeyUp,
    FieldInput,
    SelectionChange,
    PointerUp,
    TouchEnd,
    PointerDown,
}

impl From<PressPhase> for EventKind {
    fn from(phase: PressPhase) -> Self {
        match phase {
            PressPhase::Start => Self::PressStart,
            PressPhase::End => Self::PressEnd,
            PressPhase::Leave => Self::PressLeave,
            PressPhase::Cancel => Self::PressCancel,
        }
    }
}

/// Where the event happened.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum KeyTarget {
    /// An on-screen key.
    Key(KeyId),
    /// A physical key, anywhere in the document.
    Physical(KeyCode),
    /// The bound field.
    Field,
    /// The keyboard surface outside any key.
    Surface,
    /// Anywhere outside keyboard and fields.
    Document,
}

/// A component operation a binding triggers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// Commit once and start hold-repeat for the target key.
    BeginHold,
    /// Cancel hold-repeat for the target key.
    EndHold,
    /// One-shot shift reset after a character commit.
    ResetOneShot,
    /// Cycle caps via the virtual key.
    ToggleCaps,
    /// Physical Shift pressed.
    ShiftDown,
    /// Physical Shift released.
    ShiftUp,
    /// Physical CapsLock pressed.
    CapsLock,
    /// Close, report the final value, blur the field.
    Done,
    /// Pressed styling on or off.
    PressFeedback(bool),
    /// Refresh caret mirror from the field.
    SyncCaret,
    /// Refresh value and caret mirror from the field.
    SyncFromField,
    /// Re-focus the field and restore the caret mirror.
    RestoreSelection,
    /// Blur the field and close.
    BlurAndClose,
}

/// One row of the table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    pub event: EventKind,
    pub target: KeyTarget,
    /// Operations, run in order.
    pub ops: Vec<Operation>,
}

/// The complete binding table for one keyboard.
#[derive(Debug, Clone, Default)]
pub struct BindingTable {
    rows: Vec<Binding>,
    index: HashMap<(EventKind, KeyTarget), usize>,
}

const TERMINATIONS: [EventKind; 3] = [EventKind::PressEnd, EventKind::PressLeave, EventKind::PressCancel];

impl BindingTable {
    /// Derive the table for every key in `registry`, plus the fixed
    /// document/field/surface rows.
    #[must_use]
    pub fn from_registry(registry: &KeyRegistry) -> Self {
        let mut table = Self::default();

        for desc in registry.layout().interactive() {
            let target = || KeyTarget::Key(desc.id.clone());
            let (start, end): (Vec<Operation>, Vec<Operation>) = match desc.action {
                KeyAction::Char(_) | KeyAction::Secondary { .. } => (
                    vec![Operation::PressFeedback(true), Operation::BeginHold],
                    vec![
                        Operation::EndHold,
                        Operation::PressFeedback(false),
                        Operation::ResetOneShot,
                    ],
                ),
                KeyAction::Space | KeyAction::Enter | KeyAction::Backspace | KeyAction::Delete => (
                    vec![Operation::PressFeedback(true), Operation::BeginHold],
                    vec![Operation::EndHold, Operation::PressFeedback(false)],
                ),
                KeyAction::Caps => (
                    vec![Operation::PressFeedback(true), Operation::ToggleCaps],
                    vec![Operation::PressFeedback(false)],
                ),
                KeyAction::Done => (
                    vec![Operation::PressFeedback(true), Operation::Done],
                    vec![Operation::PressFeedback(false)],
                ),
                KeyAction::Spacer => continue,
            };
            table.insert(EventKind::PressStart, target(), start);
            for kind in TERMINATIONS {
                table.insert(kind, target(), end.clone());
            }
        }

        table.insert(
            EventKind::KeyDown,
            KeyTarget::Physical(KeyCode::Shift),
            vec![Operation::ShiftDown],
        );
        table.insert(
            EventKind::KeyUp,
            KeyTarget::Physical(KeyCode::Shift),
            vec![Operation::ShiftUp],
        );
        table.insert(
            EventKind::KeyDown,
            KeyTarget::Physical(KeyCode::CapsLock),
            vec![Operation::CapsLock],
        );
        table.insert(EventKind::FieldInput, KeyTarget::Field, vec![Operation::SyncFromField]);
        for kind in [EventKind::SelectionChange, EventKind::PointerUp, EventKind::TouchEnd] {
            table.insert(kind, KeyTarget::Field, vec![Operation::SyncCaret]);
        }
        table.insert(EventKind::PointerDown, KeyTarget::Surface, vec![Operation::RestoreSelection]);
        table.insert(EventKind::PointerDown, KeyTarget::Document, vec![Operation::BlurAndClose]);

        table
    }

    fn insert(&mut self, event: EventKind, target: KeyTarget, ops: Vec<Operation>) {
        let key = (event, target.clone());
        if let Some(&i) = self.index.get(&key) {
            self.rows[i].ops = ops;
            return;
        }
        self.index.insert(key, self.rows.len());
        self.rows.push(Binding { event, target, ops });
    }

    /// The `(kind, target)` pair an event dispatches on, if any.
    #[must_use]
    pub fn route(event: &Event) -> Option<(EventKind, KeyTarget)> {
        match event {
            Event::Key(k) => {
                let kind = match k.kind {
                    KeyEventKind::Press => EventKind::KeyDown,
                    KeyEventKind::Release => EventKind::KeyUp,
                };
                Some((kind, KeyTarget::Physical(k.code)))
            }
            Event::Press(p) => Some((p.phase.into(), KeyTarget::Key(p.key.clone()))),
            Event::FieldInput => Some((EventKind::FieldInput, KeyTarget::Field)),
            Event::SelectionChange => Some((EventKind::SelectionChange, KeyTarget::Field)),
            Event::PointerUp => Some((EventKind::PointerUp, KeyTarget::Field)),
            Event::TouchEnd => Some((EventKind::TouchEnd, KeyTarget::Field)),
            Event::PointerDownInside => Some((EventKind::PointerDown, KeyTarget::Surface)),
            Event::PointerDownOutside => Some((EventKind::PointerDown, KeyTarget::Document)),
            Event::Tick => None,
        }
    }

    /// Operations bound to `(event, target)`.
    #[must_use]
    pub fn get(&self, event: EventKind, target: &KeyTarget) -> &[Operation] {
        match self.index.get(&(event, target.clone())) {
            Some(&i) => &self.rows[i].ops,
            None => &[],
        }
    }

    /// Operations bound to a concrete event.
    #[must_use]
    pub fn lookup(&self, event: &Event) -> &[Operation] {
        match Self::route(event) {
            Some((kind, target)) => self.get(kind, &target),
            None => &[],
        }
    }

    /// All rows, in insertion order.
    #[must_use]
    #[inline]
    pub fn rows(&self) -> &[Binding] {
        &self.rows
    }

    /// Rows targeting one on-screen key.
    pub fn for_key<'a>(&'a self, key: &'a KeyId) -> impl Iterator<Item = &'a Binding> + 'a {
        self.rows
            .iter()
            .filter(move |b| matches!(&b.target, KeyTarget::Key(k) if k == key))
    }

    /// Number of rows.
    #[must_use]
    #[inline]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table is empty.
    #[must_use]
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vkbd_core::event::KeyEvent;
    use vkbd_core::layout::Layout;

    fn table() -> BindingTable {
        BindingTable::from_registry(&KeyRegistry::german().unwrap())
    }

    #[test]
    fn character_key_rows() {
        let t = table();
        let a = KeyId::from("a");
        assert_eq!(
            t.lookup(&Event::press("a", PressPhase::Start)),
            &[Operation::PressFeedback(true), Operation::BeginHold]
        );
        for phase in [PressPhase::End, PressPhase::Leave, PressPhase::Cancel] {
            assert!(t.lookup(&Event::press("a", phase)).contains(&Operation::ResetOneShot));
            assert!(t.lookup(&Event::press("a", phase)).contains(&Operation::EndHold));
        }
        assert_eq!(t.for_key(&a).count(), 4);
    }

    #[test]
    fn space_does_not_reset_caps() {
        let t = table();
        let ops = t.lookup(&Event::press("space", PressPhase::End));
        assert!(ops.contains(&Operation::EndHold));
        assert!(!ops.contains(&Operation::ResetOneShot));
    }

    #[test]
    fn caps_and_done_act_on_press_start() {
        let t = table();
        assert!(t.lookup(&Event::press("caps", PressPhase::Start)).contains(&Operation::ToggleCaps));
        assert!(t.lookup(&Event::press("done", PressPhase::Start)).contains(&Operation::Done));
        assert!(!t.lookup(&Event::press("caps", PressPhase::End)).contains(&Operation::ToggleCaps));
    }

    #[test]
    fn spacers_and_unknown_keys_have_no_rows() {
        let t = table();
        assert!(t.lookup(&Event::press("spacer", PressPhase::Start)).is_empty());
        assert!(t.lookup(&Event::press("F1", PressPhase::Start)).is_empty());
    }

    #[test]
    fn physical_keys_route_by_direction() {
        let t = table();
        let down = Event::Key(KeyEvent::new(KeyCode::Shift));
        let up = Event::Key(KeyEvent::new(KeyCode::Shift).with_kind(KeyEventKind::Release));
        let caps_up = Event::Key(KeyEvent::new(KeyCode::CapsLock).with_kind(KeyEventKind::Release));
        assert_eq!(t.lookup(&down), &[Operation::ShiftDown]);
        assert_eq!(t.lookup(&up), &[Operation::ShiftUp]);
        assert!(t.lookup(&caps_up).is_empty());
        assert!(t.lookup(&Event::Key(KeyEvent::new(KeyCode::Char('a')))).is_empty());
    }

    #[test]
    fn caret_sync_rows() {
        let t = table();
        for ev in [Event::SelectionChange, Event::PointerUp, Event::TouchEnd] {
            assert_eq!(t.lookup(&ev), &[Operation::SyncCaret]);
        }
        assert_eq!(t.lookup(&Event::FieldInput), &[Operation::SyncFromField]);
        assert_eq!(t.lookup(&Event::PointerDownInside), &[Operation::RestoreSelection]);
        assert_eq!(t.lookup(&Event::PointerDownOutside), &[Operation::BlurAndClose]);
        assert!(t.lookup(&Event::Tick).is_empty());
    }

    #[test]
    fn rows_are_unique() {
        let t = table();
        let mut seen = std::collections::HashSet::new();
        for row in t.rows() {
            assert!(seen.insert((row.event, row.target.clone())));
        }
        // 44 interactive keys * 4 phases + 9 fixed rows
        assert_eq!(t.len(), 44 * 4 + 9);
    }

    #[test]
    fn custom_layout_table() {
        let layout = Layout::parse(&["a", "spacer-wide", "enter"]).unwrap();
        let t = BindingTable::from_registry(&KeyRegistry::new(layout));
        assert_eq!(t.len(), 2 * 4 + 9);
        assert!(t.lookup(&Event::press("enter", PressPhase::Start)).contains(&Operation::BeginHold));
    }
}
