#![forbid(unsafe_code)]

//! The on-screen keyboard widget.
//!
//! [`VirtualKeyboard`] owns one instance of every component: the key
//! registry, the binding table, the caps machine, the hold-repeat
//! controller, and the session. Any number of keyboards can coexist.
//!
//! # Event flow
//!
//! ```text
//!   host event ──▶ tick(now): fire every repeat due ≤ now
//!              ──▶ BindingTable::route/get ──▶ [Operation] ──▶ run each in order
//!
//!   commit(key): field split (read now) ─▶ registry.edit(key, caps) ─▶ session.apply_edit
//! ```
//!
//! # Invariants
//!
//! 1. Timers due before an event are fired before the event is handled.
//! 2. Every caps transition re-renders the caps key and every glyph.
//! 3. `close()` cancels every hold, so no repeat fires while closed.
//!
//! # Failure Modes
//!
//! Presenter errors are logged at `warn` and otherwise ignored: a failed
//! repaint never blocks an edit. Operations on a missing field are no-ops.

use tracing::{debug, debug_span, trace, warn};
use vkbd_backend::{HostField, Presenter};
use vkbd_core::caps::{CapsInput, CapsMachine, CapsSnapshot, CapsState};
use vkbd_core::event::Event;
use vkbd_core::hold::HoldRepeat;
use vkbd_core::layout::{KeyId, LayoutError};
use vkbd_core::registry::KeyRegistry;
use web_time::Instant;

use crate::bindings::{BindingTable, KeyTarget, Operation};
use crate::config::KeyboardConfig;
use crate::session::{CloseCallback, InputCallback, Session};

/// An on-screen keyboard bound to a presenter.
pub struct VirtualKeyboard<P: Presenter> {
    registry: KeyRegistry,
    bindings: BindingTable,
    caps: CapsMachine,
    hold: HoldRepeat,
    session: Session,
    presenter: P,
    initialized: bool,
    visible: bool,
}

impl<P: Presenter> std::fmt::Debug for VirtualKeyboard<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VirtualKeyboard")
            .field("keys", &self.registry.layout().len())
            .field("caps", &self.caps.state())
            .field("visible", &self.visible)
            .field("session", &self.session)
            .finish()
    }
}

impl<P: Presenter> VirtualKeyboard<P> {
    /// Build a keyboard. Fails if the configured layout is malformed.
    pub fn new(config: &KeyboardConfig, presenter: P) -> Result<Self, LayoutError> {
        let registry = config.registry()?;
        let bindings = BindingTable::from_registry(&registry);
        Ok(Self {
            hold: HoldRepeat::new(config.hold()),
            registry,
            bindings,
            caps: CapsMachine::new(),
            session: Session::new(),
            presenter,
            initialized: false,
            visible: false,
        })
    }

    // -----------------------------------------------------------------------
    // Public API
    // -----------------------------------------------------------------------

    /// Render every key once and hide the keyboard. Safe to call repeatedly.
    pub fn init(&mut self) {
        if self.initialized {
            return;
        }
        self.initialized = true;
        self.render_all();
        self.set_visible(false);
        debug!(keys = self.registry.layout().len(), "keyboard initialized");
    }

    /// Open with an initial value and callbacks, replacing previous ones.
    pub fn open(
        &mut self,
        initial_value: &str,
        on_input: Option<InputCallback>,
        on_close: Option<CloseCallback>,
    ) {
        self.session.open(initial_value, on_input, on_close);
        self.set_visible(true);
    }

    /// Cancel holds, clear the session, and hide. Does not blur the field.
    pub fn close(&mut self) {
        // The close callback and the released field are dropped unused.
        drop(self.close_inner());
    }

    /// A managed field gained focus: bind it and show the keyboard.
    /// Registered callbacks are kept.
    pub fn focus(&mut self, field: Box<dyn HostField>, now: Instant) {
        self.tick(now);
        self.session.bind(field);
        self.set_visible(true);
    }

    /// Handle one host event at time `now`.
    pub fn handle_event(&mut self, event: &Event, now: Instant) {
        let _span = debug_span!("vkbd.event", event = event.kind_name()).entered();
        self.tick(now);
        let Some((kind, target)) = BindingTable::route(event) else {
            return;
        };
        let ops = self.bindings.get(kind, &target).to_vec();
        if ops.is_empty() {
            trace!(event = event.kind_name(), "unbound event");
            return;
        }
        for op in ops {
            self.run(op, &target, now);
        }
    }

    /// Fire every repeat due at or before `now`. Returns the number of commits.
    pub fn tick(&mut self, now: Instant) -> usize {
        let fired = self.hold.poll(now);
        let count = fired.len();
        for key in fired {
            trace!(key = key.as_str(), "repeat");
            self.commit(&key);
        }
        count
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    /// Current caps state.
    #[must_use]
    #[inline]
    pub fn caps_state(&self) -> CapsState {
        self.caps.state()
    }

    /// Caps snapshot used for resolution.
    #[must_use]
    #[inline]
    pub fn caps(&self) -> CapsSnapshot {
        self.caps.snapshot()
    }

    /// Whether the keyboard is shown.
    #[must_use]
    #[inline]
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Whether `init` has run.
    #[must_use]
    #[inline]
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Session state.
    #[must_use]
    #[inline]
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Hold-repeat state.
    #[must_use]
    #[inline]
    pub fn hold(&self) -> &HoldRepeat {
        &self.hold
    }

    /// Key registry.
    #[must_use]
    #[inline]
    pub fn registry(&self) -> &KeyRegistry {
        &self.registry
    }

    /// Binding table, for hosts wiring native listeners.
    #[must_use]
    #[inline]
    pub fn bindings(&self) -> &BindingTable {
        &self.bindings
    }

    /// The presenter.
    #[must_use]
    #[inline]
    pub fn presenter(&self) -> &P {
        &self.presenter
    }

    /// The presenter, mutably.
    #[inline]
    pub fn presenter_mut(&mut self) -> &mut P {
        &mut self.presenter
    }

    /// Earliest time a repeat is due.
    #[must_use]
    pub fn next_deadline(&self) -> Option<Instant> {
        self.hold.next_deadline()
    }

    // -----------------------------------------------------------------------
    // Operations
    // -----------------------------------------------------------------------

    fn run(&mut self, op: Operation, target: &KeyTarget, now: Instant) {
        match op {
            Operation::BeginHold => {
                if let KeyTarget::Key(key) = target {
                    self.begin_hold(key, now);
                }
            }
            Operation::EndHold => {
                if let KeyTarget::Key(key) = target {
                    self.hold.release(key, now);
                }
            }
            Operation::ResetOneShot => self.apply_caps(CapsInput::CharacterCommitted),
            Operation::ToggleCaps => self.apply_caps(CapsInput::VirtualToggle),
            Operation::ShiftDown => self.apply_caps(CapsInput::ShiftDown),
            Operation::ShiftUp => self.apply_caps(CapsInput::ShiftUp),
            Operation::CapsLock => self.apply_caps(CapsInput::CapsLockDown),
            Operation::Done => self.done(),
            Operation::PressFeedback(pressed) => {
                if let KeyTarget::Key(key) = target {
                    self.present(|p| p.render_key_pressed(key, pressed));
                }
            }
            Operation::SyncCaret => self.session.sync_caret(),
            Operation::SyncFromField => self.session.sync_from_field(),
            Operation::RestoreSelection => self.session.restore_selection(),
            Operation::BlurAndClose => {
                if self.session.is_bound() {
                    self.session.blur_field();
                    self.close();
                }
            }
        }
    }

    fn begin_hold(&mut self, key: &KeyId, now: Instant) {
        let repeats = self.registry.action(key).is_some_and(|a| a.repeats());
        if !repeats {
            return;
        }
        let outcome = self.hold.press(key, now);
        if outcome.fire_now {
            self.commit(key);
        }
    }

    fn commit(&mut self, key: &KeyId) -> bool {
        let Some(ctx) = self.session.edit_context() else {
            return false;
        };
        let Some(result) = self.registry.edit(key, &ctx, self.caps.snapshot()) else {
            return false;
        };
        self.session.apply_edit(&result)
    }

    fn apply_caps(&mut self, input: CapsInput) {
        if let Some(t) = self.caps.apply(input) {
            debug!(from = %t.from, to = %t.to, ?input, "caps changed");
            self.render_all();
        }
    }

    fn done(&mut self) {
        let closed = self.close_inner();
        if let Some(mut cb) = closed.on_close {
            cb(&closed.final_value);
        }
        if let Some(mut field) = closed.field {
            field.blur();
        }
    }

    fn close_inner(&mut self) -> crate::session::Closed {
        let pressed: Vec<KeyId> = self.hold.held_keys().cloned().collect();
        self.hold.cancel_all();
        for key in &pressed {
            self.present(|p| p.render_key_pressed(key, false));
        }
        let closed = self.session.close();
        self.set_visible(false);
        closed
    }

    // -----------------------------------------------------------------------
    // Rendering
    // -----------------------------------------------------------------------

    fn render_all(&mut self) {
        let state = self.caps.state();
        self.present(|p| p.render_caps_visual_state(state));
        for (key, glyph) in self.registry.glyphs(self.caps.snapshot()) {
            self.present(|p| p.render_key_glyph(&key, &glyph));
        }
    }

    fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
        self.present(|p| p.set_visible(visible));
    }

    fn present(&mut self, f: impl FnOnce(&mut P) -> Result<(), P::Error>) {
        if let Err(e) = f(&mut self.presenter) {
            warn!(error = %e, "presenter call failed");
        }
    }
}
