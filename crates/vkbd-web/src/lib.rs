#![forbid(unsafe_code)]

//! `vkbd-web` drives a [`VirtualKeyboard`] from a browser host.
//!
//! Design goals:
//! - **Host-driven I/O**: the embedding environment (JS) pushes DOM events.
//! - **Deterministic time**: the host advances a monotonic clock explicitly,
//!   so hold-repeat behaves identically in tests and in the page.
//! - **No blocking / no threads**: suitable for `wasm32-unknown-unknown`.
//!
//! This crate does not bind to `wasm-bindgen`. It records every presenter
//! call in [`WebOutputs`] so a thin JS shim can apply them to the DOM.

#[cfg(feature = "input-parser")]
pub mod input_parser;

use core::time::Duration;
use std::collections::{BTreeMap, BTreeSet, VecDeque};

use vkbd_backend::{Clock, EventSource, HostField, Presenter};
use vkbd_core::caps::CapsState;
use vkbd_core::event::Event;
use vkbd_core::layout::{KeyId, LayoutError};
use vkbd_core::registry::Glyph;
use vkbd_runtime::{CloseCallback, InputCallback, KeyboardConfig, VirtualKeyboard};
use web_time::Instant;

#[cfg(feature = "input-parser")]
use crate::input_parser::{InputParseError, parse_encoded_input_to_event};

/// Web driver error type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebKeyboardError {
    /// The configured layout is invalid.
    Layout(LayoutError),
    /// The host tried to move the clock backwards.
    TimeRegression {
        /// Current clock reading.
        now: Duration,
        /// Requested reading.
        requested: Duration,
    },
    /// An encoded host event could not be parsed.
    #[cfg(feature = "input-parser")]
    Input(InputParseError),
}

impl core::fmt::Display for WebKeyboardError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Layout(e) => write!(f, "layout error: {e}"),
            Self::TimeRegression { now, requested } => write!(
                f,
                "clock cannot move backwards: at {}ms, requested {}ms",
                now.as_millis(),
                requested.as_millis()
            ),
            #[cfg(feature = "input-parser")]
            Self::Input(e) => write!(f, "input error: {e}"),
        }
    }
}

impl std::error::Error for WebKeyboardError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Layout(e) => Some(e),
            Self::TimeRegression { .. } => None,
            #[cfg(feature = "input-parser")]
            Self::Input(e) => Some(e),
        }
    }
}

impl From<LayoutError> for WebKeyboardError {
    fn from(e: LayoutError) -> Self {
        Self::Layout(e)
    }
}

#[cfg(feature = "input-parser")]
impl From<InputParseError> for WebKeyboardError {
    fn from(e: InputParseError) -> Self {
        Self::Input(e)
    }
}

// ---------------------------------------------------------------------------
// Clock
// ---------------------------------------------------------------------------

/// Deterministic monotonic clock controlled by the host.
#[derive(Debug, Default, Clone)]
pub struct DeterministicClock {
    now: Duration,
}

impl DeterministicClock {
    /// Create a clock starting at `0`.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            now: Duration::ZERO,
        }
    }

    /// Set current monotonic time.
    pub fn set(&mut self, now: Duration) {
        self.now = now;
    }

    /// Advance monotonic time by `dt`.
    pub fn advance(&mut self, dt: Duration) {
        self.now = self.now.saturating_add(dt);
    }
}

impl Clock for DeterministicClock {
    fn now_mono(&self) -> Duration {
        self.now
    }
}

// ---------------------------------------------------------------------------
// Event source
// ---------------------------------------------------------------------------

/// Host-driven event queue.
#[derive(Debug, Clone, Default)]
pub struct WebEventSource {
    queue: VecDeque<Event>,
}

impl WebEventSource {
    /// Create an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Push a canonical event into the queue.
    pub fn push_event(&mut self, event: Event) {
        self.queue.push_back(event);
    }

    /// Drain all pending events.
    pub fn drain_events(&mut self) -> impl Iterator<Item = Event> + '_ {
        self.queue.drain(..)
    }

    /// Number of queued events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Whether the queue is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

impl EventSource for WebEventSource {
    type Error = WebKeyboardError;

    fn read_event(&mut self) -> Result<Option<Event>, Self::Error> {
        Ok(self.queue.pop_front())
    }
}

// ---------------------------------------------------------------------------
// Presenter
// ---------------------------------------------------------------------------

/// One recorded presenter call, in the order the runtime made it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PresenterOp {
    /// Caps key styling changed.
    Caps(CapsState),
    /// A key's label or icon changed.
    Glyph(KeyId, Glyph),
    /// A key's pressed styling changed.
    Pressed(KeyId, bool),
    /// Keyboard shown or hidden.
    Visible(bool),
}

/// Captured presentation outputs for host consumption.
///
/// `ops` is the call log since the last [`WebPresenter::take_ops`]; the other
/// fields are the accumulated visual state.
#[derive(Debug, Default, Clone)]
pub struct WebOutputs {
    /// Calls not yet consumed by the host.
    pub ops: Vec<PresenterOp>,
    /// Caps styling last rendered.
    pub caps: Option<CapsState>,
    /// Current glyph per key.
    pub glyphs: BTreeMap<KeyId, Glyph>,
    /// Keys currently styled as pressed.
    pub pressed: BTreeSet<KeyId>,
    /// Whether the keyboard is shown.
    pub visible: bool,
}

impl WebOutputs {
    /// Text label shown on `key`, if it has one.
    #[must_use]
    pub fn label(&self, key: &str) -> Option<&str> {
        match self.glyphs.get(key)? {
            Glyph::Text(s) => Some(s.as_str()),
            Glyph::Pair { big, .. } => Some(big.as_str()),
            Glyph::Icon(_) | Glyph::Hidden => None,
        }
    }
}

/// Presenter that records every call for the host.
#[derive(Debug, Clone, Default)]
pub struct WebPresenter {
    outputs: WebOutputs,
}

impl WebPresenter {
    /// Create a presenter with nothing rendered.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get captured outputs.
    #[must_use]
    pub const fn outputs(&self) -> &WebOutputs {
        &self.outputs
    }

    /// Take the pending call log, keeping the accumulated state.
    pub fn take_ops(&mut self) -> Vec<PresenterOp> {
        std::mem::take(&mut self.outputs.ops)
    }
}

impl Presenter for WebPresenter {
    type Error = WebKeyboardError;

    fn render_caps_visual_state(&mut self, state: CapsState) -> Result<(), Self::Error> {
        self.outputs.caps = Some(state);
        self.outputs.ops.push(PresenterOp::Caps(state));
        Ok(())
    }

    fn render_key_glyph(&mut self, key: &KeyId, glyph: &Glyph) -> Result<(), Self::Error> {
        self.outputs.glyphs.insert(key.clone(), glyph.clone());
        self.outputs
            .ops
            .push(PresenterOp::Glyph(key.clone(), glyph.clone()));
        Ok(())
    }

    fn render_key_pressed(&mut self, key: &KeyId, pressed: bool) -> Result<(), Self::Error> {
        if pressed {
            self.outputs.pressed.insert(key.clone());
        } else {
            self.outputs.pressed.remove(key);
        }
        self.outputs.ops.push(PresenterOp::Pressed(key.clone(), pressed));
        Ok(())
    }

    fn set_visible(&mut self, visible: bool) -> Result<(), Self::Error> {
        self.outputs.visible = visible;
        self.outputs.ops.push(PresenterOp::Visible(visible));
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Driver
// ---------------------------------------------------------------------------

/// A keyboard plus the host-driven clock and queue that feed it.
///
/// Clock readings map to [`Instant`]s as `origin + now_mono()`, where
/// `origin` is captured at construction.
#[derive(Debug)]
pub struct WebKeyboard {
    clock: DeterministicClock,
    events: WebEventSource,
    keyboard: VirtualKeyboard<WebPresenter>,
    origin: Instant,
}

impl WebKeyboard {
    /// Build and initialize a keyboard (rendered, hidden) at time zero.
    pub fn new(config: &KeyboardConfig) -> Result<Self, WebKeyboardError> {
        let mut keyboard = VirtualKeyboard::new(config, WebPresenter::new())?;
        keyboard.init();
        Ok(Self {
            clock: DeterministicClock::new(),
            events: WebEventSource::new(),
            keyboard,
            origin: Instant::now(),
        })
    }

    /// Current time as seen by the keyboard.
    #[must_use]
    pub fn now(&self) -> Instant {
        let elapsed = self.clock.now_mono();
        self.origin.checked_add(elapsed).unwrap_or(self.origin)
    }

    /// Read the host clock.
    #[must_use]
    pub fn clock(&self) -> &DeterministicClock {
        &self.clock
    }

    /// Queue a canonical event for the next [`pump`](Self::pump).
    pub fn push_event(&mut self, event: Event) {
        self.events.push_event(event);
    }

    /// Parse a JSON-encoded host event and queue it. Returns whether an event
    /// was queued (ignored DOM kinds return `false`).
    #[cfg(feature = "input-parser")]
    pub fn push_encoded(&mut self, json: &str) -> Result<bool, WebKeyboardError> {
        match parse_encoded_input_to_event(json)? {
            Some(event) => {
                self.push_event(event);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Handle every queued event at the current time. Returns how many were
    /// handled.
    pub fn pump(&mut self) -> usize {
        let now = self.now();
        let mut handled = 0;
        while let Ok(Some(event)) = self.events.read_event() {
            self.keyboard.handle_event(&event, now);
            handled += 1;
        }
        handled
    }

    /// Handle queued events, advance the clock by `dt`, and fire due repeats.
    /// Returns the number of repeat commits.
    pub fn advance(&mut self, dt: Duration) -> usize {
        self.pump();
        self.clock.advance(dt);
        self.keyboard.tick(self.now())
    }

    /// Handle queued events and jump the clock to `now`.
    pub fn set_time(&mut self, now: Duration) -> Result<usize, WebKeyboardError> {
        let current = self.clock.now_mono();
        if now < current {
            return Err(WebKeyboardError::TimeRegression {
                now: current,
                requested: now,
            });
        }
        Ok(self.advance(now - current))
    }

    /// Milliseconds until the next repeat is due, for `setTimeout` scheduling.
    #[must_use]
    pub fn next_timeout(&self) -> Option<Duration> {
        self.keyboard
            .next_deadline()
            .map(|at| at.saturating_duration_since(self.now()))
    }

    /// Open a session.
    pub fn open(
        &mut self,
        initial_value: &str,
        on_input: Option<InputCallback>,
        on_close: Option<CloseCallback>,
    ) {
        self.keyboard.open(initial_value, on_input, on_close);
    }

    /// Close the session.
    pub fn close(&mut self) {
        self.keyboard.close();
    }

    /// A managed field gained focus.
    pub fn focus(&mut self, field: Box<dyn HostField>) {
        let now = self.now();
        self.keyboard.focus(field, now);
    }

    /// The wrapped keyboard.
    #[must_use]
    pub fn keyboard(&self) -> &VirtualKeyboard<WebPresenter> {
        &self.keyboard
    }

    /// Recorded presenter state.
    #[must_use]
    pub fn outputs(&self) -> &WebOutputs {
        self.keyboard.presenter().outputs()
    }

    /// Take the pending presenter call log.
    pub fn take_ops(&mut self) -> Vec<PresenterOp> {
        self.keyboard.presenter_mut().take_ops()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vkbd_core::event::{KeyCode, KeyEvent, PressPhase};

    use pretty_assertions::assert_eq;

    #[test]
    fn deterministic_clock_advances_monotonically() {
        let mut c = DeterministicClock::new();
        assert_eq!(c.now_mono(), Duration::ZERO);

        c.advance(Duration::from_millis(10));
        assert_eq!(c.now_mono(), Duration::from_millis(10));

        c.advance(Duration::from_millis(5));
        assert_eq!(c.now_mono(), Duration::from_millis(15));

        // Saturation: don't panic or wrap.
        c.set(Duration::MAX);
        c.advance(Duration::from_secs(1));
        assert_eq!(c.now_mono(), Duration::MAX);
    }

    #[test]
    fn web_event_source_fifo_queue() {
        let mut ev = WebEventSource::new();
        assert!(ev.is_empty());

        ev.push_event(Event::Tick);
        ev.push_event(Event::FieldInput);
        assert_eq!(ev.len(), 2);

        assert_eq!(ev.read_event().unwrap(), Some(Event::Tick));
        assert_eq!(ev.read_event().unwrap(), Some(Event::FieldInput));
        assert_eq!(ev.read_event().unwrap(), None);
    }

    #[test]
    fn presenter_tracks_state_and_log() {
        let mut p = WebPresenter::new();
        let a = KeyId::from("a");
        p.render_key_glyph(&a, &Glyph::Text("a".into())).unwrap();
        p.render_key_pressed(&a, true).unwrap();
        p.render_key_pressed(&a, false).unwrap();
        p.set_visible(true).unwrap();

        assert_eq!(p.outputs().label("a"), Some("a"));
        assert!(p.outputs().pressed.is_empty());
        assert!(p.outputs().visible);

        let ops = p.take_ops();
        assert_eq!(ops.len(), 4);
        assert_eq!(ops[1], PresenterOp::Pressed(a, true));
        assert!(p.outputs().ops.is_empty());
        assert_eq!(p.outputs().label("a"), Some("a"));
    }

    #[test]
    fn new_keyboard_is_rendered_and_hidden() {
        let kb = WebKeyboard::new(&KeyboardConfig::default()).unwrap();
        let out = kb.outputs();
        assert_eq!(out.caps, Some(CapsState::Inactive));
        assert_eq!(out.glyphs.len(), 44);
        assert_eq!(out.label("q"), Some("q"));
        assert_eq!(out.label("1"), Some("1"));
        assert!(!out.visible);
    }

    #[test]
    fn bad_layout_is_reported() {
        let config = KeyboardConfig::default().with_layout(["a", "nope"]);
        let err = WebKeyboard::new(&config).unwrap_err();
        assert!(matches!(err, WebKeyboardError::Layout(LayoutError::UnknownKey(_))));
    }

    #[test]
    fn time_cannot_go_backwards() {
        let mut kb = WebKeyboard::new(&KeyboardConfig::default()).unwrap();
        kb.set_time(Duration::from_millis(100)).unwrap();
        let err = kb.set_time(Duration::from_millis(50)).unwrap_err();
        assert_eq!(
            err,
            WebKeyboardError::TimeRegression {
                now: Duration::from_millis(100),
                requested: Duration::from_millis(50),
            }
        );
        assert_eq!(kb.clock().now_mono(), Duration::from_millis(100));
    }

    #[test]
    fn caps_lock_relabels_through_queue() {
        let mut kb = WebKeyboard::new(&KeyboardConfig::default()).unwrap();
        kb.take_ops();
        kb.push_event(Event::Key(KeyEvent::new(KeyCode::CapsLock)));
        assert_eq!(kb.pump(), 1);
        assert_eq!(kb.outputs().caps, Some(CapsState::Locked));
        assert_eq!(kb.outputs().label("q"), Some("Q"));
        assert!(kb.take_ops().contains(&PresenterOp::Caps(CapsState::Locked)));
    }

    #[test]
    fn next_timeout_follows_hold() {
        let mut kb = WebKeyboard::new(&KeyboardConfig::default()).unwrap();
        assert_eq!(kb.next_timeout(), None);
        kb.push_event(Event::press("a", PressPhase::Start));
        kb.pump();
        assert_eq!(kb.next_timeout(), Some(Duration::from_millis(250)));
        kb.advance(Duration::from_millis(100));
        assert_eq!(kb.next_timeout(), Some(Duration::from_millis(150)));
    }
}
