#![forbid(unsafe_code)]

//! Caps/Shift state machine.
//!
//! # State Machine
//!
//! ```text
//!             ShiftDown / VirtualToggle            VirtualToggle
//!   Inactive ─────────────────────────▶ Active ─────────────────▶ Locked
//!      ▲  ▲   ShiftUp / CharacterCommitted  │                         │
//!      │  └─────────────────────────────────┘                         │
//!      │                 VirtualToggle / CapsLockDown                 │
//!      └──────────────────────────────────────────────────────────────┘
//!
//!   CapsLockDown: Inactive ─▶ Locked, Active ─▶ Locked, Locked ─▶ Inactive
//! ```
//!
//! # Letter case
//!
//! Plain letters do not read the state directly. They read
//! [`CapsMachine::letters_upper`], a boolean that flips on every edge that
//! crosses the Inactive boundary and on every physical CapsLock edge. The
//! virtual Active→Locked step leaves it alone, so a key cycled to Locked
//! stays uppercase. CapsLock pressed while Shift is held flips it back, so
//! Locked can show lowercase letters until the next CapsLock.
//!
//! # Invariants
//!
//! 1. Three [`CapsInput::VirtualToggle`]s return to the starting snapshot.
//! 2. [`CapsInput::CharacterCommitted`] never leaves Locked.
//! 3. The flag only changes on a transition; a `None` result leaves it.

/// Three-valued capitalization mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CapsState {
    /// Lowercase letters, base glyphs.
    #[default]
    Inactive,
    /// Temporarily engaged (held Shift or one-shot virtual shift).
    Active,
    /// Sticky caps lock.
    Locked,
}

impl CapsState {
    /// Whether secondary glyphs are shown.
    #[must_use]
    #[inline]
    pub const fn is_engaged(self) -> bool {
        !matches!(self, Self::Inactive)
    }

    /// Stable lowercase name for logs and render hooks.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Inactive => "inactive",
            Self::Active => "active",
            Self::Locked => "locked",
        }
    }
}

impl std::fmt::Display for CapsState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Inputs that drive the machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CapsInput {
    /// Physical Shift pressed.
    ShiftDown,
    /// Physical Shift released.
    ShiftUp,
    /// Physical CapsLock pressed.
    CapsLockDown,
    /// The on-screen caps key was activated.
    VirtualToggle,
    /// A character key finished its press.
    CharacterCommitted,
}

/// Immutable view handed to edit and glyph functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct CapsSnapshot {
    /// Current state.
    pub state: CapsState,
    /// Whether plain letters are uppercase.
    pub letters_upper: bool,
}

impl CapsSnapshot {
    /// Snapshot as reached from a fresh machine without CapsLock while
    /// Active: letters are uppercase whenever `state` is engaged.
    #[must_use]
    pub const fn of(state: CapsState) -> Self {
        Self {
            state,
            letters_upper: state.is_engaged(),
        }
    }
}

/// A state change produced by [`CapsMachine::apply`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CapsTransition {
    /// Previous state.
    pub from: CapsState,
    /// New state.
    pub to: CapsState,
    /// Letter case after the transition.
    pub letters_upper: bool,
}

/// The caps/shift state machine.
#[derive(Debug, Clone, Default)]
pub struct CapsMachine {
    state: CapsState,
    letters_upper: bool,
}

impl CapsMachine {
    /// Start Inactive with lowercase letters.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            state: CapsState::Inactive,
            letters_upper: false,
        }
    }

    /// Current state.
    #[must_use]
    #[inline]
    pub const fn state(&self) -> CapsState {
        self.state
    }

    /// Whether plain letters are currently uppercase.
    #[must_use]
    #[inline]
    pub const fn letters_upper(&self) -> bool {
        self.letters_upper
    }

    /// Snapshot for edit/glyph resolution.
    #[must_use]
    #[inline]
    pub const fn snapshot(&self) -> CapsSnapshot {
        CapsSnapshot {
            state: self.state,
            letters_upper: self.letters_upper,
        }
    }

    /// The state `input` would lead to, without applying it.
    #[must_use]
    pub const fn next_state(state: CapsState, input: CapsInput) -> CapsState {
        use CapsInput::*;
        use CapsState::*;
        match (state, input) {
            (Inactive, ShiftDown) => Active,
            (Active, ShiftUp) => Inactive,
            (Locked, CapsLockDown) => Inactive,
            (_, CapsLockDown) => Locked,
            (Inactive, VirtualToggle) => Active,
            (Active, VirtualToggle) => Locked,
            (Locked, VirtualToggle) => Inactive,
            (Active, CharacterCommitted) => Inactive,
            (s, _) => s,
        }
    }

    /// Whether the state-changing edge `from -> to` driven by `input` flips
    /// letter case.
    #[must_use]
    pub const fn flips_case(from: CapsState, to: CapsState, input: CapsInput) -> bool {
        matches!(input, CapsInput::CapsLockDown) || from.is_engaged() != to.is_engaged()
    }

    /// Feed one input. Returns `None` when the state does not change.
    pub fn apply(&mut self, input: CapsInput) -> Option<CapsTransition> {
        let from = self.state;
        let to = Self::next_state(from, input);
        if from == to {
            return None;
        }
        if Self::flips_case(from, to, input) {
            self.letters_upper = !self.letters_upper;
        }
        self.state = to;

        #[cfg(feature = "tracing")]
        tracing::debug!(
            from = from.as_str(),
            to = to.as_str(),
            ?input,
            letters_upper = self.letters_upper,
            "caps transition"
        );

        Some(CapsTransition {
            from,
            to,
            letters_upper: self.letters_upper,
        })
    }

    /// Return to Inactive with lowercase letters.
    pub fn reset(&mut self) {
        *self = Self::new();
    }
}
