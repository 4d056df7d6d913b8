#![forbid(unsafe_code)]

//! Core: text edits, caps state, key registry, and hold-repeat timing.
//!
//! # Role in vkbd
//! `vkbd-core` is the pure layer of the on-screen keyboard. It owns no field,
//! no timers backed by the OS, and no rendering. Every type here is driven by
//! explicit inputs (`now: Instant`, caps snapshots, edit contexts) so that the
//! runtime can replay any interaction deterministically.
//!
//! # Primary responsibilities
//! - **Event**: canonical host input (physical keys, virtual key presses,
//!   caret-sync triggers, pointer focus events).
//! - **Edit model**: pure `(before, after, caret) -> EditResult` functions.
//! - **Caps machine**: the Inactive / Active / Locked state machine and the
//!   letter-case flag driven by its transition edges.
//! - **Layout and registry**: key descriptors, glyph resolution, and the
//!   edit function bound to each key.
//! - **Hold-repeat**: cancellable initial-delay + interval timer chains.
//!
//! # How it fits in the system
//! The runtime (`vkbd-runtime`) consumes `vkbd-core::Event` values, reads the
//! bound field through `vkbd-backend` traits, asks the registry for an
//! [`edit::EditResult`], and writes it back.

pub mod caps;
pub mod edit;
pub mod event;
pub mod hold;
pub mod layout;
pub mod registry;
pub mod timer;

pub use caps::{CapsInput, CapsMachine, CapsSnapshot, CapsState, CapsTransition};
pub use edit::{EditContext, EditResult, FieldKind};
pub use event::{Event, KeyCode, KeyEvent, KeyEventKind, Modifiers, PointerSource, PressEvent, PressPhase};
pub use hold::{HoldConfig, HoldPhase, HoldRepeat, PressOutcome};
pub use layout::{KeyDescriptor, KeyId, KeyTone, Layout, LayoutError, WidthClass};
pub use registry::{Glyph, KeyAction, KeyRegistry};
pub use timer::{CancelHandle, TimerEvent, TimerQueue};
