#![forbid(unsafe_code)]

//! vkbd Runtime
//!
//! This crate ties the pure core (`vkbd-core`) to a host (`vkbd-backend`
//! traits) and provides the widget hosts actually instantiate.
//!
//! # Key Components
//!
//! - [`VirtualKeyboard`] - The widget: lifecycle, dispatch, and rendering
//! - [`Session`] - Field binding, value/caret mirror, and callbacks
//! - [`BindingTable`] - Declarative `(event, target) -> operations` table
//! - [`KeyboardConfig`] - Timing and layout as data
//!
//! # Role in vkbd
//! `vkbd-runtime` is the orchestrator. It receives canonical events, fires
//! due hold-repeats, resolves edits through the key registry, and applies
//! them to the bound field through the session. Nothing here owns a timer or
//! a thread; time always arrives as an explicit `Instant`.

pub mod bindings;
pub mod config;
pub mod keyboard;
pub mod session;

pub use bindings::{Binding, BindingTable, EventKind, KeyTarget, Operation};
pub use config::{ConfigError, KeyboardConfig, RepeatConfig};
pub use keyboard::VirtualKeyboard;
pub use session::{CloseCallback, Closed, InputCallback, Session};
