#![forbid(unsafe_code)]

//! vkbd public facade crate.
//!
//! This crate provides the stable surface area for hosts. It re-exports the
//! common types from the internal crates, adds a unified [`Error`], and
//! offers a prelude for day-to-day usage.
//!
//! ```ignore
//! use vkbd::prelude::*;
//!
//! let mut kb = vkbd::build(&KeyboardConfig::from_env(), my_presenter)?;
//! kb.focus(Box::new(field), Instant::now());
//! kb.handle_event(&Event::press("a", PressPhase::Start), Instant::now());
//! ```

pub mod error;

// --- Core re-exports -------------------------------------------------------

pub use vkbd_core::caps::{CapsInput, CapsMachine, CapsSnapshot, CapsState};
pub use vkbd_core::edit::{EditContext, EditResult, FieldKind};
pub use vkbd_core::event::{
    Event, KeyCode, KeyEvent, KeyEventKind, Modifiers, PointerSource, PressEvent, PressPhase,
};
pub use vkbd_core::hold::{HoldConfig, HoldRepeat};
pub use vkbd_core::layout::{KeyDescriptor, KeyId, KeyTone, Layout, LayoutError, WidthClass};
pub use vkbd_core::registry::{Glyph, KeyAction, KeyRegistry};

// --- Backend re-exports ----------------------------------------------------

pub use vkbd_backend::{Clock, EventSource, HostField, MemoryField, Presenter};

// --- Runtime re-exports ----------------------------------------------------

pub use vkbd_runtime::{
    BindingTable, CloseCallback, ConfigError, InputCallback, KeyboardConfig, Operation,
    RepeatConfig, VirtualKeyboard,
};

// --- Web re-exports --------------------------------------------------------

#[cfg(feature = "web")]
pub use vkbd_web::{WebKeyboard, WebKeyboardError, WebOutputs, WebPresenter};

pub use error::{Error, Result};

/// Clock type every timestamped call takes (`performance.now()` on wasm).
pub use web_time::Instant;

/// Validate `config` and build an initialized (rendered, hidden) keyboard.
pub fn build<P: Presenter>(config: &KeyboardConfig, presenter: P) -> Result<VirtualKeyboard<P>> {
    let config = config.clone().validated()?;
    let mut keyboard = VirtualKeyboard::new(&config, presenter)?;
    keyboard.init();
    Ok(keyboard)
}

/// Load and validate a TOML configuration file.
#[cfg(feature = "config-file")]
pub fn load_config(path: impl AsRef<std::path::Path>) -> Result<KeyboardConfig> {
    Ok(KeyboardConfig::from_toml_file(path)?.validated()?)
}

// --- Prelude --------------------------------------------------------------

pub mod prelude {
    pub use crate::{
        CapsState, Error, Event, Glyph, HostField, KeyCode, KeyEvent, KeyId, KeyboardConfig,
        MemoryField, Presenter, PressPhase, Result, VirtualKeyboard,
    };

    #[cfg(feature = "web")]
    pub use crate::WebKeyboard;

    pub use crate::{Instant, backend, core, runtime};
}

pub use vkbd_backend as backend;
pub use vkbd_core as core;
pub use vkbd_runtime as runtime;
#[cfg(feature = "web")]
pub use vkbd_web as web;
