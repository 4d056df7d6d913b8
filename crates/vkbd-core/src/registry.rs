#![forbid(unsafe_code)]

//! Key action registry: edit functions and glyph resolution per key.
//!
//! Every key in a [`Layout`] carries a [`KeyAction`]. The action decides two
//! things, both as pure functions of an explicit [`CapsSnapshot`]:
//!
//! - which [`EditResult`] a commit produces ([`KeyAction::edit`]), and
//! - what the key currently displays ([`KeyAction::glyph`]).
//!
//! # Character resolution
//!
//! | Action      | Inactive        | Active / Locked     |
//! |-------------|-----------------|---------------------|
//! | `Char`      | case from `letters_upper` | case from `letters_upper` |
//! | `Secondary` | base            | secondary           |
//!
//! Space, Enter, Backspace, and Delete ignore caps entirely.

use crate::caps::{CapsSnapshot, CapsState};
use crate::edit::{self, EditContext, EditResult};
use crate::layout::{KeyDescriptor, KeyId, Layout, LayoutError};

/// Material icon names used for action keys.
pub mod icons {
    pub const SPACE: &str = "space_bar";
    pub const ENTER: &str = "keyboard_return";
    pub const BACKSPACE: &str = "backspace";
    pub const DELETE: &str = "delete";
    pub const CAPS: &str = "keyboard_arrow_up";
    pub const CAPS_LOCKED: &str = "keyboard_capslock";
    pub const DONE: &str = "check_circle";
}

/// What a key does when activated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyAction {
    /// A letter or symbol whose case follows the letter-case flag.
    Char(String),
    /// A key that swaps to a secondary character while caps is engaged.
    Secondary {
        /// Emitted while Inactive.
        base: String,
        /// Emitted while Active or Locked.
        secondary: String,
    },
    /// Literal space.
    Space,
    /// Newline, or nothing in single-line fields.
    Enter,
    /// Delete backward.
    Backspace,
    /// Delete forward.
    Delete,
    /// Cycle caps state.
    Caps,
    /// Close the keyboard.
    Done,
    /// Invisible filler.
    Spacer,
}

/// What a key displays.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Glyph {
    /// A single text label.
    Text(String),
    /// A large label plus a small hint label.
    Pair {
        /// Character the key emits now.
        big: String,
        /// Character the key emits in the other caps mode.
        small: String,
    },
    /// An icon by name.
    Icon(&'static str),
    /// Not rendered.
    Hidden,
}

impl KeyAction {
    /// Text a character key emits under `caps`, or `None` for action keys.
    #[must_use]
    pub fn emitted_text(&self, caps: CapsSnapshot) -> Option<String> {
        match self {
            Self::Char(c) => Some(if caps.letters_upper {
                c.to_uppercase()
            } else {
                c.to_lowercase()
            }),
            Self::Secondary { base, secondary } => Some(if caps.state.is_engaged() {
                secondary.clone()
            } else {
                base.clone()
            }),
            _ => None,
        }
    }

    /// Compute the edit this key commits, or `None` if it does not edit.
    #[must_use]
    pub fn edit(&self, ctx: &EditContext, caps: CapsSnapshot) -> Option<EditResult> {
        match self {
            Self::Char(_) | Self::Secondary { .. } => self
                .emitted_text(caps)
                .map(|text| edit::insert_text(ctx, &text)),
            Self::Space => Some(edit::insert_space(ctx)),
            Self::Enter => Some(edit::enter(ctx)),
            Self::Backspace => Some(edit::backspace(ctx)),
            Self::Delete => Some(edit::delete_forward(ctx)),
            Self::Caps | Self::Done | Self::Spacer => None,
        }
    }

    /// Resolve the display glyph under `caps`.
    #[must_use]
    pub fn glyph(&self, caps: CapsSnapshot) -> Glyph {
        match self {
            Self::Char(_) => Glyph::Text(self.emitted_text(caps).unwrap_or_default()),
            Self::Secondary { base, secondary } => {
                if caps.state.is_engaged() {
                    Glyph::Pair {
                        big: secondary.clone(),
                        small: base.clone(),
                    }
                } else {
                    Glyph::Pair {
                        big: base.clone(),
                        small: secondary.clone(),
                    }
                }
            }
            Self::Space => Glyph::Icon(icons::SPACE),
            Self::Enter => Glyph::Icon(icons::ENTER),
            Self::Backspace => Glyph::Icon(icons::BACKSPACE),
            Self::Delete => Glyph::Icon(icons::DELETE),
            Self::Caps if caps.state == CapsState::Locked => Glyph::Icon(icons::CAPS_LOCKED),
            Self::Caps => Glyph::Icon(icons::CAPS),
            Self::Done => Glyph::Icon(icons::DONE),
            Self::Spacer => Glyph::Hidden,
        }
    }

    /// Whether committing this key counts as a character commit for one-shot shift.
    #[must_use]
    #[inline]
    pub fn is_character(&self) -> bool {
        matches!(self, Self::Char(_) | Self::Secondary { .. })
    }

    /// Whether holding this key repeats its edit.
    #[must_use]
    #[inline]
    pub fn repeats(&self) -> bool {
        matches!(
            self,
            Self::Char(_)
                | Self::Secondary { .. }
                | Self::Space
                | Self::Enter
                | Self::Backspace
                | Self::Delete
        )
    }
}

/// Lookup from key identifier to action, built once from a layout.
#[derive(Debug, Clone)]
pub struct KeyRegistry {
    layout: Layout,
}

impl KeyRegistry {
    /// Build a registry over a validated layout.
    #[must_use]
    pub fn new(layout: Layout) -> Self {
        Self { layout }
    }

    /// Registry over the built-in German layout.
    pub fn german() -> Result<Self, LayoutError> {
        Layout::german().map(Self::new)
    }

    /// The underlying layout.
    #[must_use]
    #[inline]
    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    /// Descriptor for an interactive key.
    #[must_use]
    pub fn descriptor(&self, key: &KeyId) -> Option<&KeyDescriptor> {
        self.layout.get(key.as_str())
    }

    /// Action for an interactive key.
    #[must_use]
    pub fn action(&self, key: &KeyId) -> Option<&KeyAction> {
        self.descriptor(key).map(|d| &d.action)
    }

    /// Edit produced by committing `key` against `ctx`.
    #[must_use]
    pub fn edit(&self, key: &KeyId, ctx: &EditContext, caps: CapsSnapshot) -> Option<EditResult> {
        let result = self.action(key)?.edit(ctx, caps)?;

        #[cfg(feature = "tracing")]
        tracing::trace!(
            key = key.as_str(),
            caret = result.new_caret,
            value_len = result.new_value.len(),
            "key edit"
        );

        Some(result)
    }

    /// Glyph `key` displays under `caps`.
    #[must_use]
    pub fn glyph(&self, key: &KeyId, caps: CapsSnapshot) -> Option<Glyph> {
        self.action(key).map(|a| a.glyph(caps))
    }

    /// Glyphs for every interactive key, in layout order.
    #[must_use]
    pub fn glyphs(&self, caps: CapsSnapshot) -> Vec<(KeyId, Glyph)> {
        self.layout
            .interactive()
            .map(|d| (d.id.clone(), d.action.glyph(caps)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::caps::{CapsInput, CapsMachine};

    fn id(s: &str) -> KeyId {
        KeyId::from(s)
    }

    fn registry() -> KeyRegistry {
        KeyRegistry::german().unwrap()
    }

    const INACTIVE: CapsSnapshot = CapsSnapshot::of(CapsState::Inactive);
    const ACTIVE: CapsSnapshot = CapsSnapshot::of(CapsState::Active);
    const LOCKED: CapsSnapshot = CapsSnapshot::of(CapsState::Locked);

    #[test]
    fn letters_follow_case_flag() {
        let r = registry();
        let ctx = EditContext::new("", "");
        assert_eq!(r.edit(&id("q"), &ctx, INACTIVE).unwrap().new_value, "q");
        assert_eq!(r.edit(&id("q"), &ctx, ACTIVE).unwrap().new_value, "Q");
        assert_eq!(r.edit(&id("ü"), &ctx, LOCKED).unwrap().new_value, "Ü");
    }

    #[test]
    fn secondary_follows_state() {
        let r = registry();
        let ctx = EditContext::new("x", "");
        assert_eq!(r.edit(&id("1"), &ctx, INACTIVE).unwrap(), EditResult::new("x1", 2));
        assert_eq!(r.edit(&id("1"), &ctx, ACTIVE).unwrap(), EditResult::new("x.", 2));
        assert_eq!(r.edit(&id("ß"), &ctx, LOCKED).unwrap(), EditResult::new("x?", 2));
    }

    #[test]
    fn secondary_glyph_swaps_big_and_small() {
        let r = registry();
        assert_eq!(
            r.glyph(&id("0"), INACTIVE).unwrap(),
            Glyph::Pair {
                big: "0".into(),
                small: "-".into()
            }
        );
        assert_eq!(
            r.glyph(&id("0"), ACTIVE).unwrap(),
            Glyph::Pair {
                big: "-".into(),
                small: "0".into()
            }
        );
    }

    #[test]
    fn caps_icon_tracks_lock() {
        let r = registry();
        assert_eq!(r.glyph(&id("caps"), ACTIVE).unwrap(), Glyph::Icon(icons::CAPS));
        assert_eq!(r.glyph(&id("caps"), LOCKED).unwrap(), Glyph::Icon(icons::CAPS_LOCKED));
    }

    #[test]
    fn space_ignores_caps() {
        let r = registry();
        let ctx = EditContext::new("a", "b");
        assert_eq!(r.edit(&id("space"), &ctx, LOCKED).unwrap(), EditResult::new("a b", 2));
    }

    #[test]
    fn non_editing_keys_return_none() {
        let r = registry();
        let ctx = EditContext::new("a", "");
        assert!(r.edit(&id("caps"), &ctx, INACTIVE).is_none());
        assert!(r.edit(&id("done"), &ctx, INACTIVE).is_none());
        assert!(r.edit(&id("nope"), &ctx, INACTIVE).is_none());
    }

    #[test]
    fn glyphs_cover_interactive_keys() {
        let r = registry();
        let glyphs = r.glyphs(INACTIVE);
        assert_eq!(glyphs.len(), 44);
        assert!(glyphs.iter().all(|(_, g)| *g != Glyph::Hidden));
    }

    #[test]
    fn machine_snapshot_drives_resolution() {
        let r = registry();
        let mut m = CapsMachine::new();
        m.apply(CapsInput::VirtualToggle);
        m.apply(CapsInput::VirtualToggle);
        assert_eq!(r.glyph(&id("a"), m.snapshot()).unwrap(), Glyph::Text("A".into()));
        assert_eq!(r.glyph(&id("5"), m.snapshot()).unwrap(), Glyph::Pair {
            big: "\"".into(),
            small: "5".into()
        });
    }

    #[test]
    fn action_classification() {
        assert!(KeyAction::Char("a".into()).is_character());
        assert!(!KeyAction::Space.is_character());
        assert!(KeyAction::Backspace.repeats());
        assert!(!KeyAction::Caps.repeats());
        assert!(!KeyAction::Done.repeats());
    }
}
