#![forbid(unsafe_code)]

//! Key layouts and key descriptors.
//!
//! A layout is an ordered list of key identifiers. Named identifiers map to
//! action keys, any single printable grapheme is a character key, and the
//! pseudo-identifier `br` ends the current row.
//!
//! ```text
//! 1 2 3 4 5 6 7 8 9 0 ß
//! q w e r t z u i o p ü
//! a s d f g h j k l ö ä
//! caps y x c v b n m backspace
//! spacer space done
//! ```
//!
//! # Failure Modes
//!
//! Layouts are programmer input. Unknown identifiers, duplicate interactive
//! keys, a leading or doubled `br`, and empty layouts are all rejected at
//! construction so that nothing downstream ever sees a malformed key.

use std::collections::HashMap;
use std::fmt;

use unicode_segmentation::UnicodeSegmentation;

use crate::registry::KeyAction;

/// Row break marker accepted by [`Layout::parse`].
pub const ROW_BREAK: &str = "br";

/// The default German-style layout.
pub const GERMAN_LAYOUT: &[&str] = &[
    "1", "2", "3", "4", "5", "6", "7", "8", "9", "0", "ß", ROW_BREAK, //
    "q", "w", "e", "r", "t", "z", "u", "i", "o", "p", "ü", ROW_BREAK, //
    "a", "s", "d", "f", "g", "h", "j", "k", "l", "ö", "ä", ROW_BREAK, //
    "caps", "y", "x", "c", "v", "b", "n", "m", "backspace", ROW_BREAK, //
    "spacer", "space", "done",
];

/// Keys that emit a secondary character while caps is engaged.
pub const SECONDARY_CHARS: &[(&str, &str)] = &[
    ("1", "."),
    ("2", ":"),
    ("3", ","),
    ("4", ";"),
    ("5", "\""),
    ("6", "&"),
    ("7", "/"),
    ("8", "("),
    ("9", ")"),
    ("0", "-"),
    ("ß", "?"),
];

/// Letters rendered in a narrow slot.
const NARROW_LETTERS: &[&str] = &["ä", "ö", "ü"];

// ---------------------------------------------------------------------------
// KeyId
// ---------------------------------------------------------------------------

/// Identifier of a key within a layout (`"a"`, `"backspace"`, `"spacer"`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct KeyId(String);

impl KeyId {
    /// Create an identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The identifier text.
    #[must_use]
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for KeyId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl From<String> for KeyId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&KeyId> for KeyId {
    fn from(id: &KeyId) -> Self {
        id.clone()
    }
}

impl fmt::Display for KeyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::borrow::Borrow<str> for KeyId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

// ---------------------------------------------------------------------------
// Descriptors
// ---------------------------------------------------------------------------

/// Width hint for the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum WidthClass {
    #[default]
    Normal,
    Narrow,
    Wide,
    ExtraWide,
}

/// Color hint for the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum KeyTone {
    #[default]
    Light,
    Dark,
    Accent,
}

/// One key in a layout. Immutable once the layout is built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyDescriptor {
    /// Identifier, unique among interactive keys.
    pub id: KeyId,
    /// What the key does.
    pub action: KeyAction,
    /// Width hint.
    pub width: WidthClass,
    /// Color hint.
    pub tone: KeyTone,
    /// Whether a row ends after this key.
    pub line_break_after: bool,
}

impl KeyDescriptor {
    /// Spacers are invisible and inert.
    #[must_use]
    #[inline]
    pub fn is_hidden(&self) -> bool {
        matches!(self.action, KeyAction::Spacer)
    }

    /// Classify a single identifier.
    pub fn from_id(id: &str) -> Result<Self, LayoutError> {
        let (action, width, tone) = match id {
            "space" => (KeyAction::Space, WidthClass::ExtraWide, KeyTone::Light),
            "enter" => (KeyAction::Enter, WidthClass::Wide, KeyTone::Dark),
            "backspace" => (KeyAction::Backspace, WidthClass::Wide, KeyTone::Dark),
            "delete" => (KeyAction::Delete, WidthClass::Wide, KeyTone::Dark),
            "caps" => (KeyAction::Caps, WidthClass::Wide, KeyTone::Dark),
            "done" => (KeyAction::Done, WidthClass::Wide, KeyTone::Accent),
            "spacer" => (KeyAction::Spacer, WidthClass::Normal, KeyTone::Light),
            "spacer-narrow" => (KeyAction::Spacer, WidthClass::Narrow, KeyTone::Light),
            "spacer-wide" => (KeyAction::Spacer, WidthClass::Wide, KeyTone::Light),
            other if is_character_id(other) => {
                if let Some((_, secondary)) = SECONDARY_CHARS.iter().find(|(base, _)| *base == other) {
                    (
                        KeyAction::Secondary {
                            base: other.to_owned(),
                            secondary: (*secondary).to_owned(),
                        },
                        WidthClass::Normal,
                        KeyTone::Dark,
                    )
                } else {
                    let width = if NARROW_LETTERS.contains(&other) {
                        WidthClass::Narrow
                    } else {
                        WidthClass::Normal
                    };
                    (KeyAction::Char(other.to_owned()), width, KeyTone::Light)
                }
            }
            other => return Err(LayoutError::UnknownKey(other.to_owned())),
        };
        Ok(Self {
            id: KeyId::from(id),
            action,
            width,
            tone,
            line_break_after: false,
        })
    }
}

fn is_character_id(id: &str) -> bool {
    let mut graphemes = id.graphemes(true);
    match (graphemes.next(), graphemes.next()) {
        (Some(g), None) => !g.chars().any(|c| c.is_whitespace() || c.is_control()),
        _ => false,
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Why a layout was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LayoutError {
    /// Identifier is neither a named action nor a single printable grapheme.
    UnknownKey(String),
    /// An interactive identifier appears twice.
    DuplicateKey(String),
    /// A row break at `index` has no key before it.
    MisplacedBreak(usize),
    /// The layout has no keys.
    Empty,
}

impl fmt::Display for LayoutError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownKey(id) => write!(f, "unknown key identifier {id:?}"),
            Self::DuplicateKey(id) => write!(f, "duplicate key identifier {id:?}"),
            Self::MisplacedBreak(idx) => write!(f, "row break at position {idx} does not follow a key"),
            Self::Empty => write!(f, "layout contains no keys"),
        }
    }
}

impl std::error::Error for LayoutError {}

// ---------------------------------------------------------------------------
// Layout
// ---------------------------------------------------------------------------

/// An ordered, validated set of key descriptors.
#[derive(Debug, Clone)]
pub struct Layout {
    keys: Vec<KeyDescriptor>,
    index: HashMap<KeyId, usize>,
}

impl Layout {
    /// The built-in German-style layout.
    pub fn german() -> Result<Self, LayoutError> {
        Self::parse(GERMAN_LAYOUT)
    }

    /// Build a layout from identifiers, failing on the first bad entry.
    pub fn parse<S: AsRef<str>>(ids: &[S]) -> Result<Self, LayoutError> {
        let mut keys: Vec<KeyDescriptor> = Vec::with_capacity(ids.len());
        let mut index = HashMap::with_capacity(ids.len());
        let mut prev_was_break = true;

        for (pos, raw) in ids.iter().enumerate() {
            let id = raw.as_ref();
            if id == ROW_BREAK {
                match keys.last_mut() {
                    Some(last) if !prev_was_break => last.line_break_after = true,
                    _ => return Err(LayoutError::MisplacedBreak(pos)),
                }
                prev_was_break = true;
                continue;
            }
            let desc = KeyDescriptor::from_id(id)?;
            if !desc.is_hidden() && index.insert(desc.id.clone(), keys.len()).is_some() {
                return Err(LayoutError::DuplicateKey(id.to_owned()));
            }
            keys.push(desc);
            prev_was_break = false;
        }

        if keys.is_empty() {
            return Err(LayoutError::Empty);
        }
        Ok(Self { keys, index })
    }

    /// All keys in layout order, spacers included.
    #[must_use]
    #[inline]
    pub fn keys(&self) -> &[KeyDescriptor] {
        &self.keys
    }

    /// Look up an interactive key.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&KeyDescriptor> {
        self.index.get(id).map(|&i| &self.keys[i])
    }

    /// Number of keys, spacers included.
    #[must_use]
    #[inline]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Always false for a constructed layout.
    #[must_use]
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Keys grouped into rows.
    #[must_use]
    pub fn rows(&self) -> Vec<&[KeyDescriptor]> {
        let mut rows = Vec::new();
        let mut start = 0;
        for (i, key) in self.keys.iter().enumerate() {
            if key.line_break_after {
                rows.push(&self.keys[start..=i]);
                start = i + 1;
            }
        }
        if start < self.keys.len() {
            rows.push(&self.keys[start..]);
        }
        rows
    }

    /// Interactive (non-spacer) keys.
    pub fn interactive(&self) -> impl Iterator<Item = &KeyDescriptor> {
        self.keys.iter().filter(|k| !k.is_hidden())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn german_layout_shape() {
        let layout = Layout::german().unwrap();
        assert_eq!(layout.len(), 45);
        let rows = layout.rows();
        assert_eq!(rows.len(), 5);
        assert_eq!(rows[0].last().unwrap().id.as_str(), "ß");
        assert_eq!(rows[1].last().unwrap().id.as_str(), "ü");
        assert_eq!(rows[2].last().unwrap().id.as_str(), "ä");
        assert_eq!(rows[3].last().unwrap().id.as_str(), "backspace");
        assert_eq!(rows[4].len(), 3);
    }

    #[test]
    fn hints_follow_key_kind() {
        let layout = Layout::german().unwrap();
        assert_eq!(layout.get("ö").unwrap().width, WidthClass::Narrow);
        assert_eq!(layout.get("space").unwrap().width, WidthClass::ExtraWide);
        assert_eq!(layout.get("7").unwrap().tone, KeyTone::Dark);
        assert_eq!(layout.get("done").unwrap().tone, KeyTone::Accent);
        assert_eq!(layout.get("q").unwrap().tone, KeyTone::Light);
    }

    #[test]
    fn secondary_keys_are_classified() {
        let layout = Layout::german().unwrap();
        assert_eq!(
            layout.get("ß").unwrap().action,
            KeyAction::Secondary {
                base: "ß".into(),
                secondary: "?".into()
            }
        );
        assert_eq!(layout.get("ä").unwrap().action, KeyAction::Char("ä".into()));
    }

    #[test]
    fn spacers_are_hidden_and_not_indexed() {
        let layout = Layout::parse(&["a", "spacer", "spacer", "spacer-wide", "b"]).unwrap();
        assert_eq!(layout.len(), 5);
        assert!(layout.get("spacer").is_none());
        assert_eq!(layout.interactive().count(), 2);
    }

    #[test]
    fn unknown_identifier_fails_fast() {
        let err = Layout::parse(&["a", "shift-lock", "b"]).unwrap_err();
        assert_eq!(err, LayoutError::UnknownKey("shift-lock".into()));
        assert!(Layout::parse(&[" "]).is_err());
    }

    #[test]
    fn duplicate_identifier_fails() {
        let err = Layout::parse(&["a", "b", "a"]).unwrap_err();
        assert_eq!(err, LayoutError::DuplicateKey("a".into()));
    }

    #[test]
    fn misplaced_breaks_fail() {
        assert_eq!(Layout::parse(&["br", "a"]).unwrap_err(), LayoutError::MisplacedBreak(0));
        assert_eq!(
            Layout::parse(&["a", "br", "br"]).unwrap_err(),
            LayoutError::MisplacedBreak(2)
        );
    }

    #[test]
    fn empty_layout_fails() {
        let ids: [&str; 0] = [];
        assert_eq!(Layout::parse(&ids).unwrap_err(), LayoutError::Empty);
    }

    #[test]
    fn error_messages() {
        assert_eq!(
            LayoutError::UnknownKey("x1".into()).to_string(),
            "unknown key identifier \"x1\""
        );
    }
}
