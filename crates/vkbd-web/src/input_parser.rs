#![forbid(unsafe_code)]

//! JSON input parser for host-encoded DOM events.
//!
//! The JS shim serializes each DOM event it listens to as a small JSON
//! object; [`parse_encoded_input_to_event`] turns one into an [`Event`].
//!
//! ```text
//! {"kind":"key","phase":"down","key":"Shift","mods":1}
//! {"kind":"press","phase":"start","key":"a","source":"touch"}
//! {"kind":"input"}            {"kind":"selectionchange"}
//! {"kind":"pointerup"}        {"kind":"touchend"}
//! {"kind":"pointerdown","inside":false}
//! {"kind":"tick"}
//! ```
//!
//! DOM kinds the keyboard listens to but does not react to (`focus`, `blur`,
//! `scroll`, `resize`) return `Ok(None)`. Anything else is an error.

use serde::Deserialize;
use vkbd_core::event::{
    Event, KeyCode, KeyEvent, KeyEventKind, Modifiers, PointerSource, PressEvent, PressPhase,
};

/// Errors from parsing encoded input JSON.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputParseError {
    /// Malformed JSON.
    Json(String),
    /// Missing required field.
    MissingField(&'static str),
    /// Unknown phase value for the event kind.
    UnknownPhase(String),
    /// Unknown event kind.
    UnknownKind(String),
}

impl core::fmt::Display for InputParseError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Json(msg) => write!(f, "JSON parse error: {msg}"),
            Self::MissingField(field) => write!(f, "missing required field: {field}"),
            Self::UnknownPhase(phase) => write!(f, "unknown phase: {phase}"),
            Self::UnknownKind(kind) => write!(f, "unknown event kind: {kind}"),
        }
    }
}

impl std::error::Error for InputParseError {}

/// Internal deserialization target for the host's JSON schema.
#[derive(Debug, Deserialize)]
struct RawInput {
    kind: String,
    #[serde(default)]
    phase: Option<String>,
    #[serde(default)]
    key: Option<String>,
    #[serde(default)]
    mods: Option<i32>,
    #[serde(default)]
    source: Option<String>,
    #[serde(default)]
    inside: Option<bool>,
}

/// Parse a JSON-encoded host event into an [`Event`].
///
/// Returns `Ok(None)` for DOM kinds with no keyboard meaning and `Err` for
/// malformed JSON, missing fields, or unknown kinds and phases.
pub fn parse_encoded_input_to_event(json: &str) -> Result<Option<Event>, InputParseError> {
    let raw: RawInput =
        serde_json::from_str(json).map_err(|e| InputParseError::Json(e.to_string()))?;

    match raw.kind.as_str() {
        "key" => parse_key_event(&raw).map(Some),
        "press" => parse_press_event(&raw).map(Some),
        "input" => Ok(Some(Event::FieldInput)),
        "selectionchange" => Ok(Some(Event::SelectionChange)),
        "pointerup" | "mouseup" => Ok(Some(Event::PointerUp)),
        "touchend" => Ok(Some(Event::TouchEnd)),
        "pointerdown" | "mousedown" => match raw.inside {
            Some(true) => Ok(Some(Event::PointerDownInside)),
            Some(false) => Ok(Some(Event::PointerDownOutside)),
            None => Err(InputParseError::MissingField("inside")),
        },
        "tick" => Ok(Some(Event::Tick)),
        "focus" | "blur" | "scroll" | "resize" => Ok(None),
        other => Err(InputParseError::UnknownKind(other.to_string())),
    }
}

fn parse_modifiers(mods: Option<i32>) -> Modifiers {
    let bits = mods.unwrap_or(0).clamp(0, i32::from(u8::MAX)) as u8;
    Modifiers::from_bits_truncate(bits)
}

fn required_key(raw: &RawInput) -> Result<&str, InputParseError> {
    raw.key
        .as_deref()
        .filter(|s| !s.is_empty())
        .ok_or(InputParseError::MissingField("key"))
}

fn parse_key_event(raw: &RawInput) -> Result<Event, InputParseError> {
    let kind = match raw.phase.as_deref().unwrap_or("down") {
        "down" => KeyEventKind::Press,
        "up" => KeyEventKind::Release,
        other => return Err(InputParseError::UnknownPhase(other.to_string())),
    };
    let code = KeyCode::from_dom_key(required_key(raw)?);
    Ok(Event::Key(
        KeyEvent::new(code)
            .with_modifiers(parse_modifiers(raw.mods))
            .with_kind(kind),
    ))
}

fn parse_press_event(raw: &RawInput) -> Result<Event, InputParseError> {
    let phase = match raw.phase.as_deref() {
        Some("start") => PressPhase::Start,
        Some("end") => PressPhase::End,
        Some("leave") => PressPhase::Leave,
        Some("cancel") => PressPhase::Cancel,
        Some(other) => return Err(InputParseError::UnknownPhase(other.to_string())),
        None => return Err(InputParseError::MissingField("phase")),
    };
    // Touch is only reported when the host says so; everything else is a mouse.
    let source = match raw.source.as_deref() {
        Some("touch") => PointerSource::Touch,
        _ => PointerSource::Mouse,
    };
    let key = required_key(raw)?;
    Ok(Event::Press(PressEvent::new(key, phase).with_source(source)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn key_down_shift_with_mods() {
        let ev = parse_encoded_input_to_event(r#"{"kind":"key","phase":"down","key":"Shift","mods":1}"#)
            .unwrap()
            .unwrap();
        assert_eq!(
            ev,
            Event::Key(KeyEvent {
                code: KeyCode::Shift,
                modifiers: Modifiers::SHIFT,
                kind: KeyEventKind::Press,
            })
        );
    }

    #[test]
    fn key_up_caps_lock() {
        let ev = parse_encoded_input_to_event(r#"{"kind":"key","phase":"up","key":"CapsLock"}"#)
            .unwrap()
            .unwrap();
        assert_eq!(
            ev,
            Event::Key(KeyEvent::new(KeyCode::CapsLock).with_kind(KeyEventKind::Release))
        );
    }

    #[test]
    fn key_phase_defaults_to_down() {
        let ev = parse_encoded_input_to_event(r#"{"kind":"key","key":"x"}"#)
            .unwrap()
            .unwrap();
        assert_eq!(ev, Event::Key(KeyEvent::new(KeyCode::Char('x'))));
    }

    #[test]
    fn out_of_range_mods_are_clamped() {
        let ev = parse_encoded_input_to_event(r#"{"kind":"key","key":"a","mods":-4}"#)
            .unwrap()
            .unwrap();
        let Event::Key(k) = ev else {
            panic!("expected key event");
        };
        assert_eq!(k.modifiers, Modifiers::NONE);
    }

    #[test]
    fn press_touch_start() {
        let ev = parse_encoded_input_to_event(
            r#"{"kind":"press","phase":"start","key":"backspace","source":"touch"}"#,
        )
        .unwrap()
        .unwrap();
        assert_eq!(
            ev,
            Event::Press(PressEvent::new("backspace", PressPhase::Start).with_source(PointerSource::Touch))
        );
    }

    #[test]
    fn press_leave_defaults_to_mouse() {
        let ev = parse_encoded_input_to_event(r#"{"kind":"press","phase":"leave","key":"ß"}"#)
            .unwrap()
            .unwrap();
        assert_eq!(ev, Event::press("ß", PressPhase::Leave));
    }

    #[test]
    fn field_and_document_events() {
        let cases = [
            (r#"{"kind":"input"}"#, Event::FieldInput),
            (r#"{"kind":"selectionchange"}"#, Event::SelectionChange),
            (r#"{"kind":"pointerup"}"#, Event::PointerUp),
            (r#"{"kind":"touchend"}"#, Event::TouchEnd),
            (r#"{"kind":"pointerdown","inside":true}"#, Event::PointerDownInside),
            (r#"{"kind":"mousedown","inside":false}"#, Event::PointerDownOutside),
            (r#"{"kind":"tick"}"#, Event::Tick),
        ];
        for (json, expected) in cases {
            assert_eq!(parse_encoded_input_to_event(json).unwrap(), Some(expected), "{json}");
        }
    }

    #[test]
    fn ignored_kinds_return_none() {
        assert_eq!(parse_encoded_input_to_event(r#"{"kind":"focus"}"#).unwrap(), None);
        assert_eq!(parse_encoded_input_to_event(r#"{"kind":"scroll"}"#).unwrap(), None);
    }

    #[test]
    fn errors() {
        assert!(matches!(
            parse_encoded_input_to_event("not json"),
            Err(InputParseError::Json(_))
        ));
        assert_eq!(
            parse_encoded_input_to_event(r#"{"kind":"wheel"}"#),
            Err(InputParseError::UnknownKind("wheel".into()))
        );
        assert_eq!(
            parse_encoded_input_to_event(r#"{"kind":"press","phase":"hold","key":"a"}"#),
            Err(InputParseError::UnknownPhase("hold".into()))
        );
        assert_eq!(
            parse_encoded_input_to_event(r#"{"kind":"press","key":"a"}"#),
            Err(InputParseError::MissingField("phase"))
        );
        assert_eq!(
            parse_encoded_input_to_event(r#"{"kind":"press","phase":"end","key":""}"#),
            Err(InputParseError::MissingField("key"))
        );
        assert_eq!(
            parse_encoded_input_to_event(r#"{"kind":"key","phase":"repeat","key":"a"}"#),
            Err(InputParseError::UnknownPhase("repeat".into()))
        );
        assert_eq!(
            parse_encoded_input_to_event(r#"{"kind":"pointerdown"}"#),
            Err(InputParseError::MissingField("inside"))
        );
    }
}
