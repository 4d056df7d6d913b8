#![forbid(unsafe_code)]

use std::convert::Infallible;

use vkbd::prelude::*;

#[derive(Default)]
struct Visibility {
    shown: Vec<bool>,
}

impl Presenter for Visibility {
    type Error = Infallible;

    fn render_caps_visual_state(&mut self, _: CapsState) -> std::result::Result<(), Infallible> {
        Ok(())
    }

    fn render_key_glyph(&mut self, _: &KeyId, _: &Glyph) -> std::result::Result<(), Infallible> {
        Ok(())
    }

    fn render_key_pressed(&mut self, _: &KeyId, _: bool) -> std::result::Result<(), Infallible> {
        Ok(())
    }

    fn set_visible(&mut self, visible: bool) -> std::result::Result<(), Infallible> {
        self.shown.push(visible);
        Ok(())
    }
}

#[test]
fn build_initializes_hidden() {
    let kb = vkbd::build(&KeyboardConfig::default(), Visibility::default()).unwrap();
    assert!(kb.is_initialized());
    assert!(!kb.is_visible());
    assert_eq!(kb.presenter().shown, vec![false]);
}

#[test]
fn build_rejects_invalid_config() {
    let config = KeyboardConfig::default().with_layout(["a", "a"]);
    let err = vkbd::build(&config, Visibility::default()).unwrap_err();
    assert!(matches!(err, Error::Config(_)));
    assert!(!err.is_recoverable());
}

#[test]
fn prelude_is_enough_to_type() -> Result<()> {
    let mut kb = vkbd::build(&KeyboardConfig::default(), Visibility::default())?;
    let field = MemoryField::new("");
    let now = Instant::now();
    kb.focus(Box::new(field.clone()), now);
    kb.handle_event(&Event::press("ß", PressPhase::Start), now);
    kb.handle_event(&Event::press("ß", PressPhase::End), now);
    assert_eq!(field.value(), "ß");
    Ok(())
}
