#![no_main]

use std::convert::Infallible;
use std::time::Duration;

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use vkbd_backend::{HostField, MemoryField, Presenter};
use vkbd_core::caps::CapsState;
use vkbd_core::edit::grapheme_len;
use vkbd_core::event::{Event, KeyCode, KeyEvent, KeyEventKind, PressPhase};
use vkbd_core::layout::{GERMAN_LAYOUT, KeyId, ROW_BREAK};
use vkbd_core::registry::Glyph;
use vkbd_runtime::{KeyboardConfig, VirtualKeyboard};
use web_time::Instant;

struct NullPresenter;

impl Presenter for NullPresenter {
    type Error = Infallible;

    fn render_caps_visual_state(&mut self, _: CapsState) -> Result<(), Infallible> {
        Ok(())
    }

    fn render_key_glyph(&mut self, _: &KeyId, _: &Glyph) -> Result<(), Infallible> {
        Ok(())
    }

    fn render_key_pressed(&mut self, _: &KeyId, _: bool) -> Result<(), Infallible> {
        Ok(())
    }

    fn set_visible(&mut self, _: bool) -> Result<(), Infallible> {
        Ok(())
    }
}

#[derive(Debug, Arbitrary)]
enum Step {
    Press { key: u8, phase: u8 },
    Shift(bool),
    CapsLock,
    Caret(u8),
    Focus,
    Outside,
    Inside,
    Wait(u16),
}

fuzz_target!(|steps: Vec<Step>| {
    let keys: Vec<&str> = GERMAN_LAYOUT.iter().copied().filter(|k| *k != ROW_BREAK).collect();
    let Ok(mut kb) = VirtualKeyboard::new(&KeyboardConfig::default(), NullPresenter) else {
        return;
    };
    kb.init();
    let field = MemoryField::new("");
    let mut now = Instant::now();
    kb.focus(Box::new(field.clone()), now);

    for step in steps.into_iter().take(256) {
        let event = match step {
            Step::Press { key, phase } => {
                let key = keys[usize::from(key) % keys.len()];
                let phase = match phase % 4 {
                    0 => PressPhase::Start,
                    1 => PressPhase::End,
                    2 => PressPhase::Leave,
                    _ => PressPhase::Cancel,
                };
                Event::press(key, phase)
            }
            Step::Shift(down) => {
                let kind = if down { KeyEventKind::Press } else { KeyEventKind::Release };
                Event::Key(KeyEvent::new(KeyCode::Shift).with_kind(kind))
            }
            Step::CapsLock => Event::Key(KeyEvent::new(KeyCode::CapsLock)),
            Step::Caret(pos) => {
                field.place_caret(usize::from(pos));
                Event::SelectionChange
            }
            Step::Focus => {
                kb.focus(Box::new(field.clone()), now);
                continue;
            }
            Step::Outside => Event::PointerDownOutside,
            Step::Inside => Event::PointerDownInside,
            Step::Wait(ms) => {
                now += Duration::from_millis(u64::from(ms));
                Event::Tick
            }
        };
        let closes = event == Event::PointerDownOutside && kb.session().is_bound();
        kb.handle_event(&event, now);

        let (start, end) = field.selection();
        assert!(start <= end && end <= grapheme_len(&field.value()));
        if closes {
            assert!(!kb.session().is_open());
            assert!(kb.next_deadline().is_none());
        }
    }
});
