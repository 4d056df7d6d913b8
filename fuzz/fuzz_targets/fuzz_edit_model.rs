#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use vkbd_core::edit::{
    EditContext, FieldKind, backspace, delete_forward, enter, grapheme_len, insert_space,
    insert_text,
};

#[derive(Debug, Arbitrary)]
enum Op {
    Insert(String),
    Space,
    Backspace,
    Delete,
    Enter,
    Select(u8, u8),
}

#[derive(Debug, Arbitrary)]
struct Input {
    initial: String,
    multi_line: bool,
    ops: Vec<Op>,
}

fuzz_target!(|input: Input| {
    let kind = if input.multi_line {
        FieldKind::MultiLine
    } else {
        FieldKind::SingleLine
    };
    let mut value = input.initial;
    let mut sel = (grapheme_len(&value), grapheme_len(&value));

    for op in input.ops.into_iter().take(64) {
        let ctx = EditContext::split(&value, sel.0, sel.1, kind);
        assert!(ctx.caret <= grapheme_len(&value));
        let before = ctx.value_before.clone();
        let after = ctx.value_after.clone();

        let result = match op {
            Op::Select(a, b) => {
                sel = (usize::from(a), usize::from(b));
                continue;
            }
            Op::Insert(text) => {
                let r = insert_text(&ctx, &text);
                assert_eq!(r.new_value, format!("{before}{text}{after}"));
                r
            }
            Op::Space => insert_space(&ctx),
            Op::Backspace => {
                let r = backspace(&ctx);
                assert!(r.new_value.ends_with(after.as_str()));
                r
            }
            Op::Delete => {
                let r = delete_forward(&ctx);
                assert!(r.new_value.starts_with(before.as_str()));
                r
            }
            Op::Enter => enter(&ctx),
        };

        assert!(result.is_valid(), "caret out of bounds: {result:?}");
        value = result.new_value;
        sel = (result.new_caret, result.new_caret);
    }
});
