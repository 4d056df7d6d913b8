#![forbid(unsafe_code)]

//! Pure text edit model.
//!
//! Every key that changes text is expressed as a function from an
//! [`EditContext`] (the field value split around the caret) to an
//! [`EditResult`] (the proposed new value and caret). Nothing in this module
//! touches a field; the session controller applies results.
//!
//! # Units
//!
//! Offsets are counted in extended grapheme clusters, so a caret can never
//! land inside a combined character such as `e\u{301}`.
//!
//! # Invariants
//!
//! 1. `value_before + value_after` equals the field value minus the selected
//!    range; no edit touches text outside those two substrings.
//! 2. For every result, `new_caret <= grapheme_len(new_value)` when the
//!    context was built by [`EditContext::split`].
//! 3. Space and Enter ignore caps state entirely.

use unicode_segmentation::UnicodeSegmentation;

/// Number of grapheme clusters in `s`.
#[must_use]
pub fn grapheme_len(s: &str) -> usize {
    s.graphemes(true).count()
}

/// Byte offset of the grapheme at `idx`, or `s.len()` past the end.
#[must_use]
pub fn grapheme_byte_offset(s: &str, idx: usize) -> usize {
    s.grapheme_indices(true)
        .nth(idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

/// Graphemes of `value` that end at or before byte `prefix_len`.
///
/// Equals `grapheme_len(&value[..prefix_len])` unless the text on either side
/// of `prefix_len` fused into one cluster, in which case that cluster is not
/// counted.
fn caret_after_prefix(value: &str, prefix_len: usize) -> usize {
    value
        .grapheme_indices(true)
        .take_while(|(i, g)| i + g.len() <= prefix_len)
        .count()
}

/// What kind of field is bound. Only Enter cares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FieldKind {
    /// A one-line text input; newlines are rejected.
    #[default]
    SingleLine,
    /// A textarea-like field.
    MultiLine,
}

/// The field state an edit function is allowed to see.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EditContext {
    /// Text before the selection start.
    pub value_before: String,
    /// Text after the selection end.
    pub value_after: String,
    /// Selection start, in graphemes.
    pub caret: usize,
    /// Selection end, in graphemes (`>= caret`).
    pub selection_end: usize,
    /// Bound field kind.
    pub field_kind: FieldKind,
}

impl EditContext {
    /// Context for a collapsed caret with explicit halves.
    #[must_use]
    pub fn new(value_before: impl Into<String>, value_after: impl Into<String>) -> Self {
        let value_before = value_before.into();
        let caret = grapheme_len(&value_before);
        Self {
            value_before,
            value_after: value_after.into(),
            caret,
            selection_end: caret,
            field_kind: FieldKind::SingleLine,
        }
    }

    /// Split a field value around a selection.
    ///
    /// Out-of-range offsets clamp to the value length and reversed ranges
    /// are normalized, so any host selection yields a usable context.
    #[must_use]
    pub fn split(value: &str, selection_start: usize, selection_end: usize, field_kind: FieldKind) -> Self {
        let len = grapheme_len(value);
        let start = selection_start.min(selection_end).min(len);
        let end = selection_start.max(selection_end).min(len);
        let start_byte = grapheme_byte_offset(value, start);
        let end_byte = grapheme_byte_offset(value, end);
        Self {
            value_before: value[..start_byte].to_owned(),
            value_after: value[end_byte..].to_owned(),
            caret: start,
            selection_end: end,
            field_kind,
        }
    }

    /// Set the field kind.
    #[must_use]
    pub fn with_field_kind(mut self, field_kind: FieldKind) -> Self {
        self.field_kind = field_kind;
        self
    }

    /// Set the selection end (the halves are left untouched).
    #[must_use]
    pub fn with_selection_end(mut self, selection_end: usize) -> Self {
        self.selection_end = selection_end.max(self.caret);
        self
    }

    /// Whether a non-empty selection exists.
    #[must_use]
    #[inline]
    pub fn has_selection(&self) -> bool {
        self.caret != self.selection_end
    }

    /// The value with the selection removed, caret at its start.
    fn without_selection(&self) -> EditResult {
        let new_value = self.joined("");
        let new_caret = caret_after_prefix(&new_value, self.value_before.len()).min(self.caret);
        EditResult {
            new_value,
            new_caret,
        }
    }

    fn joined(&self, middle: &str) -> String {
        let mut out =
            String::with_capacity(self.value_before.len() + middle.len() + self.value_after.len());
        out.push_str(&self.value_before);
        out.push_str(middle);
        out.push_str(&self.value_after);
        out
    }
}

/// The proposed outcome of one key commit.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EditResult {
    /// Full new field value.
    pub new_value: String,
    /// New collapsed caret, in graphemes.
    pub new_caret: usize,
}

impl EditResult {
    /// Create a result.
    #[must_use]
    pub fn new(new_value: impl Into<String>, new_caret: usize) -> Self {
        Self {
            new_value: new_value.into(),
            new_caret,
        }
    }

    /// `0 <= new_caret <= grapheme_len(new_value)`.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.new_caret <= grapheme_len(&self.new_value)
    }
}

/// Insert `text` at the caret, replacing any selection.
///
/// The caret lands after the inserted text, clamped for the case where the
/// text fuses with a neighbouring cluster (`"\r"` + `"\n"`).
#[must_use]
pub fn insert_text(ctx: &EditContext, text: &str) -> EditResult {
    let new_value = ctx.joined(text);
    let new_caret = (ctx.caret + grapheme_len(text)).min(grapheme_len(&new_value));
    EditResult {
        new_value,
        new_caret,
    }
}

/// Insert a literal space.
#[must_use]
pub fn insert_space(ctx: &EditContext) -> EditResult {
    insert_text(ctx, " ")
}

/// Delete the selection, or the grapheme before the caret.
#[must_use]
pub fn backspace(ctx: &EditContext) -> EditResult {
    if ctx.has_selection() {
        return ctx.without_selection();
    }
    let keep = ctx
        .value_before
        .grapheme_indices(true)
        .next_back()
        .map(|(i, _)| i)
        .unwrap_or(0);
    let mut new_value = String::with_capacity(ctx.value_before.len() + ctx.value_after.len());
    new_value.push_str(&ctx.value_before[..keep]);
    new_value.push_str(&ctx.value_after);
    let new_caret = caret_after_prefix(&new_value, keep).min(ctx.caret.saturating_sub(1));
    EditResult {
        new_value,
        new_caret,
    }
}

/// Delete the selection, or the grapheme after the caret.
///
/// The caret stays put unless the remaining neighbours fuse into one cluster
/// (`"x\r"` + `"\n"`), in which case it lands before that cluster.
#[must_use]
pub fn delete_forward(ctx: &EditContext) -> EditResult {
    if ctx.has_selection() {
        return ctx.without_selection();
    }
    let skip = grapheme_byte_offset(&ctx.value_after, 1);
    let mut new_value = String::with_capacity(ctx.value_before.len() + ctx.value_after.len());
    new_value.push_str(&ctx.value_before);
    new_value.push_str(&ctx.value_after[skip..]);
    let new_caret = caret_after_prefix(&new_value, ctx.value_before.len()).min(ctx.caret);
    EditResult {
        new_value,
        new_caret,
    }
}

/// Insert a newline in multi-line fields; no-op on single-line ones.
#[must_use]
pub fn enter(ctx: &EditContext) -> EditResult {
    match ctx.field_kind {
        FieldKind::MultiLine => insert_text(ctx, "\n"),
        FieldKind::SingleLine => ctx.without_selection(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(before: &str, after: &str) -> EditContext {
        EditContext::new(before, after)
    }

    #[test]
    fn newline_after_carriage_return_keeps_caret_in_bounds() {
        let r = insert_text(&ctx("\r", ""), "\n");
        assert_eq!(r, EditResult::new("\r\n", 1));
        assert!(r.is_valid());
    }

    #[test]
    fn deletions_that_fuse_neighbours_keep_caret_before_cluster() {
        let r = delete_forward(&ctx("x\r", "y\n"));
        assert_eq!(r, EditResult::new("x\r\n", 1));
        assert!(r.is_valid());

        let r = backspace(&ctx("x\ry", "\n"));
        assert_eq!(r, EditResult::new("x\r\n", 1));
        assert!(r.is_valid());

        let sel = EditContext::split("x\rab\n", 2, 4, FieldKind::SingleLine);
        assert_eq!(backspace(&sel), EditResult::new("x\r\n", 1));
        assert_eq!(enter(&sel), EditResult::new("x\r\n", 1));
    }

    #[test]
    fn insert_at_caret() {
        let r = insert_text(&ctx("ab", "cd"), "x");
        assert_eq!(r, EditResult::new("abxcd", 3));
    }

    #[test]
    fn insert_replaces_selection() {
        let c = EditContext::split("abcdef", 2, 4, FieldKind::SingleLine);
        let r = insert_text(&c, "Z");
        assert_eq!(r, EditResult::new("abZef", 3));
    }

    #[test]
    fn space_is_literal() {
        assert_eq!(insert_space(&ctx("a", "")), EditResult::new("a ", 2));
    }

    #[test]
    fn backspace_drops_previous() {
        assert_eq!(backspace(&ctx("abc", "def")), EditResult::new("abdef", 2));
    }

    #[test]
    fn backspace_at_start_is_noop_with_zero_caret() {
        assert_eq!(backspace(&ctx("", "def")), EditResult::new("def", 0));
    }

    #[test]
    fn backspace_deletes_selection() {
        let c = EditContext::split("abcdef", 2, 4, FieldKind::SingleLine);
        assert_eq!(backspace(&c), EditResult::new("abef", 2));
    }

    #[test]
    fn delete_forward_drops_next() {
        assert_eq!(delete_forward(&ctx("abc", "def")), EditResult::new("abcef", 3));
    }

    #[test]
    fn delete_forward_at_end_is_noop() {
        assert_eq!(delete_forward(&ctx("abc", "")), EditResult::new("abc", 3));
    }

    #[test]
    fn delete_forward_deletes_selection() {
        let c = EditContext::split("abcdef", 1, 3, FieldKind::MultiLine);
        assert_eq!(delete_forward(&c), EditResult::new("adef", 1));
    }

    #[test]
    fn enter_single_line_is_noop() {
        assert_eq!(enter(&ctx("ab", "c")), EditResult::new("abc", 2));
    }

    #[test]
    fn enter_multi_line_inserts_newline() {
        let c = ctx("ab", "c").with_field_kind(FieldKind::MultiLine);
        assert_eq!(enter(&c), EditResult::new("ab\nc", 3));
    }

    #[test]
    fn graphemes_are_atomic() {
        // e + combining acute is one grapheme
        let c = EditContext::split("cafe\u{301}!", 4, 4, FieldKind::SingleLine);
        assert_eq!(c.value_before, "cafe\u{301}");
        assert_eq!(backspace(&c), EditResult::new("caf!", 3));
    }

    #[test]
    fn split_clamps_and_normalizes() {
        let c = EditContext::split("abc", 9, 1, FieldKind::SingleLine);
        assert_eq!(c.caret, 1);
        assert_eq!(c.selection_end, 3);
        assert_eq!(c.value_before, "a");
        assert_eq!(c.value_after, "");
    }

    #[test]
    fn umlauts_count_as_one() {
        let c = EditContext::split("äöü", 2, 2, FieldKind::SingleLine);
        assert_eq!(c.value_before, "äö");
        assert_eq!(delete_forward(&c), EditResult::new("äö", 2));
    }

    #[test]
    fn validity_check() {
        assert!(EditResult::new("ab", 2).is_valid());
        assert!(!EditResult::new("ab", 3).is_valid());
    }
}
