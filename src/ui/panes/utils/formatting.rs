use crate::memory::heap::{Heap, HeapObject};
use crate::memory::value::Value;
use crate::parser::ast::Type;
use crate::ui::theme::DEFAULT_THEME;
use ratatui::{
    style::{Modifier, Style},
    text::Span,
};

/// Longest array shown inline before eliding the rest
const MAX_INLINE_ELEMENTS: usize = 16;

/// Format a value with styled spans
pub(crate) fn format_value_styled(value: Value, heap: &Heap) -> Vec<Span<'static>> {
    match value {
        Value::Int(n) => vec![Span::styled(
            n.to_string(),
            Style::default().fg(DEFAULT_THEME.number),
        )],
        Value::Bool(b) => vec![Span::styled(
            b.to_string(),
            Style::default().fg(DEFAULT_THEME.keyword),
        )],
        Value::Null => vec![Span::styled(
            "null",
            Style::default().fg(DEFAULT_THEME.number),
        )],
        Value::Void => vec![Span::styled(
            "void",
            Style::default()
                .fg(DEFAULT_THEME.comment)
                .add_modifier(Modifier::DIM),
        )],
        Value::Ref(id) => {
            let label = match heap.get(id) {
                Some(object) => format!("→ {}{}", object.ty(), id),
                None => format!("→ {}", id),
            };
            vec![Span::styled(
                label,
                Style::default().fg(DEFAULT_THEME.reference),
            )]
        }
    }
}

/// Plain rendering of an object's contents: `[1, 2, 3]` or `{x = 1, y = 2}`
pub(crate) fn format_object_contents(object: &HeapObject) -> String {
    match object {
        HeapObject::Array { elements, .. } => {
            let mut shown: Vec<String> = elements
                .iter()
                .take(MAX_INLINE_ELEMENTS)
                .map(|v| v.to_string())
                .collect();
            if elements.len() > MAX_INLINE_ELEMENTS {
                shown.push(format!("... ({} more)", elements.len() - MAX_INLINE_ELEMENTS));
            }
            format!("[{}]", shown.join(", "))
        }
        HeapObject::Instance { class, fields } => {
            let shown: Vec<String> = class
                .fields()
                .iter()
                .zip(fields)
                .map(|(decl, value)| format!("{} = {}", decl.name, value))
                .collect();
            format!("{{{}}}", shown.join(", "))
        }
    }
}

/// Styled type annotation
pub(crate) fn format_type_span(ty: &Type) -> Span<'static> {
    Span::styled(ty.to_string(), Style::default().fg(DEFAULT_THEME.type_name))
}

/// Split at a character boundary at or before `max_bytes`
pub(crate) fn split_at_char_boundary(text: &str, max_bytes: usize) -> (&str, &str) {
    if text.len() <= max_bytes {
        return (text, "");
    }
    let mut boundary = max_bytes;
    while boundary > 0 && !text.is_char_boundary(boundary) {
        boundary -= 1;
    }
    text.split_at(boundary)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_at_char_boundary() {
        assert_eq!(split_at_char_boundary("abc", 5), ("abc", ""));
        assert_eq!(split_at_char_boundary("abcdef", 4), ("abcd", "ef"));
        assert_eq!(split_at_char_boundary("a→b", 2), ("a", "→b"));
    }

    #[test]
    fn test_array_contents() {
        let array = HeapObject::Array {
            element: Type::Int,
            elements: vec![Value::Int(1), Value::Int(2)],
        };
        assert_eq!(format_object_contents(&array), "[1, 2]");
    }
}
