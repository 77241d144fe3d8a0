//! Heap pane rendering
//!
//! Lists the objects still reachable from the current program state, in
//! allocation order. Each object shows its identity, its type and its
//! contents: array elements or named fields. References inside objects are
//! shown as identities so sharing between objects is visible.

use super::utils::{format_object_contents, format_type_span};
use crate::memory::heap::{Heap, HeapObject};
use crate::ui::theme::DEFAULT_THEME;
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem},
    Frame,
};

/// Scroll state for the heap pane
pub struct HeapScrollState {
    pub offset: usize,
    pub prev_item_count: usize,
}

/// Data needed to render the heap pane
pub struct HeapRenderData<'a> {
    pub heap: &'a Heap,
}

/// Render the heap pane
pub fn render_heap_pane(
    frame: &mut Frame,
    area: Rect,
    data: HeapRenderData,
    is_focused: bool,
    scroll_state: &mut HeapScrollState,
) {
    let border_style = if is_focused {
        Style::default()
            .fg(DEFAULT_THEME.border_focused)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(DEFAULT_THEME.border_normal)
    };

    let objects = data.heap.visible_objects();
    let block = Block::default()
        .title(format!(" Heap ({} objects) ", objects.len()))
        .borders(Borders::ALL)
        .border_style(border_style);

    let mut all_items = Vec::new();

    if objects.is_empty() {
        all_items.push(
            ListItem::new("(no reachable objects)")
                .style(Style::default().fg(DEFAULT_THEME.comment)),
        );
    }

    for (id, object) in objects {
        let size = match object {
            HeapObject::Array { elements, .. } => format!(" length {}", elements.len()),
            HeapObject::Instance { .. } => String::new(),
        };
        all_items.push(ListItem::new(Line::from(vec![
            Span::styled(
                id.to_string(),
                Style::default()
                    .fg(DEFAULT_THEME.reference)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(" │ ", Style::default().fg(DEFAULT_THEME.comment)),
            format_type_span(&object.ty()),
            Span::styled(size, Style::default().fg(DEFAULT_THEME.comment)),
        ])));
        all_items.push(ListItem::new(Line::from(Span::styled(
            format!("  {}", format_object_contents(object)),
            Style::default().fg(DEFAULT_THEME.fg),
        ))));
    }

    let total_items = all_items.len();
    let visible_height = area.height.saturating_sub(2).max(1) as usize; // Account for borders, min 1

    // New objects scroll into view; otherwise keep the user's position
    if total_items > scroll_state.prev_item_count {
        scroll_state.offset = total_items.saturating_sub(visible_height);
    } else if total_items > visible_height {
        scroll_state.offset = scroll_state.offset.min(total_items - visible_height);
    } else {
        scroll_state.offset = 0;
    }
    scroll_state.prev_item_count = total_items;

    let visible_items: Vec<ListItem> = all_items
        .into_iter()
        .skip(scroll_state.offset)
        .take(visible_height)
        .collect();

    let list = List::new(visible_items).block(block);
    frame.render_widget(list, area);
}
