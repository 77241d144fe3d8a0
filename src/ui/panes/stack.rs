//! Stack pane rendering with local variables and call frames
//!
//! This module renders the stack pane, displaying the call stack with
//! method frames, their variables and their pending operands.
//!
//! # Layout
//!
//! Each stack frame is displayed hierarchically:
//! - Frame title and the call site that created it
//! - The receiver (`this`) of instance methods and constructors
//! - Variables of every live scope, outermost first, with their types
//! - Operands already evaluated but not yet consumed

use super::utils::{format_type_span, format_value_styled, split_at_char_boundary};
use crate::memory::heap::Heap;
use crate::memory::stack::{CallStack, StackFrame};
use crate::memory::value::Value;
use crate::parser::source_map::SourceMap;
use crate::ui::theme::DEFAULT_THEME;
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem},
    Frame,
};

/// Scroll state for the stack pane
pub struct StackScrollState {
    pub offset: usize,
    pub prev_item_count: usize,
}

/// Data needed to render the stack pane
pub struct StackRenderData<'a> {
    pub call_stack: &'a CallStack,
    pub heap: &'a Heap,
    pub sources: &'a SourceMap,
    /// Result of the last completed top-level evaluation
    pub last_result: Option<Value>,
}

/// Render the stack pane
pub fn render_stack_pane(
    frame: &mut Frame,
    area: Rect,
    data: StackRenderData,
    is_focused: bool,
    scroll_state: &mut StackScrollState,
) {
    let border_style = if is_focused {
        Style::default()
            .fg(DEFAULT_THEME.border_focused)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(DEFAULT_THEME.border_normal)
    };

    let block = Block::default()
        .title(" Call Stack ")
        .borders(Borders::ALL)
        .border_style(border_style);

    let content_width = area.width.saturating_sub(2) as usize; // borders only
    let frames = data.call_stack.frames();
    let mut all_items = Vec::new();

    if frames.is_empty() {
        all_items.push(ListItem::new("(empty)").style(Style::default().fg(DEFAULT_THEME.comment)));
    }

    for (depth, stack_frame) in frames.iter().enumerate() {
        all_items.push(ListItem::new(frame_header(depth, stack_frame)));

        if let Some(call_loc) = stack_frame.call_loc {
            let prefix = "  ↪ called at ";
            let site = format!(
                "{} {}",
                data.sources.describe(call_loc),
                data.sources.snippet(call_loc)
            );
            let (shown, rest) =
                split_at_char_boundary(&site, content_width.saturating_sub(prefix.len() + 1));
            let ellipsis = if rest.is_empty() { "" } else { "…" };
            all_items.push(ListItem::new(Line::from(vec![
                Span::styled(prefix, Style::default().fg(DEFAULT_THEME.comment)),
                Span::styled(
                    format!("{}{}", shown, ellipsis),
                    Style::default().fg(DEFAULT_THEME.muted_function),
                ),
            ])));
        }

        if let Some(this) = stack_frame.this {
            let mut spans = vec![Span::styled("    this", Style::default().fg(DEFAULT_THEME.keyword))];
            spans.push(Span::styled(" = ", Style::default().fg(DEFAULT_THEME.fg)));
            spans.extend(format_value_styled(Value::Ref(this), data.heap));
            all_items.push(ListItem::new(Line::from(spans)));
        }

        let scopes = data.call_stack.scopes();
        let mut chain: Vec<_> = stack_frame.scope_chain(scopes).collect();
        chain.reverse();
        let mut any_binding = false;
        for scope in chain {
            for binding in scopes.bindings(scope) {
                any_binding = true;
                let mut spans = vec![
                    Span::styled(
                        format!("    {}", binding.name),
                        Style::default().fg(DEFAULT_THEME.fg),
                    ),
                    Span::styled(": ", Style::default().fg(DEFAULT_THEME.comment)),
                    format_type_span(&binding.ty),
                    Span::styled(" = ", Style::default().fg(DEFAULT_THEME.fg)),
                ];
                spans.extend(format_value_styled(binding.value, data.heap));
                all_items.push(ListItem::new(Line::from(spans)));
            }
        }
        if !any_binding && stack_frame.this.is_none() {
            all_items.push(
                ListItem::new("    (no variables)").style(Style::default().fg(DEFAULT_THEME.comment)),
            );
        }

        if !stack_frame.operands.is_empty() {
            let mut spans = vec![Span::styled(
                "    operands: ",
                Style::default().fg(DEFAULT_THEME.comment),
            )];
            for (i, operand) in stack_frame.operands.iter().enumerate() {
                if i > 0 {
                    spans.push(Span::styled(", ", Style::default().fg(DEFAULT_THEME.comment)));
                }
                spans.extend(format_value_styled(*operand, data.heap));
            }
            all_items.push(ListItem::new(Line::from(spans)));
        }

        // Add spacing between frames
        if depth < frames.len() - 1 {
            all_items.push(ListItem::new(""));
        }
    }

    if let Some(result) = data.last_result {
        if result != Value::Void {
            all_items.push(ListItem::new(""));
            let mut spans = vec![Span::styled(
                "◂ result: ",
                Style::default().fg(DEFAULT_THEME.success),
            )];
            spans.extend(format_value_styled(result, data.heap));
            all_items.push(ListItem::new(Line::from(spans)));
        }
    }

    // Calculate visible range for scrolling
    let total_items = all_items.len();
    let visible_height = area.height.saturating_sub(2).max(1) as usize; // Account for borders, min 1

    // Scroll to the bottom only when content grows
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

fn frame_header(depth: usize, stack_frame: &StackFrame) -> Line<'static> {
    Line::from(vec![
        Span::styled("▸ ", Style::default().fg(DEFAULT_THEME.secondary)),
        Span::styled(
            format!("Frame {} ", depth),
            Style::default().fg(DEFAULT_THEME.comment),
        ),
        Span::styled("│ ", Style::default().fg(DEFAULT_THEME.comment)),
        Span::styled(
            stack_frame.title.clone(),
            Style::default()
                .fg(DEFAULT_THEME.function)
                .add_modifier(Modifier::BOLD),
        ),
    ])
}
