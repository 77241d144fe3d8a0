//! Source code pane rendering with syntax highlighting
//!
//! This module renders the source code pane, which displays the program
//! being executed with basic syntax highlighting and execution indicators.
//!
//! # Features
//!
//! - Syntax highlighting for keywords, types, numbers and comments
//! - Current line highlighting, with the range about to be evaluated emphasized
//! - Error line highlighting after an execution error
//! - Line numbering
//!
//! # Rendering
//!
//! The pane uses a simple character-by-character tokenizer to apply syntax
//! highlighting styles without requiring the real scanner.

use crate::parser::ast::Loc;
use crate::parser::source_map::Document;
use crate::ui::theme::DEFAULT_THEME;
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

/// Simple syntax highlighting for source lines
fn highlight_source_code(line: &str) -> Vec<Span<'static>> {
    let mut spans = Vec::new();
    let mut current_word = String::new();

    let chars: Vec<(usize, char)> = line.char_indices().collect();
    let mut i = 0;

    while i < chars.len() {
        let (offset, c) = chars[i];

        // Line comments run to the end of the line
        if c == '/' && chars.get(i + 1).is_some_and(|&(_, next)| next == '/') {
            if !current_word.is_empty() {
                spans.push(word_span(std::mem::take(&mut current_word), false));
            }
            spans.push(Span::styled(
                line[offset..].to_string(),
                Style::default().fg(DEFAULT_THEME.comment),
            ));
            return spans;
        }

        if !c.is_alphanumeric() && c != '_' {
            if !current_word.is_empty() {
                spans.push(word_span(std::mem::take(&mut current_word), c == '('));
            }
            let style = match c {
                '{' | '}' | '(' | ')' | '[' | ']' => Style::default().fg(DEFAULT_THEME.primary),
                _ => Style::default().fg(DEFAULT_THEME.fg),
            };
            spans.push(Span::styled(c.to_string(), style));
            i += 1;
            continue;
        }

        current_word.push(c);
        i += 1;
    }

    if !current_word.is_empty() {
        spans.push(word_span(current_word, false));
    }
    spans
}

fn word_span(word: String, is_method: bool) -> Span<'static> {
    let style = match word.as_str() {
        "int" | "boolean" | "void" => Style::default().fg(DEFAULT_THEME.type_name),
        "class" | "new" | "return" | "if" | "else" | "while" | "for" | "assert" | "this"
        | "public" | "private" => Style::default()
            .fg(DEFAULT_THEME.keyword)
            .add_modifier(Modifier::BOLD),
        "true" | "false" | "null" => Style::default().fg(DEFAULT_THEME.number),
        w if w.starts_with(|c: char| c.is_ascii_digit()) => {
            Style::default().fg(DEFAULT_THEME.number)
        }
        w if w.starts_with(|c: char| c.is_ascii_uppercase()) => {
            Style::default().fg(DEFAULT_THEME.type_name)
        }
        _ if is_method => Style::default().fg(DEFAULT_THEME.function),
        _ => Style::default().fg(DEFAULT_THEME.fg),
    };
    Span::styled(word, style)
}

/// Scroll state for the source pane
pub struct SourceScrollState {
    pub offset: usize,
    pub target_line_row: Option<usize>,
}

/// Data needed to render the source pane
pub struct SourceRenderData<'a> {
    pub document: &'a Document,
    /// Range about to be evaluated, while suspended
    pub instruction: Option<Loc>,
    /// Location of the last error
    pub error: Option<Loc>,
}

/// Render the source code pane
pub fn render_source_pane(
    frame: &mut Frame,
    area: Rect,
    data: SourceRenderData,
    is_focused: bool,
    scroll_state: &mut SourceScrollState,
) {
    let border_style = if is_focused {
        Style::default()
            .fg(DEFAULT_THEME.border_focused)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(DEFAULT_THEME.border_normal)
    };

    let block = Block::default()
        .title(format!(" {} ", data.document.name))
        .borders(Borders::ALL)
        .border_style(border_style);

    let document = data.document;
    let total_lines = document.line_count();
    let highlighted = data.error.or(data.instruction);
    let current_line = highlighted.map(|loc| document.line_index(loc.start));
    let is_error = data.error.is_some();

    let visible_height = area.height.saturating_sub(2).max(1) as usize; // Account for borders (2), min 1

    // Initialize target_line_row to center if not set
    let target_row = scroll_state
        .target_line_row
        .unwrap_or(visible_height / 2)
        .min(visible_height.saturating_sub(1));
    scroll_state.target_line_row = Some(target_row);

    // Keep the current line at the target visual row
    if let Some(line) = current_line {
        scroll_state.offset = line.saturating_sub(target_row);
    }
    scroll_state.offset = scroll_state
        .offset
        .min(total_lines.saturating_sub(visible_height));

    let visible_lines: Vec<Line> = (scroll_state.offset..total_lines)
        .take(visible_height)
        .map(|line| {
            let text = document.line_text(line);
            let line_num_str = format!("{:4} ", line + 1);

            if current_line != Some(line) {
                let mut spans = vec![Span::styled(
                    line_num_str,
                    Style::default().fg(DEFAULT_THEME.comment),
                )];
                spans.extend(highlight_source_code(text));
                return Line::from(spans);
            }

            if is_error {
                // Red background, white text
                let error_style = Style::default()
                    .bg(DEFAULT_THEME.error)
                    .fg(Color::White)
                    .add_modifier(Modifier::BOLD);
                return Line::from(vec![
                    Span::styled(
                        line_num_str,
                        Style::default()
                            .fg(DEFAULT_THEME.error)
                            .add_modifier(Modifier::BOLD),
                    ),
                    Span::styled(text.to_string(), error_style),
                ]);
            }

            let mut spans = vec![Span::styled(
                line_num_str,
                Style::default()
                    .fg(DEFAULT_THEME.secondary)
                    .add_modifier(Modifier::BOLD),
            )];
            let line_start = document.line_start(line);
            let (before, instr, after) = match highlighted {
                Some(loc) => split_instruction(text, line_start, loc),
                None => (text, "", ""),
            };
            let line_bg = Style::default().bg(DEFAULT_THEME.current_line_bg);
            let instr_bg = Style::default()
                .bg(DEFAULT_THEME.instruction_bg)
                .add_modifier(Modifier::BOLD);
            for (segment, background) in [(before, line_bg), (instr, instr_bg), (after, line_bg)] {
                spans.extend(
                    highlight_source_code(segment)
                        .into_iter()
                        .map(|span| {
                            let style = span.style.patch(background);
                            span.style(style)
                        }),
                );
            }
            Line::from(spans)
        })
        .collect();

    let paragraph = Paragraph::new(visible_lines).block(block);
    frame.render_widget(paragraph, area);
}

/// Split a line into the text before, inside and after `loc`
fn split_instruction(text: &str, line_start: usize, loc: Loc) -> (&str, &str, &str) {
    let clamp = |offset: usize| {
        let mut i = offset.saturating_sub(line_start).min(text.len());
        while !text.is_char_boundary(i) {
            i -= 1;
        }
        i
    };
    let start = clamp(loc.start);
    let end = clamp(loc.end).max(start);
    (&text[..start], &text[start..end], &text[end..])
}
