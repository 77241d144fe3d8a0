//! Status bar rendering with keybindings and state indicators

use crate::ui::theme::DEFAULT_THEME;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

/// Execution state shown at the left of the status bar
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Suspended,
    Done,
    Error,
}

/// Data needed to render the status bar
pub struct StatusRenderData<'a> {
    pub message: &'a str,
    pub state: RunState,
    /// Number of step commands issued since the last (re)start
    pub steps: usize,
    /// `line:column` of the suspension point
    pub position: Option<(usize, usize)>,
}

/// Render the status bar at the bottom
pub fn render_status_bar(frame: &mut Frame, area: Rect, data: StatusRenderData) {
    let layout = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);

    let (label, badge) = match data.state {
        RunState::Suspended => (" SUSPENDED ", DEFAULT_THEME.primary),
        RunState::Done => (" DONE ", DEFAULT_THEME.success),
        RunState::Error => (" ERROR ", DEFAULT_THEME.error),
    };

    let mut left_spans = vec![
        Span::styled(
            label,
            Style::default()
                .bg(badge)
                .fg(Color::Black)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            format!(" step {} ", data.steps),
            Style::default()
                .bg(DEFAULT_THEME.current_line_bg)
                .fg(DEFAULT_THEME.comment),
        ),
    ];
    if let Some((line, column)) = data.position {
        left_spans.push(Span::styled(
            format!("@ {}:{} ", line, column),
            Style::default()
                .bg(DEFAULT_THEME.current_line_bg)
                .fg(DEFAULT_THEME.secondary),
        ));
    }
    left_spans.push(Span::styled(
        " | ",
        Style::default()
            .bg(DEFAULT_THEME.current_line_bg)
            .fg(DEFAULT_THEME.comment),
    ));
    left_spans.push(Span::styled(
        format!(" {} ", data.message),
        Style::default()
            .bg(DEFAULT_THEME.current_line_bg)
            .fg(if data.state == RunState::Error {
                DEFAULT_THEME.error
            } else {
                DEFAULT_THEME.fg
            }),
    ));

    let left_paragraph = Paragraph::new(Line::from(left_spans))
        .style(Style::default().bg(DEFAULT_THEME.current_line_bg))
        .alignment(Alignment::Left);
    frame.render_widget(left_paragraph, layout[0]);

    // Right side: keybinds
    let key_style = Style::default().bg(DEFAULT_THEME.comment).fg(Color::Black);
    let desc_style = Style::default()
        .bg(DEFAULT_THEME.current_line_bg)
        .fg(DEFAULT_THEME.fg);
    let sep_style = Style::default()
        .bg(DEFAULT_THEME.current_line_bg)
        .fg(DEFAULT_THEME.comment);

    let bindings = [
        (" i ", " small "),
        (" s/→ ", " step "),
        (" o ", " over "),
        (" u ", " out "),
        (" c ", " continue "),
        (" r ", " reset "),
        (" q ", " quit "),
    ];
    let mut right_spans = Vec::new();
    for (i, (key, description)) in bindings.into_iter().enumerate() {
        if i > 0 {
            right_spans.push(Span::styled("│", sep_style));
            right_spans.push(Span::styled(" ", desc_style));
        }
        right_spans.push(Span::styled(key, key_style));
        right_spans.push(Span::styled(description, desc_style));
    }

    let right_paragraph = Paragraph::new(Line::from(right_spans))
        .style(Style::default().bg(DEFAULT_THEME.current_line_bg))
        .alignment(Alignment::Right);
    frame.render_widget(right_paragraph, layout[1]);
}
