//! Selection screen rendering with ratatui.
//!
//! Layout, top to bottom:
//! - header with the group position, policy, and key
//! - one table row per group member, marked rows flagged `[x]`
//! - footer with key hints
//!
//! Marks are shown as text as well as color, so the screen reads the same
//! without color.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    symbols::border,
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table},
    Frame,
};

use super::app::{Action, SelectionApp};
use super::keybindings::KeyBindings;

/// Longest value shown in a cell before truncation.
const MAX_CELL_WIDTH: usize = 48;

const ASCII_BORDER_SET: border::Set = border::Set {
    top_left: "+",
    top_right: "+",
    bottom_left: "+",
    bottom_right: "+",
    vertical_left: "|",
    vertical_right: "|",
    horizontal_top: "-",
    horizontal_bottom: "-",
};

fn create_block<'a>(accessible: bool, title: impl Into<Line<'a>>) -> Block<'a> {
    let set = if accessible {
        ASCII_BORDER_SET
    } else {
        border::ROUNDED
    };
    Block::default()
        .borders(Borders::ALL)
        .border_set(set)
        .title(title)
}

/// Draw the selection screen for the current group.
pub fn render(frame: &mut Frame, app: &SelectionApp, bindings: &KeyBindings) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4),
            Constraint::Min(0),
            Constraint::Length(3),
        ])
        .split(frame.area());

    render_header(frame, app, chunks[0]);
    render_rows(frame, app, chunks[1]);
    render_footer(frame, app, bindings, chunks[2]);
}

fn render_header(frame: &mut Frame, app: &SelectionApp, area: Rect) {
    let view = app.view();
    let theme = app.theme();
    let title = format!(
        " credupe - group {}/{} ({}) ",
        view.position.index, view.position.total, view.policy
    );
    let lines = vec![
        Line::from(Span::styled(
            view.key_label(app.masks_passwords()),
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(
            format!(
                "{} of {} rows marked for deletion",
                app.marked_count(),
                view.rows.len()
            ),
            Style::default().fg(theme.dim),
        )),
    ];
    let header = Paragraph::new(lines).block(
        create_block(app.is_accessible(), title).border_style(Style::default().fg(theme.primary)),
    );
    frame.render_widget(header, area);
}

fn render_rows(frame: &mut Frame, app: &SelectionApp, area: Rect) {
    let view = app.view();
    let theme = app.theme();

    let mut header_cells = vec![Cell::from("del"), Cell::from("#")];
    header_cells.extend(view.headers.iter().map(|h| Cell::from(h.as_str())));
    let header = Row::new(header_cells).style(
        Style::default()
            .fg(theme.primary)
            .add_modifier(Modifier::BOLD),
    );

    let rows = view.rows.iter().enumerate().map(|(i, row)| {
        let marked = app.is_marked(i);
        let mut cells = vec![
            Cell::from(if marked { "[x]" } else { "[ ]" }),
            Cell::from(row.original_index.to_string()),
        ];
        cells.extend((0..view.headers.len()).map(|column| {
            Cell::from(truncate_string(
                view.display_value(row, column, app.masks_passwords()),
                MAX_CELL_WIDTH,
            ))
        }));

        let mut style = if marked {
            Style::default().fg(theme.danger)
        } else {
            Style::default().fg(theme.success)
        };
        if i == app.cursor() {
            style = style
                .bg(theme.highlight)
                .fg(theme.inverted_fg)
                .add_modifier(Modifier::BOLD);
        }
        Row::new(cells).style(style)
    });

    let mut widths = vec![Constraint::Length(4), Constraint::Length(6)];
    widths.extend(view.headers.iter().map(|_| Constraint::Fill(1)));

    let table = Table::new(rows, widths)
        .header(header)
        .block(create_block(app.is_accessible(), " records "));
    frame.render_widget(table, area);
}

fn render_footer(frame: &mut Frame, app: &SelectionApp, bindings: &KeyBindings, area: Rect) {
    let hints = [
        (Action::ToggleMark, "mark"),
        (Action::MarkAllButFirst, "all but first"),
        (Action::ClearMarks, "clear"),
        (Action::Confirm, "delete marked"),
        (Action::Skip, "keep all"),
        (Action::Abort, "stop"),
    ];
    let mut spans = Vec::new();
    for (action, label) in hints {
        spans.push(Span::styled(
            bindings.key_hint(action),
            Style::default().add_modifier(Modifier::BOLD),
        ));
        spans.push(Span::raw(format!(" {}  ", label)));
    }
    let footer = Paragraph::new(Line::from(spans))
        .style(Style::default().fg(app.theme().dim))
        .block(create_block(app.is_accessible(), ""));
    frame.render_widget(footer, area);
}

/// Shorten `s` to at most `max` characters, ending in `...` when cut.
#[must_use]
pub fn truncate_string(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    if max <= 3 {
        return s.chars().take(max).collect();
    }
    let kept: String = s.chars().take(max - 3).collect();
    format!("{}...", kept)
}
