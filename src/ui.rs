use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap},
};
use textwrap::wrap;
use unicode_width::UnicodeWidthStr;

use crate::config::FieldType;
use crate::form::FieldView;

pub struct PopupRender<'a> {
    pub title: &'a str,
    pub items: &'a [String],
    pub selected: usize,
}

pub struct UiContext<'a> {
    pub title: Option<&'a str>,
    pub company: Option<&'a str>,
    pub fields: Vec<FieldView<'a>>,
    pub focus: usize,
    pub status_message: &'a str,
    pub dirty: bool,
    pub error_count: usize,
    pub help: Option<&'a str>,
    pub popup: Option<PopupRender<'a>>,
}

pub fn draw(frame: &mut Frame<'_>, ctx: UiContext<'_>) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(5),
            Constraint::Length(3),
        ])
        .split(frame.area());

    render_header(frame, chunks[0], &ctx);
    render_body(frame, chunks[1], &ctx);
    render_footer(frame, chunks[2], &ctx);

    if let Some(popup) = &ctx.popup {
        render_popup(frame, popup);
    }
}

fn render_header(frame: &mut Frame<'_>, area: Rect, ctx: &UiContext<'_>) {
    let mut spans = vec![Span::styled(
        ctx.title.unwrap_or("Company Forms").to_string(),
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD),
    )];
    match ctx.company {
        Some(company) => {
            spans.push(Span::raw(" — "));
            spans.push(Span::styled(
                company.to_string(),
                Style::default().fg(Color::Yellow),
            ));
        }
        None => spans.push(Span::styled(
            " — no company selected",
            Style::default().fg(Color::DarkGray),
        )),
    }

    let paragraph = Paragraph::new(Line::from(spans))
        .block(Block::default().title("Form").borders(Borders::ALL));
    frame.render_widget(paragraph, area);
}

fn render_body(frame: &mut Frame<'_>, area: Rect, ctx: &UiContext<'_>) {
    if ctx.company.is_none() {
        let placeholder = Paragraph::new("Press Ctrl+O to choose a company")
            .block(Block::default().borders(Borders::ALL));
        frame.render_widget(placeholder, area);
        return;
    }

    if ctx.fields.is_empty() {
        let placeholder = Paragraph::new("This company has no form fields")
            .block(Block::default().borders(Borders::ALL));
        frame.render_widget(placeholder, area);
        return;
    }

    let content_width = area.width.saturating_sub(4) as usize;
    let mut items = Vec::with_capacity(ctx.fields.len());
    let mut row_heights = Vec::with_capacity(ctx.fields.len());

    for field in &ctx.fields {
        let row = build_field_row(field, content_width);
        row_heights.push(row.len());
        items.push(ListItem::new(row));
    }

    let focus = ctx.focus.min(ctx.fields.len() - 1);
    let mut list_state = ListState::default();
    list_state.select(Some(focus));

    let list = List::new(items)
        .block(Block::default().title("Fields").borders(Borders::ALL))
        .highlight_style(Style::default().bg(Color::DarkGray))
        .highlight_symbol("» ");
    frame.render_stateful_widget(list, area, &mut list_state);

    // the list may have scrolled to keep the selection visible, so the
    // cursor row is measured from the first visible item, not from the top
    let field = &ctx.fields[focus];
    if ctx.popup.is_none() && is_typable(field.widget) {
        let inner_height = area.height.saturating_sub(2) as usize;
        if let Some(lines_above) =
            visible_cursor_line(&row_heights, list_state.offset(), focus, inner_height)
        {
            // cursor sits after the value on the row's first line
            let x = area
                .x
                .saturating_add(1) // border
                .saturating_add(2) // highlight symbol
                .saturating_add(row_prefix_width(field) as u16)
                .saturating_add(field.value.width() as u16);
            let y = area.y.saturating_add(1).saturating_add(lines_above as u16);
            frame.set_cursor_position((x, y));
        }
    }
}

/// Line offset of the focused row inside the list's viewport, or `None` when
/// the row is outside it. `scroll` is the index of the first visible item.
fn visible_cursor_line(
    row_heights: &[usize],
    scroll: usize,
    focus: usize,
    inner_height: usize,
) -> Option<usize> {
    if focus < scroll {
        return None;
    }
    let lines_above: usize = row_heights.get(scroll..focus)?.iter().sum();
    (lines_above < inner_height).then_some(lines_above)
}

fn render_footer(frame: &mut Frame<'_>, area: Rect, ctx: &UiContext<'_>) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(65), Constraint::Percentage(35)])
        .split(area);

    let mut status = ctx.status_message.to_string();
    if ctx.dirty {
        status.push_str(" • unsaved entries");
    }
    if ctx.error_count > 0 {
        status.push_str(&format!(" • {} error(s)", ctx.error_count));
    }
    if status.trim().is_empty() {
        status = "Ready".to_string();
    }

    let status_widget = Paragraph::new(status)
        .wrap(Wrap { trim: true })
        .block(Block::default().borders(Borders::ALL).title("Status"));
    frame.render_widget(status_widget, chunks[0]);

    let help_widget = Paragraph::new(ctx.help.unwrap_or(" ").to_string())
        .wrap(Wrap { trim: true })
        .block(Block::default().borders(Borders::ALL).title("Actions"));
    frame.render_widget(help_widget, chunks[1]);
}

fn render_popup(frame: &mut Frame<'_>, popup: &PopupRender<'_>) {
    let area = centered_rect(frame.area(), 40, popup.items.len() as u16 + 2);
    frame.render_widget(Clear, area);

    let items: Vec<ListItem<'_>> = popup
        .items
        .iter()
        .map(|item| ListItem::new(item.as_str()))
        .collect();
    let mut list_state = ListState::default();
    if !popup.items.is_empty() {
        list_state.select(Some(popup.selected.min(popup.items.len() - 1)));
    }

    let list = List::new(items)
        .block(
            Block::default()
                .title(popup.title.to_string())
                .borders(Borders::ALL),
        )
        .highlight_style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("» ");
    frame.render_stateful_widget(list, area, &mut list_state);
}

fn build_field_row(field: &FieldView<'_>, content_width: usize) -> Vec<Line<'static>> {
    let mut label = field.label.to_string();
    if field.required {
        label.push_str(" *");
    }

    let value_display = if field.widget.is_select() && field.value.is_empty() {
        "(press Enter to choose)".to_string()
    } else {
        field.value.to_string()
    };

    let mut first_line = vec![
        Span::styled(
            label,
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            format!(" [{}]", field.widget.as_str()),
            Style::default().fg(Color::DarkGray),
        ),
        Span::raw(": "),
        Span::styled(value_display, Style::default().fg(Color::White)),
    ];
    if field.widget.is_select() && !field.value.is_empty() {
        first_line.push(Span::styled(
            " ▾",
            Style::default().fg(Color::DarkGray),
        ));
    }

    let mut lines = vec![Line::from(first_line)];
    if let Some(error) = field.error {
        for chunk in wrap(error, content_width.max(16)) {
            lines.push(Line::from(Span::styled(
                chunk.into_owned(),
                Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
            )));
        }
    }
    lines
}

fn row_prefix_width(field: &FieldView<'_>) -> usize {
    let mut width = field.label.width();
    if field.required {
        width += 2; // " *"
    }
    width += format!(" [{}]", field.widget.as_str()).width();
    width + 2 // ": "
}

fn is_typable(widget: FieldType) -> bool {
    !widget.is_select()
}

fn centered_rect(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width.saturating_sub(width)) / 2,
        y: area.y + (area.height.saturating_sub(height)) / 2,
        width,
        height,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cursor_line_counts_rows_from_the_top_without_scrolling() {
        // second row is two lines tall (an error line below the value)
        let heights = [1, 2, 1, 1];
        assert_eq!(visible_cursor_line(&heights, 0, 0, 6), Some(0));
        assert_eq!(visible_cursor_line(&heights, 0, 2, 6), Some(3));
    }

    #[test]
    fn cursor_line_is_measured_from_the_first_visible_item() {
        // 30 single-line rows in a 4-line viewport, focused on the last:
        // the list scrolls to item 26, so the cursor sits on viewport line 3
        let heights = vec![1; 30];
        assert_eq!(visible_cursor_line(&heights, 26, 29, 4), Some(3));
    }

    #[test]
    fn cursor_is_hidden_when_the_focused_row_is_outside_the_viewport() {
        let heights = vec![1; 30];
        assert_eq!(visible_cursor_line(&heights, 10, 5, 4), None, "above");
        let tall = [3, 3, 3];
        assert_eq!(visible_cursor_line(&tall, 0, 2, 4), None, "pushed below");
    }
}
