use ratatui::{
    Frame,
    layout::{Layout, Direction, Constraint},
    widgets::{Block, Borders, Paragraph, Wrap},
    style::{Color, Style, Modifier},
    text::{Line, Span, Text},
};

use crate::app::{App, ComposeField};

fn field_line<'a>(app: &App, field: ComposeField, label: &'a str, value: &'a str) -> Line<'a> {
    let focused = app.compose.focus == field;
    let marker = if focused { "▶ " } else { "  " };
    let style = if focused {
        Style::default().add_modifier(Modifier::BOLD)
    } else {
        Style::default()
    };
    Line::from(vec![
        Span::raw(marker),
        Span::styled(format!("{label:<8}"), style),
        Span::raw(value),
    ])
}

pub fn draw(f: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(5), Constraint::Min(1), Constraint::Length(2)])
        .split(f.size());

    let from = app.active_account().map(|a| a.user.as_str()).unwrap_or("");
    let title = if app.compose.quote.is_empty() { "New message" } else { "Reply" };

    let header = Paragraph::new(vec![
        Line::from(format!("  {:<8}{from}", "From")),
        field_line(app, ComposeField::To, "To", &app.compose.to),
        field_line(app, ComposeField::Subject, "Subject", &app.compose.subject),
    ])
        .block(Block::default().borders(Borders::ALL).title(title));

    f.render_widget(header, chunks[0]);

    // the quoted original is shown below the editable text, dimmed
    let mut body = Text::raw(app.compose.body.as_str());
    if !app.compose.quote.is_empty() {
        body.lines.push(Line::default());
        let dim = Style::default().fg(Color::DarkGray);
        body.lines.extend(app.compose.quote.lines().map(|l| Line::styled(l, dim)));
    }

    let body_title = if app.compose.focus == ComposeField::Body { "▶ Body" } else { "Body" };
    let body = Paragraph::new(body)
        .block(Block::default().borders(Borders::ALL).title(body_title))
        .wrap(Wrap { trim: false });

    f.render_widget(body, chunks[1]);

    let help = Paragraph::new(format!(
        "{}   {}",
        app.status,
        "Tab next field · Enter newline in body · Ctrl+S send · Esc cancel"
    ));
    f.render_widget(help, chunks[2]);
}
