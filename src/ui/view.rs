use ratatui::{
    Frame,
    layout::{Layout, Direction, Constraint},
    widgets::{Block, Borders, Paragraph, Wrap},
};

use crate::app::App;

pub fn draw(f: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(6), Constraint::Min(1), Constraint::Length(2)])
        .split(f.size());

    let (header_text, body_text) = match &app.current {
        Some(m) => (
            format!(
                "From    {}\nDate    {}\nSubject {}\nFolder  {}",
                m.from,
                m.date.format("%a, %d %b %Y %H:%M UTC"),
                m.subject,
                m.folder
            ),
            m.text_body.clone(),
        ),
        None => ("No mail selected".to_string(), String::new()),
    };

    let header = Paragraph::new(header_text)
        .block(Block::default().borders(Borders::ALL).title("Mail"));

    let body = Paragraph::new(body_text)
        .block(Block::default().borders(Borders::ALL))
        .wrap(Wrap { trim: false })
        .scroll((app.body_scroll, 0));

    f.render_widget(header, chunks[0]);
    f.render_widget(body, chunks[1]);

    let help = Paragraph::new(format!(
        "{}   {}",
        app.status,
        "j/k or ↑↓ scroll · Esc back · r reply · c compose · q quit"
    ));
    f.render_widget(help, chunks[2]);
}
