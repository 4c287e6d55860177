use ratatui::{
    Frame,
    layout::{Layout, Direction, Constraint},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap},
    style::{Style, Modifier},
};

use crate::app::App;

pub fn draw(f: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(1), Constraint::Length(2)])
        .split(f.size());

    let items = if app.accounts.is_empty() {
        vec![ListItem::new("No accounts (press n to add one)")]
    } else {
        app.accounts.iter().enumerate().map(|(i, a)| {
            let mark = if Some(i) == app.active { "*" } else { " " };
            let tls = if a.secure { "tls" } else { "starttls" };
            ListItem::new(format!(
                "{mark} {}\n    {}  {}:{} ({tls})  smtp {}",
                a.label, a.user, a.host, a.port, a.smtp_host
            ))
        }).collect::<Vec<_>>()
    };

    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title("Accounts"))
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
        .highlight_symbol("▶ ");

    let mut state = ListState::default();
    if !app.accounts.is_empty() {
        state.select(Some(app.manager_selected.min(app.accounts.len() - 1)));
    }

    f.render_stateful_widget(list, chunks[0], &mut state);

    let help = Paragraph::new(format!(
        "{}   {}",
        app.status,
        "Enter use · n new · e edit · d remove · Esc back · q quit"
    ))
        .wrap(Wrap { trim: true });

    f.render_widget(help, chunks[1]);
}
