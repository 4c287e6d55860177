use ratatui::{
    Frame,
    layout::{Layout, Direction, Constraint},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Tabs, Wrap},
    style::{Style, Modifier},
};

use crate::app::App;
use crate::mail::FolderKey;

pub fn draw(f: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(1), Constraint::Length(2)])
        .split(f.size());

    let account = app
        .active_account()
        .map(|a| a.label.as_str())
        .unwrap_or("no account");

    let titles = FolderKey::ALL
        .iter()
        .enumerate()
        .map(|(i, k)| format!("{} {}", i + 1, k.name()))
        .collect::<Vec<_>>();
    let selected = FolderKey::ALL.iter().position(|k| *k == app.folder).unwrap_or(0);

    let tabs = Tabs::new(titles)
        .block(Block::default().borders(Borders::ALL).title(account.to_string()))
        .select(selected)
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED));

    f.render_widget(tabs, chunks[0]);

    let items = if app.messages.is_empty() {
        let hint = if app.loading { "Loading..." } else { "No messages (press o to refresh)" };
        vec![ListItem::new(hint)]
    } else {
        app.messages.iter().map(|m| {
            let date = m.date.format("%Y-%m-%d %H:%M");
            ListItem::new(format!("{}\n  {}  {date}", m.subject, m.from))
        }).collect::<Vec<_>>()
    };

    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title(app.folder.name()))
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
        .highlight_symbol("▶ ");

    let mut state = ListState::default();
    if !app.messages.is_empty() {
        state.select(Some(app.selected.min(app.messages.len().saturating_sub(1))));
    }

    f.render_stateful_widget(list, chunks[1], &mut state);

    let help = Paragraph::new(format!(
        "{}   {}",
        app.status,
        "j/k move · Enter open · 1-5 folder · [/] account · o refresh · c compose · a accounts · q quit"
    ))
        .wrap(Wrap { trim: true });

    f.render_widget(help, chunks[2]);
}
