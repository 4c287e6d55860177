use ratatui::{
    Frame,
    layout::{Layout, Direction, Constraint},
    widgets::{Block, Borders, Paragraph, Wrap},
};

use crate::app::{App, FormField};

fn mask(s: &str) -> String {
    "*".repeat(s.chars().count())
}

fn line(app: &App, field: FormField, label: &str, value: &str) -> String {
    let prefix = if app.form.focus == field { "▶ " } else { "  " };
    format!("{prefix}{label:<10} {value}\n")
}

pub fn draw(f: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(1), Constraint::Length(2)])
        .split(f.size());

    let form = &app.form;
    let mut s = String::new();

    s.push_str(&line(app, FormField::Label, "label", &form.label));
    s.push_str(&line(app, FormField::User, "username", &form.user));
    s.push_str(&line(app, FormField::Pass, "password", &mask(&form.pass)));

    s.push_str("\nIMAP\n");
    s.push_str(&line(app, FormField::Host, "host", &form.host));
    s.push_str(&line(app, FormField::Port, "port", &form.port));
    s.push_str(&line(app, FormField::Secure, "tls", if form.secure { "implicit" } else { "starttls" }));

    s.push_str("\nSMTP\n");
    s.push_str(&line(app, FormField::SmtpHost, "host", &form.smtp_host));
    s.push_str(&format!(
        "  {:<10} {} ({})\n",
        "port",
        app.config.outbound.port,
        if app.config.outbound.implicit_tls { "implicit tls" } else { "starttls" }
    ));

    let title = if form.editing { "Edit account" } else { "Add account" };
    let body = Paragraph::new(s)
        .block(Block::default().borders(Borders::ALL).title(title))
        .wrap(Wrap { trim: false });

    f.render_widget(body, chunks[0]);

    let help = Paragraph::new(format!(
        "{}   {}",
        app.status,
        "Tab/Shift+Tab navigate · Space toggle tls · Ctrl+S test & save · Esc back"
    ));
    f.render_widget(help, chunks[1]);
}
