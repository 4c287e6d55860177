use ratatui::Frame;
use crate::app::{App, View};

mod list;
mod view;
mod compose;
mod accounts;
mod account_form;

pub fn draw(f: &mut Frame, app: &App) {
    match app.view {
        View::List => list::draw(f, app),
        View::Mail => view::draw(f, app),
        View::Compose => compose::draw(f, app),
        View::Accounts => accounts::draw(f, app),
        View::AccountForm => account_form::draw(f, app),
    }
}
