use anyhow::Result;
use crossterm::{
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, enable_raw_mode, disable_raw_mode},
};
use std::io::stdout;

mod accounts;
mod app;
mod config;
mod logging;
mod ui;
mod mail;

#[tokio::main]
async fn main() -> Result<()> {
    let (config, config_path) = config::Config::load_or_create()?;
    let log_path = logging::init(&config.log.level)?;
    let store = accounts::AccountStore::open_default()?;

    log::info!(
        "starting tidemail (config {}, accounts {}, log {})",
        config_path.display(),
        store.path().display(),
        log_path.display()
    );

    enable_raw_mode()?;
    execute!(stdout(), EnterAlternateScreen)?;

    let result = app::run(config, store).await;

    disable_raw_mode()?;
    execute!(stdout(), LeaveAlternateScreen)?;

    if let Err(e) = &result {
        log::error!("exiting with error: {e:#}");
    }
    result
}
