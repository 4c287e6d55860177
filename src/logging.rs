use anyhow::{anyhow, Result};
use env_logger::{Env, Target};
use std::fs::{self, OpenOptions};
use std::io::Write as _;
use std::path::PathBuf;

pub fn log_path() -> Result<PathBuf> {
    let dir = dirs::data_dir().ok_or_else(|| anyhow!("no data dir"))?;
    Ok(dir.join("tidemail").join("tidemail.log"))
}

/// Sends log records to a file; the terminal belongs to the UI.
pub fn init(default_level: &str) -> Result<PathBuf> {
    let path = log_path()?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let file = OpenOptions::new().create(true).append(true).open(&path)?;

    env_logger::Builder::from_env(Env::default().default_filter_or(default_level))
        .target(Target::Pipe(Box::new(file)))
        .format(|buf, record| {
            writeln!(
                buf,
                "[{} {} {}] {}",
                chrono::Local::now().format("%Y-%m-%dT%H:%M:%S%.3f"),
                record.level(),
                record.target(),
                record.args()
            )
        })
        .try_init()?;

    Ok(path)
}
