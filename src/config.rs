use serde::{Deserialize, Serialize};
use anyhow::{anyhow, Result};
use std::{fs, path::{Path, PathBuf}};

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub outbound: OutboundPolicy,
    #[serde(default)]
    pub log: LogConfig,
}

/// Outbound port and TLS mode shared by every account.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
pub struct OutboundPolicy {
    pub port: u16,
    pub implicit_tls: bool,
}

impl Default for OutboundPolicy {
    fn default() -> Self {
        Self { port: 465, implicit_tls: true }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct LogConfig {
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self { level: "info".to_string() }
    }
}

impl Config {
    pub fn dir() -> Result<PathBuf> {
        let dir = dirs::config_dir().ok_or_else(|| anyhow!("no config dir"))?;
        Ok(dir.join("tidemail"))
    }

    pub fn load_or_create() -> Result<(Self, PathBuf)> {
        let path = Self::dir()?.join("config.toml");
        let cfg = Self::load_or_create_at(&path)?;
        Ok((cfg, path))
    }

    pub fn load_or_create_at(path: &Path) -> Result<Self> {
        if !path.exists() {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(path, DEFAULT_CONFIG)?;
            return Ok(toml::from_str(DEFAULT_CONFIG)?);
        }

        let data = fs::read_to_string(path)?;
        Ok(toml::from_str(&data)?)
    }
}

const DEFAULT_CONFIG: &str = r#"
# Port and TLS mode used for every account's outbound (SMTP) host.
# implicit_tls = true speaks TLS from the first byte (usually port 465);
# false upgrades with STARTTLS (usually port 587).
[outbound]
port = 465
implicit_tls = true

[log]
# env_logger filter; RUST_LOG takes precedence
level = "info"
"#;
