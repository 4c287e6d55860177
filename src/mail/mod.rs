pub mod error;
pub mod fetch;
pub mod folders;
pub mod gateway;
pub mod imap;
pub mod session;
pub mod smtp;

#[cfg(test)]
pub(crate) mod testing;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use error::GatewayError;
pub use folders::{FolderKey, FolderRequest};

/// Inbound connection settings handed to every gateway call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub secure: bool,
    pub user: String,
    pub pass: String,
}

/// Outbound connection settings. The host is always explicit; port and TLS
/// mode come from the app-wide outbound policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundConfig {
    pub host: String,
    pub port: u16,
    pub implicit_tls: bool,
    pub user: String,
    pub pass: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendRequest {
    pub to: String,
    pub subject: String,
    pub text: String,
}

/// A fetched message reduced to what the UI shows.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedMessage {
    pub uid: u32,
    pub subject: String,
    pub from: String,
    pub date: DateTime<Utc>,
    pub html_body: String,
    pub text_body: String,
    pub folder: String,
}

/// Result of a login test or a send.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outcome {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Outcome {
    pub fn ok() -> Self {
        Self { success: true, error: None }
    }

    pub fn failed(error: impl ToString) -> Self {
        Self { success: false, error: Some(error.to_string()) }
    }
}

impl From<Result<(), GatewayError>> for Outcome {
    fn from(r: Result<(), GatewayError>) -> Self {
        match r {
            Ok(()) => Outcome::ok(),
            Err(e) => Outcome::failed(e),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FetchOutcome {
    pub success: bool,
    pub messages: Vec<NormalizedMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<Result<Vec<NormalizedMessage>, GatewayError>> for FetchOutcome {
    fn from(r: Result<Vec<NormalizedMessage>, GatewayError>) -> Self {
        match r {
            Ok(messages) => Self { success: true, messages, error: None },
            Err(e) => Self { success: false, messages: vec![], error: Some(e.to_string()) },
        }
    }
}
