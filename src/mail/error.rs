use thiserror::Error;

/// Everything that can go wrong between opening a session and tearing it down.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("connection to {host}:{port} failed: {reason}")]
    Connect {
        host: String,
        port: u16,
        reason: String,
    },

    #[error("TLS setup failed: {0}")]
    Tls(String),

    #[error("authentication rejected: {0}")]
    Auth(String),

    #[error("could not open any mailbox for {folder} (tried {})", tried.join(", "))]
    FolderNotFound { folder: String, tried: Vec<String> },

    #[error("IMAP error: {0}")]
    Protocol(String),

    #[error("invalid address: {0}")]
    Address(String),

    #[error("send failed: {0}")]
    Send(String),

    #[error("{0}")]
    Config(String),
}

impl From<native_tls::Error> for GatewayError {
    fn from(e: native_tls::Error) -> Self {
        GatewayError::Tls(e.to_string())
    }
}

impl From<imap::error::Error> for GatewayError {
    fn from(e: imap::error::Error) -> Self {
        GatewayError::Protocol(e.to_string())
    }
}

impl From<lettre::address::AddressError> for GatewayError {
    fn from(e: lettre::address::AddressError) -> Self {
        GatewayError::Address(e.to_string())
    }
}

/// Why a single fetched message was dropped from a listing.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("server returned no UID")]
    MissingUid,

    #[error("server returned no message source")]
    MissingSource,

    #[error("malformed MIME: {0}")]
    Mime(#[from] mailparse::MailParseError),
}
