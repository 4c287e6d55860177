use super::{GatewayError, ServerConfig};

/// Envelope fields as the server sent them, before any decoding.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RawEnvelope {
    pub subject: Option<Vec<u8>>,
    /// First sender as a bare `mailbox@host`.
    pub from: Option<String>,
    pub date: Option<Vec<u8>>,
}

/// One item of a range fetch, owned so it can outlive the server response.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RawMessage {
    pub uid: Option<u32>,
    pub envelope: RawEnvelope,
    pub source: Option<Vec<u8>>,
}

/// An authenticated IMAP session, narrowed to what a single fetch needs.
pub trait MailSession {
    /// Opens `mailbox` for reading. Fails if the server does not know it.
    fn open_mailbox(&mut self, mailbox: &str) -> Result<(), GatewayError>;

    /// Releases whichever mailbox is currently open.
    fn release_mailbox(&mut self) -> Result<(), GatewayError>;

    fn message_count(&mut self, mailbox: &str) -> Result<u32, GatewayError>;

    /// Fetches envelope and full source of every message in the open mailbox.
    fn fetch_all(&mut self) -> Result<Vec<RawMessage>, GatewayError>;

    fn logout(&mut self) -> Result<(), GatewayError>;
}

/// Opens authenticated sessions.
pub trait Connector {
    type Session: MailSession;

    fn connect(&self, server: &ServerConfig) -> Result<Self::Session, GatewayError>;
}
