use native_tls::{TlsConnector, TlsStream};
use std::io::{Read, Write};
use std::net::TcpStream;

use super::session::{Connector, MailSession, RawEnvelope, RawMessage};
use super::{GatewayError, ServerConfig};

const FETCH_QUERY: &str = "(UID ENVELOPE BODY.PEEK[])";

pub fn is_localhost(host: &str) -> bool {
    host == "127.0.0.1" || host == "localhost"
}

pub fn tls_connector_for(host: &str) -> Result<TlsConnector, GatewayError> {
    let mut b = TlsConnector::builder();

    // local bridges present self-signed certificates
    if is_localhost(host) {
        b.danger_accept_invalid_certs(true);
        b.danger_accept_invalid_hostnames(true);
    }

    Ok(b.build()?)
}

/// Opens real IMAP sessions: implicit TLS when `secure`, STARTTLS otherwise.
#[derive(Clone, Copy, Debug, Default)]
pub struct ImapConnector;

impl Connector for ImapConnector {
    type Session = ImapSession<TlsStream<TcpStream>>;

    fn connect(&self, cfg: &ServerConfig) -> Result<Self::Session, GatewayError> {
        let tls = tls_connector_for(&cfg.host)?;
        let addr = (cfg.host.as_str(), cfg.port);

        let client = if cfg.secure {
            imap::connect(addr, &cfg.host, &tls)
        } else {
            imap::connect_starttls(addr, &cfg.host, &tls)
        }
        .map_err(|e| GatewayError::Connect {
            host: cfg.host.clone(),
            port: cfg.port,
            reason: e.to_string(),
        })?;

        let session = client
            .login(&cfg.user, &cfg.pass)
            .map_err(|e| GatewayError::Auth(e.0.to_string()))?;

        log::debug!("logged in to {}:{} as {}", cfg.host, cfg.port, cfg.user);
        Ok(ImapSession::new(session))
    }
}

pub struct ImapSession<T: Read + Write> {
    inner: imap::Session<T>,
    /// Mailbox opened by the last EXAMINE and the EXISTS count it reported.
    opened: Option<(String, u32)>,
}

impl<T: Read + Write> ImapSession<T> {
    pub fn new(inner: imap::Session<T>) -> Self {
        Self { inner, opened: None }
    }
}

fn bytes_opt_to_vec(v: Option<&[u8]>) -> Option<Vec<u8>> {
    v.map(|b| b.to_vec())
}

fn addr_to_string(mailbox: Option<&[u8]>, host: Option<&[u8]>) -> Option<String> {
    let mailbox = mailbox.map(|b| String::from_utf8_lossy(b).trim().to_string())?;
    let host = host.map(|b| String::from_utf8_lossy(b).trim().to_string())?;

    if mailbox.is_empty() || host.is_empty() {
        None
    } else {
        Some(format!("{mailbox}@{host}"))
    }
}

impl<T: Read + Write> MailSession for ImapSession<T> {
    fn open_mailbox(&mut self, mailbox: &str) -> Result<(), GatewayError> {
        // EXAMINE keeps \Seen untouched and makes the later CLOSE expunge-free
        let selected = self.inner.examine(mailbox)?;
        self.opened = Some((mailbox.to_string(), selected.exists));
        Ok(())
    }

    fn release_mailbox(&mut self) -> Result<(), GatewayError> {
        self.opened = None;
        self.inner.close()?;
        Ok(())
    }

    // imap's STATUS parser leaves `exists` at zero, so the count comes from
    // the EXISTS line of the EXAMINE reply instead.
    fn message_count(&mut self, mailbox: &str) -> Result<u32, GatewayError> {
        match &self.opened {
            Some((name, exists)) if name == mailbox => Ok(*exists),
            _ => Err(GatewayError::Protocol(format!("mailbox {mailbox} is not open"))),
        }
    }

    fn fetch_all(&mut self) -> Result<Vec<RawMessage>, GatewayError> {
        let fetches = self.inner.fetch("1:*", FETCH_QUERY)?;

        let out = fetches
            .iter()
            .map(|f| {
                let envelope = f
                    .envelope()
                    .map(|env| RawEnvelope {
                        subject: bytes_opt_to_vec(env.subject.as_deref()),
                        from: env
                            .from
                            .as_ref()
                            .and_then(|froms| froms.first())
                            .and_then(|a| addr_to_string(a.mailbox.as_deref(), a.host.as_deref())),
                        date: bytes_opt_to_vec(env.date.as_deref()),
                    })
                    .unwrap_or_default();

                RawMessage {
                    uid: f.uid,
                    envelope,
                    source: f.body().map(|b| b.to_vec()),
                }
            })
            .collect();

        Ok(out)
    }

    fn logout(&mut self) -> Result<(), GatewayError> {
        self.inner.logout()?;
        Ok(())
    }
}
