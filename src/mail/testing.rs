//! In-memory stand-ins for an IMAP server, used by the mail tests.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use super::session::{Connector, MailSession, RawEnvelope, RawMessage};
use super::{GatewayError, ServerConfig};

#[derive(Debug, Default)]
pub struct FakeSession {
    mailboxes: HashMap<String, Vec<RawMessage>>,
    open: Option<String>,
    /// Overrides the reported message count when set.
    pub reported_count: Option<u32>,
    pub fail_fetch: bool,

    pub open_attempts: Vec<String>,
    pub releases: usize,
    pub range_fetches: usize,
    pub logouts: usize,
}

impl FakeSession {
    pub fn with_mailboxes(names: &[&str]) -> Self {
        Self {
            mailboxes: names.iter().map(|n| (n.to_string(), vec![])).collect(),
            ..Self::default()
        }
    }

    pub fn with_messages(mailbox: &str, messages: Vec<RawMessage>) -> Self {
        let mut s = Self::default();
        s.mailboxes.insert(mailbox.to_string(), messages);
        s
    }
}

impl MailSession for FakeSession {
    fn open_mailbox(&mut self, mailbox: &str) -> Result<(), GatewayError> {
        self.open_attempts.push(mailbox.to_string());
        if self.mailboxes.contains_key(mailbox) {
            self.open = Some(mailbox.to_string());
            Ok(())
        } else {
            Err(GatewayError::Protocol(format!("NO [NONEXISTENT] {mailbox}")))
        }
    }

    fn release_mailbox(&mut self) -> Result<(), GatewayError> {
        self.releases += 1;
        self.open = None;
        Ok(())
    }

    fn message_count(&mut self, mailbox: &str) -> Result<u32, GatewayError> {
        if let Some(n) = self.reported_count {
            return Ok(n);
        }
        self.mailboxes
            .get(mailbox)
            .map(|m| m.len() as u32)
            .ok_or_else(|| GatewayError::Protocol(format!("mailbox {mailbox} is not open")))
    }

    fn fetch_all(&mut self) -> Result<Vec<RawMessage>, GatewayError> {
        self.range_fetches += 1;
        if self.fail_fetch {
            return Err(GatewayError::Protocol("connection reset during FETCH".into()));
        }
        let open = self
            .open
            .as_ref()
            .ok_or_else(|| GatewayError::Protocol("no mailbox selected".into()))?;
        Ok(self.mailboxes.get(open).cloned().unwrap_or_default())
    }

    fn logout(&mut self) -> Result<(), GatewayError> {
        self.logouts += 1;
        Ok(())
    }
}

/// Hands out one prepared session and keeps it inspectable after the
/// gateway is done with it.
#[derive(Clone, Default)]
pub struct FakeConnector {
    pub session: Rc<RefCell<Option<FakeSession>>>,
    pub refuse: Option<String>,
}

impl FakeConnector {
    pub fn new(session: FakeSession) -> Self {
        Self {
            session: Rc::new(RefCell::new(Some(session))),
            refuse: None,
        }
    }

    pub fn refusing(reason: &str) -> Self {
        Self {
            session: Rc::default(),
            refuse: Some(reason.to_string()),
        }
    }
}

/// Session wrapper that puts the fake back when the gateway drops it.
pub struct ReturnedSession {
    inner: Option<FakeSession>,
    slot: Rc<RefCell<Option<FakeSession>>>,
}

impl Drop for ReturnedSession {
    fn drop(&mut self) {
        *self.slot.borrow_mut() = self.inner.take();
    }
}

impl ReturnedSession {
    fn get(&mut self) -> Result<&mut FakeSession, GatewayError> {
        self.inner
            .as_mut()
            .ok_or_else(|| GatewayError::Protocol("session gone".into()))
    }
}

impl MailSession for ReturnedSession {
    fn open_mailbox(&mut self, mailbox: &str) -> Result<(), GatewayError> {
        self.get()?.open_mailbox(mailbox)
    }

    fn release_mailbox(&mut self) -> Result<(), GatewayError> {
        self.get()?.release_mailbox()
    }

    fn message_count(&mut self, mailbox: &str) -> Result<u32, GatewayError> {
        self.get()?.message_count(mailbox)
    }

    fn fetch_all(&mut self) -> Result<Vec<RawMessage>, GatewayError> {
        self.get()?.fetch_all()
    }

    fn logout(&mut self) -> Result<(), GatewayError> {
        self.get()?.logout()
    }
}

impl Connector for FakeConnector {
    type Session = ReturnedSession;

    fn connect(&self, server: &ServerConfig) -> Result<Self::Session, GatewayError> {
        if let Some(reason) = &self.refuse {
            return Err(GatewayError::Connect {
                host: server.host.clone(),
                port: server.port,
                reason: reason.clone(),
            });
        }
        Ok(ReturnedSession {
            inner: self.session.borrow_mut().take(),
            slot: Rc::clone(&self.session),
        })
    }
}

pub fn server() -> ServerConfig {
    ServerConfig {
        host: "imap.example.com".into(),
        port: 993,
        secure: true,
        user: "a@x.com".into(),
        pass: "secret".into(),
    }
}

/// A raw fetch item whose envelope and source agree.
pub fn raw(uid: u32, subject: &str, date: &str) -> RawMessage {
    let source = format!(
        "From: Alice <alice@example.com>\r\n\
         To: a@x.com\r\n\
         Subject: {subject}\r\n\
         Date: {date}\r\n\
         Content-Type: text/plain; charset=utf-8\r\n\
         \r\n\
         Body of {uid}\r\n"
    );
    RawMessage {
        uid: Some(uid),
        envelope: RawEnvelope {
            subject: Some(subject.as_bytes().to_vec()),
            from: Some("alice@example.com".into()),
            date: Some(date.as_bytes().to_vec()),
        },
        source: Some(source.into_bytes()),
    }
}
