use std::fmt;

use serde::{Deserialize, Serialize};

use super::session::MailSession;
use super::GatewayError;

/// The client's server-agnostic name for a standard mailbox.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FolderKey {
    Inbox,
    Sent,
    Drafts,
    Spam,
    Trash,
}

// Most common convention first; order decides which name wins when a server
// exposes several.
const CANDIDATES: [(FolderKey, &[&str]); 5] = [
    (FolderKey::Inbox, &["INBOX"]),
    (
        FolderKey::Sent,
        &["Sent", "Sent Mail", "Sent Items", "[Gmail]/Sent Mail", "INBOX.Sent"],
    ),
    (
        FolderKey::Drafts,
        &["Drafts", "Draft", "[Gmail]/Drafts", "INBOX.Drafts"],
    ),
    (
        FolderKey::Spam,
        &["Junk", "Junk E-mail", "Spam", "[Gmail]/Spam", "INBOX.Spam", "INBOX.Junk"],
    ),
    (
        FolderKey::Trash,
        &["Trash", "Deleted Items", "Bin", "[Gmail]/Trash", "INBOX.Trash"],
    ),
];

impl FolderKey {
    pub const ALL: [FolderKey; 5] = [
        FolderKey::Inbox,
        FolderKey::Sent,
        FolderKey::Drafts,
        FolderKey::Spam,
        FolderKey::Trash,
    ];

    pub fn name(self) -> &'static str {
        match self {
            FolderKey::Inbox => "inbox",
            FolderKey::Sent => "sent",
            FolderKey::Drafts => "drafts",
            FolderKey::Spam => "spam",
            FolderKey::Trash => "trash",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.name() == name)
    }

    pub fn candidates(self) -> &'static [&'static str] {
        CANDIDATES
            .iter()
            .find(|(k, _)| *k == self)
            .map(|(_, c)| *c)
            .unwrap_or(&[])
    }
}

impl fmt::Display for FolderKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// What the caller asked to open: a known folder, or a literal mailbox name.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FolderRequest {
    Known(FolderKey),
    Literal(String),
}

impl FolderRequest {
    pub fn parse(s: &str) -> Self {
        match FolderKey::from_name(s) {
            Some(k) => FolderRequest::Known(k),
            None => FolderRequest::Literal(s.to_string()),
        }
    }

    pub fn candidates(&self) -> Vec<&str> {
        match self {
            FolderRequest::Known(k) => k.candidates().to_vec(),
            FolderRequest::Literal(name) => vec![name.as_str()],
        }
    }
}

impl From<FolderKey> for FolderRequest {
    fn from(k: FolderKey) -> Self {
        FolderRequest::Known(k)
    }
}

impl fmt::Display for FolderRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FolderRequest::Known(k) => k.fmt(f),
            FolderRequest::Literal(s) => f.write_str(s),
        }
    }
}

/// An open mailbox. The mailbox is released exactly once: by
/// [`MailboxHandle::release`], or on drop if that never ran.
pub struct MailboxHandle<'s, S: MailSession> {
    session: &'s mut S,
    mailbox: String,
    released: bool,
}

impl<'s, S: MailSession> MailboxHandle<'s, S> {
    pub fn mailbox(&self) -> &str {
        &self.mailbox
    }

    pub fn session(&mut self) -> &mut S {
        &mut *self.session
    }

    pub fn release(mut self) {
        self.release_once();
    }

    fn release_once(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        if let Err(e) = self.session.release_mailbox() {
            log::warn!("releasing mailbox {} failed: {e}", self.mailbox);
        }
    }
}

impl<S: MailSession> Drop for MailboxHandle<'_, S> {
    fn drop(&mut self) {
        self.release_once();
    }
}

/// Opens the first candidate mailbox for `folder` that the server accepts.
pub fn resolve<'s, S: MailSession>(
    session: &'s mut S,
    folder: &FolderRequest,
) -> Result<MailboxHandle<'s, S>, GatewayError> {
    let candidates = folder.candidates();

    for candidate in &candidates {
        match session.open_mailbox(candidate) {
            Ok(()) => {
                log::info!("opened mailbox {candidate} for {folder}");
                return Ok(MailboxHandle {
                    session,
                    mailbox: candidate.to_string(),
                    released: false,
                });
            }
            Err(e) => log::debug!("mailbox {candidate} rejected: {e}; trying next"),
        }
    }

    Err(GatewayError::FolderNotFound {
        folder: folder.to_string(),
        tried: candidates.iter().map(|c| c.to_string()).collect(),
    })
}
