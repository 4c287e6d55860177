//! One request, one connection.
//!
//! Every call here opens its own authenticated session, does exactly one
//! thing, logs out whatever happened, and reports back as a plain result
//! value. Nothing is retried and no error escapes as a panic.

use chrono::Utc;

use super::fetch;
use super::folders::{self, FolderRequest};
use super::session::{Connector, MailSession};
use super::smtp;
use super::{FetchOutcome, GatewayError, OutboundConfig, Outcome, SendRequest, ServerConfig};

fn with_session<C, T>(
    connector: &C,
    server: &ServerConfig,
    op: impl FnOnce(&mut C::Session) -> Result<T, GatewayError>,
) -> Result<T, GatewayError>
where
    C: Connector,
{
    let mut session = connector.connect(server)?;
    let result = op(&mut session);
    if let Err(e) = session.logout() {
        log::warn!("logout from {} failed: {e}", server.host);
    }
    result
}

/// Connects, authenticates and logs straight out.
pub fn test_login<C: Connector>(connector: &C, server: &ServerConfig) -> Outcome {
    let result = with_session(connector, server, |_| Ok(()));
    if let Err(e) = &result {
        log::error!("login test for {}@{} failed: {e}", server.user, server.host);
    }
    result.into()
}

/// Lists the newest messages of `folder`.
pub fn fetch_folder<C: Connector>(
    connector: &C,
    server: &ServerConfig,
    folder: &FolderRequest,
) -> FetchOutcome {
    log::info!("fetching {folder} for {}@{}", server.user, server.host);

    let result = with_session(connector, server, |session| {
        let handle = folders::resolve(session, folder)?;
        fetch::fetch(handle, Utc::now())
    });
    if let Err(e) = &result {
        log::error!("fetch of {folder} failed: {e}");
    }
    result.into()
}

pub fn send_message(outbound: &OutboundConfig, from: &str, req: &SendRequest) -> Outcome {
    let result = smtp::send(outbound, from, req);
    match &result {
        Ok(()) => log::info!("sent message to {} via {}", req.to, outbound.host),
        Err(e) => log::error!("send via {}:{} failed: {e}", outbound.host, outbound.port),
    }
    result.into()
}
