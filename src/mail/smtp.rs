use lettre::transport::smtp::authentication::Credentials;
use lettre::transport::smtp::client::{Tls, TlsParameters};
use lettre::{Message, SmtpTransport, Transport};

use super::imap::is_localhost;
use super::{GatewayError, OutboundConfig, SendRequest};

/// Suggests an outbound host for an inbound one by swapping a leading
/// `imap.` label for `smtp.`. Only used to pre-fill the account form.
pub fn suggest_smtp_host(imap_host: &str) -> Option<String> {
    let host = imap_host.trim();
    let rest = host
        .get(..5)
        .filter(|p| p.eq_ignore_ascii_case("imap."))
        .map(|_| &host[5..])?;

    if rest.is_empty() {
        None
    } else {
        Some(format!("smtp.{rest}"))
    }
}

pub fn build_message(from: &str, req: &SendRequest) -> Result<Message, GatewayError> {
    Message::builder()
        .from(from.parse()?)
        .to(req.to.trim().parse()?)
        .subject(req.subject.as_str())
        .body(req.text.clone())
        .map_err(|e| GatewayError::Send(e.to_string()))
}

pub fn transport_for(cfg: &OutboundConfig) -> Result<SmtpTransport, GatewayError> {
    if cfg.host.trim().is_empty() {
        return Err(GatewayError::Config(
            "no outbound (SMTP) host configured for this account".to_string(),
        ));
    }

    let creds = Credentials::new(cfg.user.clone(), cfg.pass.clone());

    let mut tlsb = TlsParameters::builder(cfg.host.clone());
    if is_localhost(&cfg.host) {
        tlsb = tlsb
            .dangerous_accept_invalid_certs(true)
            .dangerous_accept_invalid_hostnames(true);
    }
    let tls = tlsb.build().map_err(|e| GatewayError::Tls(e.to_string()))?;

    let tls = if cfg.implicit_tls {
        Tls::Wrapper(tls)
    } else {
        Tls::Required(tls)
    };

    Ok(SmtpTransport::builder_dangerous(&cfg.host)
        .port(cfg.port)
        .credentials(creds)
        .tls(tls)
        .build())
}

/// Hands `message` to `transport` once. No retry.
pub fn deliver<T>(transport: &T, message: &Message) -> Result<(), GatewayError>
where
    T: Transport,
    T::Error: std::fmt::Display,
{
    transport
        .send(message)
        .map(|_| ())
        .map_err(|e| GatewayError::Send(e.to_string()))
}

pub fn send(cfg: &OutboundConfig, from: &str, req: &SendRequest) -> Result<(), GatewayError> {
    let message = build_message(from, req)?;
    let transport = transport_for(cfg)?;
    deliver(&transport, &message)
}
