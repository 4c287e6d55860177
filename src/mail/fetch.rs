use chrono::{DateTime, Utc};
use mailparse::{MailHeaderMap, ParsedMail};

use super::error::ParseError;
use super::folders::MailboxHandle;
use super::session::{MailSession, RawMessage};
use super::{GatewayError, NormalizedMessage};

/// Most recent messages returned by a single fetch.
pub const MAX_MESSAGES: usize = 50;

const NO_SUBJECT: &str = "(No Subject)";
const UNKNOWN_SENDER: &str = "(Unknown)";

/// Reads every message in the handle's mailbox and returns the newest
/// [`MAX_MESSAGES`], most recent first. The mailbox is released before
/// returning, whatever the outcome.
pub fn fetch<S: MailSession>(
    mut handle: MailboxHandle<'_, S>,
    now: DateTime<Utc>,
) -> Result<Vec<NormalizedMessage>, GatewayError> {
    let result = fetch_open(&mut handle, now);
    handle.release();
    result
}

fn fetch_open<S: MailSession>(
    handle: &mut MailboxHandle<'_, S>,
    now: DateTime<Utc>,
) -> Result<Vec<NormalizedMessage>, GatewayError> {
    let mailbox = handle.mailbox().to_string();

    let count = handle.session().message_count(&mailbox)?;
    if count == 0 {
        log::info!("mailbox {mailbox} is empty");
        return Ok(vec![]);
    }

    let raws = handle.session().fetch_all()?;
    let total = raws.len();

    let mut out = Vec::with_capacity(total);
    for raw in raws {
        match normalize(raw, &mailbox, now) {
            Ok(m) => out.push(m),
            Err(e) => log::warn!("dropping message from {mailbox}: {e}"),
        }
    }

    // stable: equal dates keep server order
    out.sort_by(|a, b| b.date.cmp(&a.date));
    out.truncate(MAX_MESSAGES);

    log::info!("fetched {} of {total} messages from {mailbox}", out.len());
    Ok(out)
}

/// Turns one raw fetch item into a [`NormalizedMessage`].
pub fn normalize(
    raw: RawMessage,
    folder: &str,
    now: DateTime<Utc>,
) -> Result<NormalizedMessage, ParseError> {
    let uid = raw.uid.ok_or(ParseError::MissingUid)?;
    let source = raw.source.ok_or(ParseError::MissingSource)?;
    let parsed = mailparse::parse_mail(&source)?;

    let mut bodies = Bodies::default();
    collect_bodies(&parsed, &mut bodies)?;

    let html_body = match (&bodies.html, &bodies.text) {
        (Some(html), _) => html.clone(),
        (None, Some(text)) => text_to_html(text),
        (None, None) => String::new(),
    };
    let text_body = match (bodies.text, &bodies.html) {
        (Some(text), _) => text,
        (None, Some(html)) => html2text::from_read(html.as_bytes(), 80).unwrap_or_default(),
        (None, None) => String::new(),
    };

    let subject = raw
        .envelope
        .subject
        .as_deref()
        .map(decode_subject)
        .or_else(|| parsed.headers.get_first_value("Subject"))
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| NO_SUBJECT.to_string());

    let from = raw
        .envelope
        .from
        .filter(|s| !s.is_empty())
        .or_else(|| header_address(&parsed, "From"))
        .unwrap_or_else(|| UNKNOWN_SENDER.to_string());

    let date = raw
        .envelope
        .date
        .as_deref()
        .map(|d| String::from_utf8_lossy(d).into_owned())
        .or_else(|| parsed.headers.get_first_value("Date"))
        .and_then(|d| parse_date(&d))
        .unwrap_or(now);

    Ok(NormalizedMessage {
        uid,
        subject,
        from,
        date,
        html_body,
        text_body,
        folder: folder.to_string(),
    })
}

#[derive(Default)]
struct Bodies {
    text: Option<String>,
    html: Option<String>,
}

fn collect_bodies(m: &ParsedMail, out: &mut Bodies) -> Result<(), ParseError> {
    if !m.subparts.is_empty() {
        for sp in &m.subparts {
            collect_bodies(sp, out)?;
        }
        return Ok(());
    }

    if matches!(
        m.get_content_disposition().disposition,
        mailparse::DispositionType::Attachment
    ) {
        return Ok(());
    }

    let slot = match m.ctype.mimetype.to_lowercase().as_str() {
        "text/plain" => &mut out.text,
        "text/html" => &mut out.html,
        _ => return Ok(()),
    };

    let body = m.get_body()?;
    match slot {
        Some(existing) => {
            existing.push_str("\n\n");
            existing.push_str(&body);
        }
        None => *slot = Some(body),
    }
    Ok(())
}

/// Decodes RFC 2047 words by running the value through mailparse's header
/// decoder.
fn decode_subject(raw: &[u8]) -> String {
    let mut line = b"Subject: ".to_vec();
    line.extend_from_slice(raw);
    line.extend_from_slice(b"\r\n");

    match mailparse::parse_header(&line) {
        Ok((h, _)) => h.get_value(),
        Err(_) => String::from_utf8_lossy(raw).into_owned(),
    }
}

fn header_address(parsed: &ParsedMail, name: &str) -> Option<String> {
    let value = parsed.headers.get_first_value(name)?;
    let addrs = mailparse::addrparse(&value).ok()?;
    addrs.iter().find_map(|a| match a {
        mailparse::MailAddr::Single(info) => Some(info.addr.clone()),
        mailparse::MailAddr::Group(g) => g.addrs.first().map(|i| i.addr.clone()),
    })
}

fn parse_date(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(d) = DateTime::parse_from_rfc2822(s) {
        return Some(d.with_timezone(&Utc));
    }
    // mailparse is laxer about obsolete forms; a non-positive result means it
    // found no usable date
    let ts = mailparse::dateparse(s).ok().filter(|ts| *ts > 0)?;
    DateTime::from_timestamp(ts, 0)
}

fn text_to_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 16);
    out.push_str("<p>");
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\n' => out.push_str("<br/>"),
            '\r' => {}
            c => out.push(c),
        }
    }
    out.push_str("</p>");
    out
}
