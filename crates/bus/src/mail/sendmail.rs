//! Sendmail mode: relays a pre-built message read from stdin.

use chrono::{DateTime, FixedOffset};

use super::message::{check_header_value, crlf};
use super::EmailError;

/// Header stamped on every relayed message.
pub const SENDMAIL_HEADER: (&str, &str) = ("X-DjangoPBX-sendmail", "sendmail.py");

/// A message ready for submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedMessage {
    pub recipients: Vec<String>,
    pub data: String,
}

/// Rewrites a raw message for relaying.
///
/// `From` is replaced with `smtp_from`, `Date` is added when missing and the
/// sendmail marker header is set. With `extract_recipients` (`-t`) the
/// envelope recipients come from `To`, `Cc` and `Bcc` and the `Bcc` header is
/// dropped; otherwise `recipients` are used as given.
pub fn prepare_sendmail(
    raw: &str,
    smtp_from: &str,
    recipients: &[String],
    extract_recipients: bool,
    now: DateTime<FixedOffset>,
) -> Result<PreparedMessage, EmailError> {
    check_header_value("From", smtp_from)?;
    let raw = raw.replace("\r\n", "\n");
    let (head, body) = match raw.split_once("\n\n") {
        Some((head, body)) => (head, body),
        None if raw.trim().is_empty() => {
            return Err(EmailError::InvalidMessage("empty message".to_string()))
        }
        None => (raw.as_str(), ""),
    };

    let mut headers = parse_headers(head)?;

    let mut envelope: Vec<String> = Vec::new();
    if extract_recipients {
        for (name, value) in &headers {
            if ["to", "cc", "bcc"].contains(&name.to_ascii_lowercase().as_str()) {
                envelope.extend(addresses(value));
            }
        }
        headers.retain(|(name, _)| !name.eq_ignore_ascii_case("bcc"));
    }
    for recipient in recipients {
        envelope.extend(addresses(recipient));
    }
    if envelope.is_empty() {
        return Err(EmailError::NoRecipients);
    }

    headers.retain(|(name, _)| {
        !name.eq_ignore_ascii_case("from") && !name.eq_ignore_ascii_case(SENDMAIL_HEADER.0)
    });
    headers.push(("From".to_string(), smtp_from.to_string()));
    if !headers.iter().any(|(name, _)| name.eq_ignore_ascii_case("date")) {
        headers.push(("Date".to_string(), now.to_rfc2822()));
    }
    headers.push((SENDMAIL_HEADER.0.to_string(), SENDMAIL_HEADER.1.to_string()));

    let mut data = String::new();
    for (name, value) in &headers {
        data.push_str(name);
        data.push_str(": ");
        data.push_str(&value.replace('\n', "\r\n"));
        data.push_str("\r\n");
    }
    data.push_str("\r\n");
    data.push_str(&crlf(body));

    Ok(PreparedMessage {
        recipients: envelope,
        data,
    })
}

/// Decodes stdin as UTF-8, replacing invalid sequences.
///
/// With `stop_at_dot` input ends at a line holding a single `.`.
pub fn decode_input(bytes: &[u8], stop_at_dot: bool) -> String {
    let text = String::from_utf8_lossy(bytes);
    if !stop_at_dot {
        return text.into_owned();
    }
    let mut out = String::with_capacity(text.len());
    for line in text.split_inclusive('\n') {
        if line.trim_end_matches(['\r', '\n']) == "." {
            break;
        }
        out.push_str(line);
    }
    out
}

/// Parses a header block, keeping folded continuation lines with their header.
fn parse_headers(head: &str) -> Result<Vec<(String, String)>, EmailError> {
    let mut headers: Vec<(String, String)> = Vec::new();
    for line in head.lines() {
        if line.starts_with([' ', '\t']) {
            match headers.last_mut() {
                Some((_, value)) => {
                    value.push('\n');
                    value.push_str(line);
                }
                None => {
                    return Err(EmailError::InvalidMessage(
                        "continuation line before any header".to_string(),
                    ))
                }
            }
            continue;
        }
        let (name, value) = line.split_once(':').ok_or_else(|| {
            EmailError::InvalidMessage(format!("malformed header line {:?}", line))
        })?;
        headers.push((name.trim().to_string(), value.trim().to_string()));
    }
    Ok(headers)
}

/// Bare addresses from an address list such as `Alice <a@x>, b@y`.
fn addresses(list: &str) -> Vec<String> {
    list.split([',', ';'])
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| match (entry.rfind('<'), entry.rfind('>')) {
            (Some(start), Some(end)) if start < end => entry[start + 1..end].trim().to_string(),
            _ => entry.to_string(),
        })
        .filter(|addr| !addr.is_empty())
        .collect()
}
