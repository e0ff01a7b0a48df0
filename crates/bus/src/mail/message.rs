//! RFC 5322 message composition.

use base64::{engine::general_purpose::STANDARD, Engine};
use chrono::{DateTime, FixedOffset, Local};
use uuid::Uuid;

use domain::models::TemplateType;
use domain::services::OutgoingEmail;

use super::EmailError;

/// Plain-text part sent alongside HTML bodies.
pub const HTML_FALLBACK_TEXT: &str =
    "This message contains HTML content. Please use an HTML capable email client to view it.";

/// Email message to be sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailMessage {
    pub from: String,
    /// Recipient list as written into the `To` header.
    pub to: String,
    pub subject: String,
    pub body: String,
    pub template_type: TemplateType,
}

impl MailMessage {
    pub fn new(from: impl Into<String>, email: &OutgoingEmail) -> Self {
        Self {
            from: from.into(),
            to: email.recipients.clone(),
            subject: email.subject.clone(),
            body: email.body.clone(),
            template_type: email.template_type,
        }
    }

    /// Renders the message dated now.
    pub fn render_now(&self) -> Result<String, EmailError> {
        let boundary = format!("=_djangopbx_{}", Uuid::new_v4().simple());
        self.render(Local::now().fixed_offset(), &boundary)
    }

    /// Renders headers and body with CRLF line endings.
    ///
    /// `boundary` is only used for HTML messages. Fails when an address or
    /// the subject contains a line break.
    pub fn render(&self, date: DateTime<FixedOffset>, boundary: &str) -> Result<String, EmailError> {
        check_header_value("From", &self.from)?;
        check_header_value("To", &self.to)?;
        check_header_value("Subject", &self.subject)?;

        let mut out = String::new();
        push_header(&mut out, "From", &self.from);
        push_header(&mut out, "To", &self.to);
        push_header(&mut out, "Subject", &encode_header_value(&self.subject));
        push_header(&mut out, "Date", &date.to_rfc2822());
        push_header(&mut out, "MIME-Version", "1.0");

        match self.template_type {
            TemplateType::Text => {
                push_header(&mut out, "Content-Type", "text/plain; charset=\"utf-8\"");
                push_header(&mut out, "Content-Transfer-Encoding", "8bit");
                out.push_str("\r\n");
                out.push_str(&crlf(&self.body));
            }
            TemplateType::Html => {
                push_header(
                    &mut out,
                    "Content-Type",
                    &format!("multipart/alternative; boundary=\"{}\"", boundary),
                );
                out.push_str("\r\n");
                push_part(&mut out, boundary, "text/plain", HTML_FALLBACK_TEXT);
                push_part(&mut out, boundary, "text/html", &self.body);
                out.push_str(&format!("--{}--\r\n", boundary));
            }
        }
        Ok(out)
    }
}

/// Rejects values that would end the header line early.
pub fn check_header_value(name: &str, value: &str) -> Result<(), EmailError> {
    if value.contains(['\r', '\n']) {
        return Err(EmailError::InvalidMessage(format!(
            "line break in {} header",
            name
        )));
    }
    Ok(())
}

fn push_header(out: &mut String, name: &str, value: &str) {
    out.push_str(name);
    out.push_str(": ");
    out.push_str(value);
    out.push_str("\r\n");
}

fn push_part(out: &mut String, boundary: &str, content_type: &str, body: &str) {
    out.push_str(&format!("--{}\r\n", boundary));
    push_header(out, "Content-Type", &format!("{}; charset=\"utf-8\"", content_type));
    push_header(out, "Content-Transfer-Encoding", "8bit");
    out.push_str("\r\n");
    out.push_str(&crlf(body));
    if !out.ends_with("\r\n") {
        out.push_str("\r\n");
    }
}

/// RFC 2047 `B` encoding for non-ASCII header values.
pub fn encode_header_value(value: &str) -> String {
    if value.is_ascii() {
        value.to_string()
    } else {
        format!("=?utf-8?B?{}?=", STANDARD.encode(value.as_bytes()))
    }
}

/// Normalizes line endings to CRLF.
pub fn crlf(text: &str) -> String {
    text.replace("\r\n", "\n").replace('\n', "\r\n")
}
