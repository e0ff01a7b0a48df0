//! Minimal SMTP submission client with opportunistic STARTTLS.

use std::sync::Arc;
use std::time::SystemTime;

use base64::{engine::general_purpose::STANDARD, Engine};
use rustls::client::{ServerCertVerified, ServerCertVerifier};
use rustls::{Certificate, ServerName};
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufStream};
use tokio::net::TcpStream;
use tokio_rustls::TlsConnector;
use tracing::{debug, info, warn};

use super::{EmailError, SmtpSettings};

/// Any byte stream an SMTP session can run over.
pub trait AsyncStream: AsyncRead + AsyncWrite + Unpin + Send {}

impl<T: AsyncRead + AsyncWrite + Unpin + Send> AsyncStream for T {}

type Stream = BufStream<Box<dyn AsyncStream>>;

/// One server reply, possibly spanning several lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub code: u16,
    pub lines: Vec<String>,
}

impl Reply {
    pub fn text(&self) -> String {
        self.lines.join(" ")
    }

    fn into_error(self) -> EmailError {
        EmailError::Smtp {
            code: self.code,
            text: self.text(),
        }
    }
}

/// Sends messages through the configured SMTP server.
#[derive(Clone)]
pub struct SmtpClient {
    settings: SmtpSettings,
    helo_name: String,
    tls: TlsConnector,
}

impl SmtpClient {
    pub fn new(settings: SmtpSettings) -> Self {
        let helo_name = hostname::get()
            .ok()
            .and_then(|h| h.into_string().ok())
            .unwrap_or_else(|| "localhost".to_string());
        let tls = tls_connector(settings.tls_verify);
        Self {
            settings,
            helo_name,
            tls,
        }
    }

    pub fn with_helo_name(mut self, helo_name: impl Into<String>) -> Self {
        self.helo_name = helo_name.into();
        self
    }

    pub fn settings(&self) -> &SmtpSettings {
        &self.settings
    }

    /// Connects to the server and submits `data` to `recipients`.
    pub async fn send(&self, recipients: &[String], data: &str) -> Result<(), EmailError> {
        let stream =
            TcpStream::connect((self.settings.host.as_str(), self.settings.port)).await?;
        debug!(host = %self.settings.host, port = self.settings.port, "SMTP connected");
        self.send_over(stream, recipients, data).await
    }

    /// Runs a whole session over `stream`, closing it on every exit path.
    pub async fn send_over<S>(
        &self,
        stream: S,
        recipients: &[String],
        data: &str,
    ) -> Result<(), EmailError>
    where
        S: AsyncStream + 'static,
    {
        if recipients.is_empty() {
            return Err(EmailError::NoRecipients);
        }

        let mut session = Session {
            stream: Some(BufStream::new(Box::new(stream))),
        };
        let result = self.deliver(&mut session, recipients, data).await;
        session.close().await;

        match &result {
            Ok(()) => info!(
                host = %self.settings.host,
                recipients = recipients.len(),
                "Email submitted"
            ),
            Err(e) => warn!(host = %self.settings.host, error = %e, "Email submission failed"),
        }
        result
    }

    async fn deliver(
        &self,
        session: &mut Session,
        recipients: &[String],
        data: &str,
    ) -> Result<(), EmailError> {
        session.expect(&[220]).await?;
        let mut extensions = session.ehlo(&self.helo_name).await?;

        let reply = session.command("STARTTLS").await?;
        if reply.code == 220 {
            session.upgrade(&self.tls, &self.settings.host).await?;
            extensions = session.ehlo(&self.helo_name).await?;
        } else {
            warn!(
                code = reply.code,
                text = %reply.text(),
                "STARTTLS refused, continuing without TLS"
            );
        }

        if let Some((user, password)) = self.settings.credentials() {
            session.authenticate(&extensions, user, password).await?;
        }

        session
            .command_expect(&format!("MAIL FROM:<{}>", self.settings.from), &[250])
            .await?;
        for recipient in recipients {
            session
                .command_expect(&format!("RCPT TO:<{}>", recipient), &[250, 251])
                .await?;
        }
        session.command_expect("DATA", &[354]).await?;
        session.write_data(data).await?;
        session.expect(&[250]).await?;

        // The message is accepted at this point; a failed QUIT changes nothing.
        if let Err(e) = session.command("QUIT").await {
            debug!(error = %e, "QUIT failed");
        }
        Ok(())
    }
}

struct Session {
    stream: Option<Stream>,
}

impl Session {
    fn stream(&mut self) -> Result<&mut Stream, EmailError> {
        self.stream
            .as_mut()
            .ok_or_else(|| EmailError::Protocol("session already closed".to_string()))
    }

    async fn read_reply(&mut self) -> Result<Reply, EmailError> {
        let stream = self.stream()?;
        let mut lines = Vec::new();
        loop {
            let mut line = String::new();
            if stream.read_line(&mut line).await? == 0 {
                return Err(EmailError::Protocol("connection closed".to_string()));
            }
            let line = line.trim_end_matches(['\r', '\n']);
            if line.len() < 3 || !line.is_char_boundary(3) {
                return Err(EmailError::Protocol(format!("short reply line {:?}", line)));
            }
            let code: u16 = line[..3]
                .parse()
                .map_err(|_| EmailError::Protocol(format!("bad reply code in {:?}", line)))?;
            let rest = &line[3..];
            lines.push(rest.get(1..).unwrap_or_default().to_string());
            if !rest.starts_with('-') {
                return Ok(Reply { code, lines });
            }
        }
    }

    async fn expect(&mut self, codes: &[u16]) -> Result<Reply, EmailError> {
        let reply = self.read_reply().await?;
        if codes.contains(&reply.code) {
            Ok(reply)
        } else {
            Err(reply.into_error())
        }
    }

    async fn write_line(&mut self, line: &str) -> Result<(), EmailError> {
        let stream = self.stream()?;
        stream.write_all(line.as_bytes()).await?;
        stream.write_all(b"\r\n").await?;
        stream.flush().await?;
        Ok(())
    }

    async fn command(&mut self, line: &str) -> Result<Reply, EmailError> {
        self.write_line(line).await?;
        self.read_reply().await
    }

    async fn command_expect(&mut self, line: &str, codes: &[u16]) -> Result<Reply, EmailError> {
        self.write_line(line).await?;
        self.expect(codes).await
    }

    /// Sends EHLO and returns the advertised extensions.
    async fn ehlo(&mut self, helo_name: &str) -> Result<Vec<String>, EmailError> {
        let reply = self
            .command_expect(&format!("EHLO {}", helo_name), &[250])
            .await?;
        Ok(reply.lines.into_iter().skip(1).collect())
    }

    async fn upgrade(&mut self, tls: &TlsConnector, host: &str) -> Result<(), EmailError> {
        let plain = self
            .stream
            .take()
            .ok_or_else(|| EmailError::Protocol("session already closed".to_string()))?
            .into_inner();
        let server_name = ServerName::try_from(host)
            .map_err(|e| EmailError::Tls(format!("invalid server name {:?}: {}", host, e)))?;
        let secured = tls
            .connect(server_name, plain)
            .await
            .map_err(|e| EmailError::Tls(e.to_string()))?;
        debug!(host = %host, "STARTTLS negotiated");
        self.stream = Some(BufStream::new(Box::new(secured)));
        Ok(())
    }

    /// AUTH PLAIN when offered, LOGIN otherwise.
    async fn authenticate(
        &mut self,
        extensions: &[String],
        user: &str,
        password: &str,
    ) -> Result<(), EmailError> {
        let mechanisms: Vec<String> = extensions
            .iter()
            .filter_map(|e| {
                let upper = e.to_ascii_uppercase();
                upper
                    .strip_prefix("AUTH ")
                    .or_else(|| upper.strip_prefix("AUTH="))
                    .map(|m| m.to_string())
            })
            .flat_map(|m| m.split_whitespace().map(String::from).collect::<Vec<_>>())
            .collect();

        if mechanisms.is_empty() {
            return Err(EmailError::Protocol(
                "server does not offer authentication".to_string(),
            ));
        }

        if mechanisms.iter().any(|m| m == "PLAIN") {
            let token = STANDARD.encode(format!("\0{}\0{}", user, password));
            self.command_expect(&format!("AUTH PLAIN {}", token), &[235])
                .await?;
        } else {
            self.command_expect("AUTH LOGIN", &[334]).await?;
            self.command_expect(&STANDARD.encode(user), &[334]).await?;
            self.command_expect(&STANDARD.encode(password), &[235])
                .await?;
        }
        debug!(user = %user, "SMTP authenticated");
        Ok(())
    }

    /// Writes the message body, dot-stuffed and terminated by `.`.
    async fn write_data(&mut self, data: &str) -> Result<(), EmailError> {
        let stuffed = dot_stuff(data);
        let stream = self.stream()?;
        stream.write_all(stuffed.as_bytes()).await?;
        if !stuffed.ends_with("\r\n") {
            stream.write_all(b"\r\n").await?;
        }
        stream.write_all(b".\r\n").await?;
        stream.flush().await?;
        Ok(())
    }

    async fn close(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            if let Err(e) = stream.shutdown().await {
                debug!(error = %e, "SMTP shutdown failed");
            }
        }
    }
}

/// CRLF-normalizes `data` and doubles leading dots.
pub fn dot_stuff(data: &str) -> String {
    super::message::crlf(data)
        .split("\r\n")
        .map(|line| {
            if line.starts_with('.') {
                format!(".{}", line)
            } else {
                line.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join("\r\n")
}

/// Accepts any server certificate, as relays commonly present self-signed
/// or IP-only certificates.
struct AcceptAnyServerCert;

impl ServerCertVerifier for AcceptAnyServerCert {
    fn verify_server_cert(
        &self,
        _end_entity: &Certificate,
        _intermediates: &[Certificate],
        _server_name: &ServerName,
        _scts: &mut dyn Iterator<Item = &[u8]>,
        _ocsp_response: &[u8],
        _now: SystemTime,
    ) -> Result<ServerCertVerified, rustls::Error> {
        Ok(ServerCertVerified::assertion())
    }
}

/// Connector for STARTTLS; checks certificates against the webpki roots only
/// when `verify` is set.
fn tls_connector(verify: bool) -> TlsConnector {
    if !verify {
        let config = rustls::ClientConfig::builder()
            .with_safe_defaults()
            .with_custom_certificate_verifier(Arc::new(AcceptAnyServerCert))
            .with_no_client_auth();
        return TlsConnector::from(Arc::new(config));
    }

    let mut roots = rustls::RootCertStore::empty();
    roots.add_trust_anchors(webpki_roots::TLS_SERVER_ROOTS.iter().map(|ta| {
        rustls::OwnedTrustAnchor::from_subject_spki_name_constraints(
            ta.subject,
            ta.spki,
            ta.name_constraints,
        )
    }));
    let config = rustls::ClientConfig::builder()
        .with_safe_defaults()
        .with_root_certificates(roots)
        .with_no_client_auth();
    TlsConnector::from(Arc::new(config))
}
