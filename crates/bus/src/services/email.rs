//! Email service for missed-call notifications and sendmail relaying.
//!
//! SMTP settings are read from the `email` settings category on every send,
//! so a tenant's own server and sender address apply to its notifications.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::Local;
use tracing::{info, warn};
use uuid::Uuid;

use domain::models::TemplateKey;
use domain::services::OutgoingEmail;
use shared::placeholder;
use shared::validation::split_recipients;

use crate::error::{BusError, BusResult};
use crate::mail::{prepare_sendmail, EmailError, MailMessage, SmtpClient, SmtpSettings};
use crate::services::settings::SettingsService;

/// Message submission seam.
#[async_trait::async_trait]
pub trait Mailer: Send + Sync {
    /// Submits `data` to `recipients` through the server in `settings`.
    async fn submit(
        &self,
        settings: &SmtpSettings,
        recipients: &[String],
        data: &str,
    ) -> Result<(), EmailError>;
}

/// Mailer speaking SMTP to the configured server.
#[derive(Debug, Clone, Default)]
pub struct SmtpMailer;

#[async_trait::async_trait]
impl Mailer for SmtpMailer {
    async fn submit(
        &self,
        settings: &SmtpSettings,
        recipients: &[String],
        data: &str,
    ) -> Result<(), EmailError> {
        SmtpClient::new(settings.clone()).send(recipients, data).await
    }
}

/// One submission recorded by [`MockMailer`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmittedMail {
    pub host: String,
    pub recipients: Vec<String>,
    pub data: String,
}

/// Mock mailer for development and testing.
///
/// Records submissions instead of sending them.
#[derive(Debug, Default)]
pub struct MockMailer {
    /// Whether to simulate an SMTP rejection.
    pub simulate_failure: bool,
    submitted: Mutex<Vec<SubmittedMail>>,
}

impl MockMailer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            simulate_failure: true,
            ..Self::default()
        }
    }

    pub fn submitted(&self) -> Vec<SubmittedMail> {
        self.submitted
            .lock()
            .map(|sent| sent.clone())
            .unwrap_or_default()
    }
}

#[async_trait::async_trait]
impl Mailer for MockMailer {
    async fn submit(
        &self,
        settings: &SmtpSettings,
        recipients: &[String],
        data: &str,
    ) -> Result<(), EmailError> {
        if self.simulate_failure {
            warn!(host = %settings.host, "Mock mailer simulating failure");
            return Err(EmailError::Smtp {
                code: 554,
                text: "Simulated failure".to_string(),
            });
        }

        if let Ok(mut sent) = self.submitted.lock() {
            sent.push(SubmittedMail {
                host: settings.host.clone(),
                recipients: recipients.to_vec(),
                data: data.to_string(),
            });
        }
        Ok(())
    }
}

/// Email service for templated and relayed messages.
#[derive(Clone)]
pub struct EmailService {
    settings: SettingsService,
    mailer: Arc<dyn Mailer>,
}

impl EmailService {
    pub fn new(settings: SettingsService, mailer: Arc<dyn Mailer>) -> Self {
        Self { settings, mailer }
    }

    pub fn settings(&self) -> &SettingsService {
        &self.settings
    }

    /// Sends a rendered email with the SMTP settings of `domain_id`.
    pub async fn send(&self, domain_id: Option<Uuid>, email: &OutgoingEmail) -> BusResult<()> {
        let recipients = split_recipients(&email.recipients)?;
        let smtp = self.settings.smtp_settings(domain_id).await?;
        let data = MailMessage::new(smtp.from.clone(), email).render_now()?;

        self.mailer.submit(&smtp, &recipients, &data).await?;
        info!(
            domain_id = ?domain_id,
            recipients = recipients.len(),
            subject = %email.subject,
            template_type = %email.template_type,
            "Email sent"
        );
        Ok(())
    }

    /// Resolves the template for `key`, fills in `vars` and sends it.
    pub async fn send_template(
        &self,
        key: &TemplateKey,
        vars: &HashMap<&str, String>,
        recipients: &str,
    ) -> BusResult<()> {
        let template = self.settings.email_template(key).await?.ok_or_else(|| {
            BusError::TemplateMissing(format!(
                "{}/{} for language {}",
                key.category, key.subcategory, key.language
            ))
        })?;

        let email = OutgoingEmail {
            recipients: recipients.to_string(),
            subject: placeholder::render(&template.subject, vars),
            body: placeholder::render(&template.body, vars),
            template_type: template.template_type,
        };
        self.send(key.domain_id, &email).await
    }

    /// Relays a raw message with the default SMTP settings.
    pub async fn sendmail(
        &self,
        raw: &str,
        recipients: &[String],
        extract_recipients: bool,
    ) -> BusResult<()> {
        let smtp = self.settings.smtp_settings(None).await?;
        let prepared = prepare_sendmail(
            raw,
            &smtp.from,
            recipients,
            extract_recipients,
            Local::now().fixed_offset(),
        )?;

        self.mailer
            .submit(&smtp, &prepared.recipients, &prepared.data)
            .await?;
        info!(recipients = prepared.recipients.len(), "Message relayed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::settings::InMemorySettingsStore;
    use domain::models::{SettingScope, TemplateType};

    fn store() -> InMemorySettingsStore {
        InMemorySettingsStore::new()
            .with_setting(SettingScope::Default, "email", "smtp_host", "mail.example.com")
            .with_setting(SettingScope::Default, "email", "smtp_from", "pbx@example.com")
    }

    fn service(store: InMemorySettingsStore, mailer: Arc<MockMailer>) -> EmailService {
        EmailService::new(SettingsService::new(Arc::new(store)), mailer)
    }

    #[tokio::test]
    async fn test_send_splits_recipients() {
        let mailer = Arc::new(MockMailer::new());
        let svc = service(store(), mailer.clone());

        let email = OutgoingEmail {
            recipients: "a@example.com; b@example.com".to_string(),
            subject: "Hi".to_string(),
            body: "Body".to_string(),
            template_type: TemplateType::Text,
        };
        svc.send(None, &email).await.unwrap();

        let sent = mailer.submitted();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].host, "mail.example.com");
        assert_eq!(sent[0].recipients, vec!["a@example.com", "b@example.com"]);
        assert!(sent[0].data.contains("From: pbx@example.com\r\n"));
        assert!(sent[0].data.contains("To: a@example.com; b@example.com\r\n"));
    }

    #[tokio::test]
    async fn test_send_template_substitutes_placeholders() {
        let domain_id = Uuid::new_v4();
        let mailer = Arc::new(MockMailer::new());
        let svc = service(
            store().with_template(
                Some(domain_id),
                "en-us",
                "missed",
                "default",
                "Missed call from {caller_id_name}",
                "{caller_id_number} called {dialed_user}",
                TemplateType::Text,
            ),
            mailer.clone(),
        );

        let mut vars = HashMap::new();
        vars.insert("caller_id_name", "Alice".to_string());
        vars.insert("caller_id_number", "+15551234".to_string());
        vars.insert("dialed_user", "101".to_string());

        let key = TemplateKey::new(Some(domain_id), "en-us", "missed", "default");
        svc.send_template(&key, &vars, "ops@example.com").await.unwrap();

        let sent = mailer.submitted();
        assert!(sent[0].data.contains("Subject: Missed call from Alice\r\n"));
        assert!(sent[0].data.ends_with("+15551234 called 101"));
    }

    #[tokio::test]
    async fn test_send_template_missing() {
        let svc = service(store(), Arc::new(MockMailer::new()));
        let key = TemplateKey::new(None, "en-us", "missed", "default");
        let err = svc
            .send_template(&key, &HashMap::new(), "ops@example.com")
            .await
            .unwrap_err();
        assert!(matches!(err, BusError::TemplateMissing(_)));
    }

    #[tokio::test]
    async fn test_smtp_rejection_surfaces() {
        let svc = service(store(), Arc::new(MockMailer::failing()));
        let email = OutgoingEmail {
            recipients: "a@example.com".to_string(),
            subject: "Hi".to_string(),
            body: "Body".to_string(),
            template_type: TemplateType::Text,
        };
        let err = svc.send(None, &email).await.unwrap_err();
        assert!(matches!(err, BusError::Smtp { code: 554, .. }));
    }

    #[tokio::test]
    async fn test_sendmail_relays_with_from_rewritten() {
        let mailer = Arc::new(MockMailer::new());
        let svc = service(store(), mailer.clone());

        svc.sendmail(
            "From: root@localhost\nTo: ops@example.com\nSubject: cron\n\nok\n",
            &[],
            true,
        )
        .await
        .unwrap();

        let sent = mailer.submitted();
        assert_eq!(sent[0].recipients, vec!["ops@example.com"]);
        assert!(sent[0].data.contains("From: pbx@example.com\r\n"));
        assert!(sent[0].data.contains("X-DjangoPBX-sendmail: sendmail.py\r\n"));
        assert!(sent[0].data.contains("Date: "));
    }

    #[tokio::test]
    async fn test_sendmail_without_smtp_settings() {
        let svc = service(InMemorySettingsStore::new(), Arc::new(MockMailer::new()));
        let err = svc
            .sendmail("Subject: x\n\nbody", &["a@b".to_string()], false)
            .await
            .unwrap_err();
        assert!(matches!(err, BusError::ConfigMissing(_)));
    }
}
