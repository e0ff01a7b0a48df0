//! Typed SMTP settings built from the `email` settings category.

use shared::flag::parse_optional_flag;

use super::EmailError;

pub const DEFAULT_SMTP_PORT: u16 = 587;

/// Settings category holding the SMTP rows.
pub const EMAIL_CATEGORY: &str = "email";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmtpSettings {
    pub host: String,
    pub port: u16,
    pub from: String,
    pub user_name: Option<String>,
    pub password: Option<String>,
    /// Verify the server certificate after STARTTLS.
    pub tls_verify: bool,
}

impl SmtpSettings {
    /// Builds the settings from `(subcategory, value)` pairs.
    ///
    /// `smtp_host` and `smtp_from` are required; the port defaults to 587 and
    /// authentication is skipped without a user name. Certificates are only
    /// verified when `smtp_tls_verify` is `true`.
    pub fn from_pairs(pairs: &[(String, String)]) -> Result<Self, EmailError> {
        let value = |name: &str| {
            pairs
                .iter()
                .find(|(k, _)| k == name)
                .map(|(_, v)| v.trim())
                .filter(|v| !v.is_empty())
        };

        let host = value("smtp_host")
            .ok_or_else(|| EmailError::NotConfigured("smtp_host".to_string()))?
            .to_string();
        let from = value("smtp_from")
            .ok_or_else(|| EmailError::NotConfigured("smtp_from".to_string()))?
            .to_string();
        let port = match value("smtp_port") {
            Some(port) => port
                .parse()
                .map_err(|_| EmailError::NotConfigured(format!("smtp_port {:?}", port)))?,
            None => DEFAULT_SMTP_PORT,
        };

        Ok(Self {
            host,
            port,
            from,
            user_name: value("smtp_user_name").map(String::from),
            password: value("smtp_password").map(String::from),
            tls_verify: parse_optional_flag(value("smtp_tls_verify")),
        })
    }

    /// `(user, password)` when authentication is configured.
    pub fn credentials(&self) -> Option<(&str, &str)> {
        self.user_name
            .as_deref()
            .map(|user| (user, self.password.as_deref().unwrap_or_default()))
    }
}
