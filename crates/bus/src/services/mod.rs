//! Services wiring the domain decisions to storage, SMTP and the host.

pub mod email;
pub mod scripts;
pub mod settings;

pub use email::{EmailService, Mailer, MockMailer, SmtpMailer, SubmittedMail};
pub use scripts::{MockScriptRunner, ProcessScriptRunner, ScriptRunner};
pub use settings::{InMemorySettingsStore, PgSettingsStore, SettingsService, SettingsStore};
