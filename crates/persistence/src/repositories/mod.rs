//! Repository implementations for database operations.

pub mod call_flow;
pub mod email_template;
pub mod setting;

pub use call_flow::CallFlowRepository;
pub use email_template::EmailTemplateRepository;
pub use setting::SettingRepository;
