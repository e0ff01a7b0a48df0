//! Database entity definitions.
//!
//! Entities are direct mappings to database rows.

pub mod call_flow;
pub mod email_template;
pub mod setting;

pub use call_flow::CallFlowEntity;
pub use email_template::EmailTemplateEntity;
pub use setting::SettingEntity;
