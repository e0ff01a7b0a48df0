//! Domain models.

pub mod call_flow;
pub mod email_template;
pub mod firewall;
pub mod session;
pub mod setting;

pub use call_flow::{CallFlow, PresenceState};
pub use email_template::{
    select_template, EmailTemplate, ResolvedTemplate, TemplateKey, TemplateType,
};
pub use firewall::{FirewallAction, FirewallEvent};
pub use session::{vars, SessionAttributes};
pub use setting::{
    SettingLevel, SettingQuery, SettingRow, SettingScope, SettingValues, ValueType,
};
