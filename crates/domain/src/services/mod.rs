//! Domain services for the switch integration bus.
//!
//! Services contain business logic that operates on domain models.

pub mod failure;
pub mod firewall;
pub mod hangup;
pub mod hook;
pub mod presence;
pub mod settings_resolution;

pub use failure::{handle_failure, Disposition, FailureOutcome};
pub use firewall::{plan_command, FirewallCommand, FirewallPlan, Skip};
pub use hangup::{missed_call, missed_call_actions, render_missed_call, MissedCall};
pub use hook::{email_count, HookAction, LogLevel, OutgoingEmail};
pub use presence::presence_command;
pub use settings_resolution::{
    cascade_scopes, overlay_rows, resolve_setting, single_scope, ResolvedSetting, SettingSource,
};
