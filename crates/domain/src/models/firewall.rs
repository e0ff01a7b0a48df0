//! Firewall events published by the switch on `TAP.Firewall`.

use serde::Deserialize;

/// Event name carried by firewall events.
pub const FIREWALL_EVENT_NAME: &str = "FIREWALL";

/// Address family used when an event omits `IP-Type`.
pub const DEFAULT_IP_TYPE: &str = "ipv4";

/// List used when an event omits `Fw-List`.
pub const DEFAULT_FW_LIST: &str = "sip-customer";

/// Address used when an event omits `IP-Address`.
pub const DEFAULT_IP_ADDRESS: &str = "192.168.42.1";

/// Firewall event payload. Every field is optional on the wire.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct FirewallEvent {
    #[serde(rename = "Event-Name", default)]
    pub event_name: Option<String>,
    #[serde(rename = "Action", default)]
    pub action: Option<String>,
    #[serde(rename = "IP-Type", default)]
    pub ip_type: Option<String>,
    #[serde(rename = "Fw-List", default)]
    pub fw_list: Option<String>,
    #[serde(rename = "IP-Address", default)]
    pub ip_address: Option<String>,
}

/// Supported firewall actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FirewallAction {
    Add,
    Delete,
    Save,
}

impl FirewallAction {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "add" => Some(FirewallAction::Add),
            "delete" => Some(FirewallAction::Delete),
            "save" => Some(FirewallAction::Save),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FirewallAction::Add => "add",
            FirewallAction::Delete => "delete",
            FirewallAction::Save => "save",
        }
    }
}

impl FirewallEvent {
    pub fn is_firewall(&self) -> bool {
        self.event_name.as_deref() == Some(FIREWALL_EVENT_NAME)
    }

    pub fn ip_type(&self) -> &str {
        self.ip_type.as_deref().unwrap_or(DEFAULT_IP_TYPE)
    }

    pub fn fw_list(&self) -> &str {
        self.fw_list.as_deref().unwrap_or(DEFAULT_FW_LIST)
    }

    pub fn ip_address(&self) -> &str {
        self.ip_address.as_deref().unwrap_or(DEFAULT_IP_ADDRESS)
    }
}
