//! Call-session attributes handed to switch hooks.

use serde::Serialize;
use std::collections::HashMap;

/// Channel variable and header names read by the hooks.
pub mod vars {
    pub const UUID: &str = "uuid";
    pub const DOMAIN_UUID: &str = "domain_uuid";
    pub const CALL_DIRECTION: &str = "call_direction";
    pub const CALLER_ID_NAME: &str = "caller_id_name";
    pub const CALLER_ID_NUMBER: &str = "caller_id_number";
    pub const EFFECTIVE_CALLER_ID_NAME: &str = "effective_caller_id_name";
    pub const CALLER_HEADER_ID_NAME: &str = "Caller-Caller-ID-Name";
    pub const CALLER_HEADER_ID_NUMBER: &str = "Caller-Caller-ID-Number";
    pub const ORIGINATE_DISPOSITION: &str = "originate_disposition";
    pub const ORIGINATE_CAUSES: &str = "originate_causes";
    pub const LAST_BRIDGE_HANGUP_CAUSE: &str = "last_bridge_proto_specific_hangup_cause";
    pub const SIP_TO_USER: &str = "sip_to_user";
    pub const DIALED_USER: &str = "dialed_user";
    pub const MISSED_CALL_APP: &str = "missed_call_app";
    pub const MISSED_CALL_DATA: &str = "missed_call_data";
    pub const DEFAULT_LANGUAGE: &str = "default_language";
    pub const DEFAULT_DIALECT: &str = "default_dialect";
}

/// Per-call key/value bag presented by the switch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SessionAttributes {
    values: HashMap<String, String>,
}

impl SessionAttributes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    /// Like [`get`](Self::get), treating empty values as unset.
    pub fn get_non_empty(&self, name: &str) -> Option<&str> {
        self.get(name).filter(|v| !v.is_empty())
    }

    /// First non-empty value among `names`.
    pub fn first_of(&self, names: &[&str]) -> Option<&str> {
        names.iter().find_map(|n| self.get_non_empty(n))
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.values.insert(name.into(), value.into());
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for SessionAttributes
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}
