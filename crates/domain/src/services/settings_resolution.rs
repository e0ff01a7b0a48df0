//! Settings resolution across the user, domain and default scopes.
//!
//! Lookup order for a level-3 lookup:
//! 1. User settings
//! 2. Domain settings
//! 3. Default settings
//! 4. The caller-supplied default value (when requested)
//!
//! The first scope yielding at least one enabled row wins; scopes are never
//! merged for list lookups.

use serde::Serialize;
use uuid::Uuid;

use crate::models::{SettingLevel, SettingRow, SettingScope, SettingValues};

/// Where a resolved value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SettingSource {
    User,
    Domain,
    Default,
    DefaultValue,
}

impl std::fmt::Display for SettingSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::User => write!(f, "user"),
            Self::Domain => write!(f, "domain"),
            Self::Default => write!(f, "default"),
            Self::DefaultValue => write!(f, "default_value"),
        }
    }
}

impl From<SettingScope> for SettingSource {
    fn from(scope: SettingScope) -> Self {
        match scope {
            SettingScope::User(_) => SettingSource::User,
            SettingScope::Domain(_) => SettingSource::Domain,
            SettingScope::Default => SettingSource::Default,
        }
    }
}

/// A lookup result with its origin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedSetting {
    pub values: SettingValues,
    pub source: SettingSource,
}

/// Scopes consulted for a lookup at `level`, most specific first.
///
/// The user scope needs a user id and level 3; the domain scope needs a domain
/// id and level 2 or more. The default scope is always consulted.
pub fn cascade_scopes(
    level: SettingLevel,
    user_id: Option<Uuid>,
    domain_id: Option<Uuid>,
) -> Vec<SettingScope> {
    let mut scopes = Vec::with_capacity(3);
    if level >= SettingLevel::User {
        if let Some(id) = user_id {
            scopes.push(SettingScope::User(id));
        }
    }
    if level >= SettingLevel::Domain {
        if let Some(id) = domain_id {
            scopes.push(SettingScope::Domain(id));
        }
    }
    scopes.push(SettingScope::Default);
    scopes
}

/// Applies the "use default" rule to the rows of a single scope.
///
/// Returns the shaped rows when there are any, otherwise the singleton list
/// `[fallback]` if a fallback is given, otherwise `None` (absent).
pub fn single_scope(values: SettingValues, fallback: Option<&str>) -> Option<SettingValues> {
    if !values.is_empty() {
        Some(values)
    } else {
        fallback.map(|v| SettingValues::Values(vec![v.to_string()]))
    }
}

/// Resolves a lookup from per-scope results given in cascade order.
///
/// Scopes that were not queried can simply be left out.
pub fn resolve_setting(
    results: impl IntoIterator<Item = (SettingScope, SettingValues)>,
    fallback: Option<&str>,
) -> Option<ResolvedSetting> {
    for (scope, values) in results {
        if !values.is_empty() {
            return Some(ResolvedSetting {
                values,
                source: scope.into(),
            });
        }
    }

    fallback.map(|v| ResolvedSetting {
        values: SettingValues::Values(vec![v.to_string()]),
        source: SettingSource::DefaultValue,
    })
}

/// Overlays whole-category rows: a more specific scope replaces every value of
/// a subcategory it defines, other subcategories keep the broader value.
///
/// `layers` are given broadest first (default, then domain, then user).
pub fn overlay_rows(layers: Vec<Vec<SettingRow>>) -> Vec<(String, String)> {
    let mut merged: Vec<(String, String)> = Vec::new();
    for layer in layers {
        let mut overridden: Vec<String> = Vec::new();
        for row in layer {
            if !overridden.contains(&row.subcategory) {
                merged.retain(|(k, _)| *k != row.subcategory);
                overridden.push(row.subcategory.clone());
            }
            merged.push((row.subcategory, row.value));
        }
    }
    merged
}
