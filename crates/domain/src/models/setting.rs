//! Setting domain models for the default, domain and user settings tables.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Value type column of the settings tables.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    #[default]
    Text,
    Numeric,
    Array,
    Boolean,
    Code,
    Uuid,
    Name,
    Var,
    Dir,
}

impl ValueType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValueType::Text => "text",
            ValueType::Numeric => "numeric",
            ValueType::Array => "array",
            ValueType::Boolean => "boolean",
            ValueType::Code => "code",
            ValueType::Uuid => "uuid",
            ValueType::Name => "name",
            ValueType::Var => "var",
            ValueType::Dir => "dir",
        }
    }
}

impl std::fmt::Display for ValueType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ValueType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "text" => Ok(ValueType::Text),
            "numeric" => Ok(ValueType::Numeric),
            "array" => Ok(ValueType::Array),
            "boolean" => Ok(ValueType::Boolean),
            "code" => Ok(ValueType::Code),
            "uuid" => Ok(ValueType::Uuid),
            "name" => Ok(ValueType::Name),
            "var" => Ok(ValueType::Var),
            "dir" => Ok(ValueType::Dir),
            other => Err(format!("unknown value type: {}", other)),
        }
    }
}

/// Scope level of a lookup. Higher levels also consult the lower ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SettingLevel {
    Default = 1,
    Domain = 2,
    User = 3,
}

/// Which table a lookup reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingScope {
    Default,
    Domain(Uuid),
    User(Uuid),
}

impl std::fmt::Display for SettingScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SettingScope::Default => write!(f, "default"),
            SettingScope::Domain(id) => write!(f, "domain:{}", id),
            SettingScope::User(id) => write!(f, "user:{}", id),
        }
    }
}

/// Selection criteria shared by all three settings tables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettingQuery {
    pub category: String,
    pub subcategory: Option<String>,
    /// `None` matches rows of any value type.
    pub value_type: Option<ValueType>,
}

impl SettingQuery {
    /// A lookup of every text-typed subcategory in `category`.
    pub fn new(category: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            subcategory: None,
            value_type: Some(ValueType::Text),
        }
    }

    pub fn subcategory(mut self, subcategory: impl Into<String>) -> Self {
        self.subcategory = Some(subcategory.into());
        self
    }

    pub fn value_type(mut self, value_type: ValueType) -> Self {
        self.value_type = Some(value_type);
        self
    }

    pub fn any_type(mut self) -> Self {
        self.value_type = None;
        self
    }
}

/// One enabled row of a settings table, already ordered by sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettingRow {
    pub subcategory: String,
    pub value: String,
}

impl SettingRow {
    pub fn new(subcategory: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            subcategory: subcategory.into(),
            value: value.into(),
        }
    }
}

/// Result of a settings lookup.
///
/// A lookup naming a subcategory yields the list of its values; a lookup of a
/// whole category yields `(subcategory, value)` pairs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum SettingValues {
    Values(Vec<String>),
    Pairs(Vec<(String, String)>),
}

impl SettingValues {
    /// Shapes raw rows according to the query.
    pub fn from_rows(query: &SettingQuery, rows: Vec<SettingRow>) -> Self {
        if query.subcategory.is_some() {
            SettingValues::Values(rows.into_iter().map(|r| r.value).collect())
        } else {
            SettingValues::Pairs(rows.into_iter().map(|r| (r.subcategory, r.value)).collect())
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            SettingValues::Values(v) => v.is_empty(),
            SettingValues::Pairs(p) => p.is_empty(),
        }
    }

    /// First value of a single-subcategory lookup.
    pub fn first(&self) -> Option<&str> {
        match self {
            SettingValues::Values(v) => v.first().map(String::as_str),
            SettingValues::Pairs(p) => p.first().map(|(_, v)| v.as_str()),
        }
    }

    /// Value of `subcategory` in a whole-category lookup.
    pub fn get(&self, subcategory: &str) -> Option<&str> {
        match self {
            SettingValues::Values(_) => None,
            SettingValues::Pairs(p) => p
                .iter()
                .find(|(k, _)| k == subcategory)
                .map(|(_, v)| v.as_str()),
        }
    }
}
