//! Email template domain models.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Body format of a stored template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TemplateType {
    Html,
    Text,
}

impl TemplateType {
    /// Anything other than `html` is sent as plain text.
    pub fn from_column(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("html") {
            TemplateType::Html
        } else {
            TemplateType::Text
        }
    }
}

impl std::fmt::Display for TemplateType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TemplateType::Html => write!(f, "html"),
            TemplateType::Text => write!(f, "text"),
        }
    }
}

/// Key used to look a template up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateKey {
    pub domain_id: Option<Uuid>,
    /// `{language}-{dialect}`, e.g. `en-gb`.
    pub language: String,
    pub category: String,
    pub subcategory: String,
}

impl TemplateKey {
    pub fn new(
        domain_id: Option<Uuid>,
        language: impl Into<String>,
        category: impl Into<String>,
        subcategory: impl Into<String>,
    ) -> Self {
        Self {
            domain_id,
            language: language.into(),
            category: category.into(),
            subcategory: subcategory.into(),
        }
    }
}

/// A candidate row for a template lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailTemplate {
    /// `None` for the global fallback row.
    pub domain_id: Option<Uuid>,
    pub subject: String,
    pub body: String,
    pub template_type: TemplateType,
}

/// The `(subject, body, type)` triple handed to the mailer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedTemplate {
    pub subject: String,
    pub body: String,
    pub template_type: TemplateType,
}

impl From<EmailTemplate> for ResolvedTemplate {
    fn from(t: EmailTemplate) -> Self {
        Self {
            subject: t.subject,
            body: t.body,
            template_type: t.template_type,
        }
    }
}

/// Picks the template for `domain_id` among rows matching the other key parts.
///
/// A row belonging to the domain always beats the global (null-domain) row.
/// Rows of other domains are never returned.
pub fn select_template(
    candidates: Vec<EmailTemplate>,
    domain_id: Option<Uuid>,
) -> Option<ResolvedTemplate> {
    let mut fallback = None;
    for candidate in candidates {
        match candidate.domain_id {
            Some(id) if Some(id) == domain_id => return Some(candidate.into()),
            None if fallback.is_none() => fallback = Some(candidate),
            _ => {}
        }
    }
    fallback.map(Into::into)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(domain_id: Option<Uuid>, subject: &str) -> EmailTemplate {
        EmailTemplate {
            domain_id,
            subject: subject.to_string(),
            body: "body".to_string(),
            template_type: TemplateType::Text,
        }
    }

    #[test]
    fn test_template_type_from_column() {
        assert_eq!(TemplateType::from_column("html"), TemplateType::Html);
        assert_eq!(TemplateType::from_column("HTML"), TemplateType::Html);
        assert_eq!(TemplateType::from_column("text"), TemplateType::Text);
        assert_eq!(TemplateType::from_column(""), TemplateType::Text);
    }

    #[test]
    fn test_select_falls_back_to_global_row() {
        let d1 = Uuid::new_v4();
        let selected = select_template(vec![row(None, "global")], Some(d1)).unwrap();
        assert_eq!(selected.subject, "global");
    }

    #[test]
    fn test_select_prefers_domain_row_regardless_of_order() {
        let d1 = Uuid::new_v4();
        let selected =
            select_template(vec![row(None, "global"), row(Some(d1), "tenant")], Some(d1))
                .unwrap();
        assert_eq!(selected.subject, "tenant");

        let selected =
            select_template(vec![row(Some(d1), "tenant"), row(None, "global")], Some(d1))
                .unwrap();
        assert_eq!(selected.subject, "tenant");
    }

    #[test]
    fn test_select_ignores_other_domains() {
        let d1 = Uuid::new_v4();
        let d2 = Uuid::new_v4();
        assert!(select_template(vec![row(Some(d2), "other")], Some(d1)).is_none());
        assert!(select_template(vec![], Some(d1)).is_none());
    }

    #[test]
    fn test_select_without_domain_uses_global() {
        let d2 = Uuid::new_v4();
        let selected =
            select_template(vec![row(Some(d2), "other"), row(None, "global")], None).unwrap();
        assert_eq!(selected.subject, "global");
    }
}
