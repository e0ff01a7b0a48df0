//! Email template entity.

use domain::models::{EmailTemplate, TemplateType};
use sqlx::FromRow;
use uuid::Uuid;

/// Row mapping for `pbx_email_templates`.
#[derive(Debug, Clone, FromRow)]
pub struct EmailTemplateEntity {
    pub domain_id: Option<Uuid>,
    pub subject: Option<String>,
    pub body: Option<String>,
    pub template_type: Option<String>,
}

impl From<EmailTemplateEntity> for EmailTemplate {
    fn from(entity: EmailTemplateEntity) -> Self {
        Self {
            domain_id: entity.domain_id,
            subject: entity.subject.unwrap_or_default(),
            body: entity.body.unwrap_or_default(),
            template_type: TemplateType::from_column(
                entity.template_type.as_deref().unwrap_or_default(),
            ),
        }
    }
}
