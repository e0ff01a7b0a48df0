//! Email template repository.

use sqlx::PgPool;

use domain::models::{EmailTemplate, TemplateKey};

use crate::entities::EmailTemplateEntity;
use crate::metrics::QueryTimer;

/// Repository for `pbx_email_templates`.
#[derive(Clone)]
pub struct EmailTemplateRepository {
    pool: PgPool,
}

impl EmailTemplateRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Enabled rows for `key`: the domain's own row and the global row, the
    /// domain's first.
    pub async fn candidates(&self, key: &TemplateKey) -> Result<Vec<EmailTemplate>, sqlx::Error> {
        let timer = QueryTimer::new("find_email_templates");
        let result = sqlx::query_as::<_, EmailTemplateEntity>(
            r#"
            SELECT domain_id_id AS domain_id, subject, body, "type" AS template_type
            FROM pbx_email_templates
            WHERE enabled = 'true'
              AND language = $2
              AND category = $3
              AND subcategory = $4
              AND (domain_id_id = $1 OR domain_id_id IS NULL)
            ORDER BY domain_id_id NULLS LAST
            "#,
        )
        .bind(key.domain_id)
        .bind(&key.language)
        .bind(&key.category)
        .bind(&key.subcategory)
        .fetch_all(&self.pool)
        .await;

        let rows = timer.finish(result)?;
        Ok(rows.into_iter().map(EmailTemplate::from).collect())
    }
}
