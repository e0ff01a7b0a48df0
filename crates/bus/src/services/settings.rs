//! Settings service: user → domain → default lookups and email templates.

use std::sync::Arc;

use uuid::Uuid;

use domain::models::{
    select_template, EmailTemplate, ResolvedTemplate, SettingLevel, SettingQuery, SettingRow,
    SettingScope, SettingValues, TemplateKey, TemplateType, ValueType,
};
use domain::services::{cascade_scopes, overlay_rows, resolve_setting, single_scope, ResolvedSetting};
use persistence::db::Database;
use persistence::repositories::{EmailTemplateRepository, SettingRepository};

use crate::error::BusResult;
use crate::mail::settings::EMAIL_CATEGORY;
use crate::mail::SmtpSettings;

/// Read access to the settings and template tables.
#[async_trait::async_trait]
pub trait SettingsStore: Send + Sync {
    /// Enabled rows of one scope, ordered by sequence.
    async fn rows(&self, scope: SettingScope, query: &SettingQuery) -> BusResult<Vec<SettingRow>>;

    /// Template rows that may answer `key`.
    async fn template_candidates(&self, key: &TemplateKey) -> BusResult<Vec<EmailTemplate>>;
}

/// Store backed by the shared PostgreSQL database.
#[derive(Clone)]
pub struct PgSettingsStore {
    settings: SettingRepository,
    templates: EmailTemplateRepository,
}

impl PgSettingsStore {
    pub fn new(db: &Database) -> Self {
        Self {
            settings: SettingRepository::new(db.pool().clone()),
            templates: EmailTemplateRepository::new(db.pool().clone()),
        }
    }
}

#[async_trait::async_trait]
impl SettingsStore for PgSettingsStore {
    async fn rows(&self, scope: SettingScope, query: &SettingQuery) -> BusResult<Vec<SettingRow>> {
        Ok(self.settings.find(scope, query).await?)
    }

    async fn template_candidates(&self, key: &TemplateKey) -> BusResult<Vec<EmailTemplate>> {
        Ok(self.templates.candidates(key).await?)
    }
}

#[derive(Debug, Clone)]
struct StoredSetting {
    scope: SettingScope,
    category: String,
    subcategory: String,
    value_type: ValueType,
    value: String,
    enabled: bool,
}

#[derive(Debug, Clone)]
struct StoredTemplate {
    language: String,
    category: String,
    subcategory: String,
    template: EmailTemplate,
}

/// In-memory store for development and testing.
///
/// Rows keep insertion order, which stands in for the sequence column.
#[derive(Debug, Clone, Default)]
pub struct InMemorySettingsStore {
    settings: Vec<StoredSetting>,
    templates: Vec<StoredTemplate>,
}

impl InMemorySettingsStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an enabled text setting.
    pub fn with_setting(
        self,
        scope: SettingScope,
        category: &str,
        subcategory: &str,
        value: &str,
    ) -> Self {
        self.with_typed_setting(scope, category, subcategory, ValueType::Text, value, true)
    }

    pub fn with_typed_setting(
        mut self,
        scope: SettingScope,
        category: &str,
        subcategory: &str,
        value_type: ValueType,
        value: &str,
        enabled: bool,
    ) -> Self {
        self.settings.push(StoredSetting {
            scope,
            category: category.to_string(),
            subcategory: subcategory.to_string(),
            value_type,
            value: value.to_string(),
            enabled,
        });
        self
    }

    #[allow(clippy::too_many_arguments)]
    pub fn with_template(
        mut self,
        domain_id: Option<Uuid>,
        language: &str,
        category: &str,
        subcategory: &str,
        subject: &str,
        body: &str,
        template_type: TemplateType,
    ) -> Self {
        self.templates.push(StoredTemplate {
            language: language.to_string(),
            category: category.to_string(),
            subcategory: subcategory.to_string(),
            template: EmailTemplate {
                domain_id,
                subject: subject.to_string(),
                body: body.to_string(),
                template_type,
            },
        });
        self
    }
}

#[async_trait::async_trait]
impl SettingsStore for InMemorySettingsStore {
    async fn rows(&self, scope: SettingScope, query: &SettingQuery) -> BusResult<Vec<SettingRow>> {
        Ok(self
            .settings
            .iter()
            .filter(|s| s.enabled && s.scope == scope && s.category == query.category)
            .filter(|s| query.subcategory.as_ref().map_or(true, |sub| *sub == s.subcategory))
            .filter(|s| query.value_type.map_or(true, |vt| vt == s.value_type))
            .map(|s| SettingRow::new(s.subcategory.clone(), s.value.clone()))
            .collect())
    }

    async fn template_candidates(&self, key: &TemplateKey) -> BusResult<Vec<EmailTemplate>> {
        Ok(self
            .templates
            .iter()
            .filter(|t| {
                t.language == key.language
                    && t.category == key.category
                    && t.subcategory == key.subcategory
                    && (t.template.domain_id.is_none() || t.template.domain_id == key.domain_id)
            })
            .map(|t| t.template.clone())
            .collect())
    }
}

/// Hierarchical settings lookups.
#[derive(Clone)]
pub struct SettingsService {
    store: Arc<dyn SettingsStore>,
}

impl SettingsService {
    pub fn new(store: Arc<dyn SettingsStore>) -> Self {
        Self { store }
    }

    pub fn from_database(db: &Database) -> Self {
        Self::new(Arc::new(PgSettingsStore::new(db)))
    }

    /// Default-scope lookup. With `fallback`, an empty result becomes
    /// `[fallback]`; without, it is absent.
    pub async fn default_settings(
        &self,
        query: &SettingQuery,
        fallback: Option<&str>,
    ) -> BusResult<Option<SettingValues>> {
        self.scope_settings(SettingScope::Default, query, fallback).await
    }

    pub async fn domain_settings(
        &self,
        domain_id: Uuid,
        query: &SettingQuery,
        fallback: Option<&str>,
    ) -> BusResult<Option<SettingValues>> {
        self.scope_settings(SettingScope::Domain(domain_id), query, fallback)
            .await
    }

    pub async fn user_settings(
        &self,
        user_id: Uuid,
        query: &SettingQuery,
        fallback: Option<&str>,
    ) -> BusResult<Option<SettingValues>> {
        self.scope_settings(SettingScope::User(user_id), query, fallback)
            .await
    }

    async fn scope_settings(
        &self,
        scope: SettingScope,
        query: &SettingQuery,
        fallback: Option<&str>,
    ) -> BusResult<Option<SettingValues>> {
        let rows = self.store.rows(scope, query).await?;
        Ok(single_scope(SettingValues::from_rows(query, rows), fallback))
    }

    /// Cascading lookup: user (level 3), then domain (level 2 and up), then
    /// default. The first scope with rows wins; later scopes are not queried.
    pub async fn settings(
        &self,
        query: &SettingQuery,
        level: SettingLevel,
        user_id: Option<Uuid>,
        domain_id: Option<Uuid>,
        fallback: Option<&str>,
    ) -> BusResult<Option<ResolvedSetting>> {
        for scope in cascade_scopes(level, user_id, domain_id) {
            let rows = self.store.rows(scope, query).await?;
            let values = SettingValues::from_rows(query, rows);
            if let Some(resolved) = resolve_setting([(scope, values)], None) {
                tracing::debug!(
                    category = %query.category,
                    subcategory = ?query.subcategory,
                    source = %resolved.source,
                    "Setting resolved"
                );
                return Ok(Some(resolved));
            }
        }
        Ok(resolve_setting(std::iter::empty(), fallback))
    }

    /// The template for `key`, the domain's own row preferred over the global one.
    pub async fn email_template(&self, key: &TemplateKey) -> BusResult<Option<ResolvedTemplate>> {
        let candidates = self.store.template_candidates(key).await?;
        Ok(select_template(candidates, key.domain_id))
    }

    /// SMTP settings for `domain_id`, domain rows overriding default rows.
    pub async fn smtp_settings(&self, domain_id: Option<Uuid>) -> BusResult<SmtpSettings> {
        let query = SettingQuery::new(EMAIL_CATEGORY).any_type();
        let mut layers = vec![self.store.rows(SettingScope::Default, &query).await?];
        if let Some(domain_id) = domain_id {
            layers.push(self.store.rows(SettingScope::Domain(domain_id), &query).await?);
        }
        Ok(SmtpSettings::from_pairs(&overlay_rows(layers))?)
    }
}
