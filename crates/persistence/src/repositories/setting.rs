//! Setting repository for the default, domain and user settings tables.

use sqlx::PgPool;

use domain::models::{SettingQuery, SettingRow, SettingScope};

use crate::entities::SettingEntity;
use crate::metrics::QueryTimer;

const DEFAULT_SETTINGS_SQL: &str = r#"
    SELECT subcategory, value
    FROM pbx_default_settings
    WHERE category = $1
      AND ($2::text IS NULL OR subcategory = $2)
      AND ($3::text IS NULL OR value_type = $3)
      AND enabled = 'true'
    ORDER BY sequence
"#;

const DOMAIN_SETTINGS_SQL: &str = r#"
    SELECT subcategory, value
    FROM pbx_domain_settings
    WHERE category = $1
      AND ($2::text IS NULL OR subcategory = $2)
      AND ($3::text IS NULL OR value_type = $3)
      AND enabled = 'true'
      AND domain_id_id = $4
    ORDER BY sequence
"#;

const USER_SETTINGS_SQL: &str = r#"
    SELECT subcategory, value
    FROM pbx_user_settings
    WHERE category = $1
      AND ($2::text IS NULL OR subcategory = $2)
      AND ($3::text IS NULL OR value_type = $3)
      AND enabled = 'true'
      AND user_id_id = $4
    ORDER BY sequence
"#;

/// Repository for settings lookups.
#[derive(Clone)]
pub struct SettingRepository {
    pool: PgPool,
}

impl SettingRepository {
    /// Creates a new SettingRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Enabled rows of one scope matching `query`, ordered by sequence.
    pub async fn find(
        &self,
        scope: SettingScope,
        query: &SettingQuery,
    ) -> Result<Vec<SettingRow>, sqlx::Error> {
        let value_type = query.value_type.map(|vt| vt.as_str());

        let (timer, statement) = match scope {
            SettingScope::Default => (
                QueryTimer::new("find_default_settings"),
                sqlx::query_as::<_, SettingEntity>(DEFAULT_SETTINGS_SQL)
                    .bind(&query.category)
                    .bind(query.subcategory.as_deref())
                    .bind(value_type),
            ),
            SettingScope::Domain(domain_id) => (
                QueryTimer::new("find_domain_settings"),
                sqlx::query_as::<_, SettingEntity>(DOMAIN_SETTINGS_SQL)
                    .bind(&query.category)
                    .bind(query.subcategory.as_deref())
                    .bind(value_type)
                    .bind(domain_id),
            ),
            SettingScope::User(user_id) => (
                QueryTimer::new("find_user_settings"),
                sqlx::query_as::<_, SettingEntity>(USER_SETTINGS_SQL)
                    .bind(&query.category)
                    .bind(query.subcategory.as_deref())
                    .bind(value_type)
                    .bind(user_id),
            ),
        };

        let rows = timer.finish(statement.fetch_all(&self.pool).await)?;
        Ok(rows.into_iter().map(SettingRow::from).collect())
    }
}
