//! Setting entity (row mapping shared by the three settings tables).

use sqlx::FromRow;

/// The columns of `pbx_default_settings`, `pbx_domain_settings` and
/// `pbx_user_settings` read by the bus.
#[derive(Debug, Clone, FromRow)]
pub struct SettingEntity {
    pub subcategory: Option<String>,
    pub value: Option<String>,
}

impl From<SettingEntity> for domain::models::SettingRow {
    fn from(entity: SettingEntity) -> Self {
        Self {
            subcategory: entity.subcategory.unwrap_or_default(),
            value: entity.value.unwrap_or_default(),
        }
    }
}
