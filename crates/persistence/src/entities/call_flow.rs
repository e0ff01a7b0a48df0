//! Call flow entity.

use shared::flag::parse_optional_flag;
use sqlx::FromRow;
use uuid::Uuid;

/// Row mapping for `pbx_call_flows`. `status` is read as text whatever the
/// column type, so `'true'` and boolean `true` both map to the same flag.
#[derive(Debug, Clone, FromRow)]
pub struct CallFlowEntity {
    pub id: Uuid,
    pub extension: Option<String>,
    pub feature_code: Option<String>,
    pub status: Option<String>,
    pub context: Option<String>,
}

impl From<CallFlowEntity> for domain::models::CallFlow {
    fn from(entity: CallFlowEntity) -> Self {
        Self {
            id: entity.id,
            extension: entity.extension.unwrap_or_default(),
            feature_code: entity.feature_code.unwrap_or_default(),
            status: parse_optional_flag(entity.status.as_deref()),
            context: entity.context.unwrap_or_default(),
        }
    }
}
