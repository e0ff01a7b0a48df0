//! Call flow repository.

use sqlx::PgPool;

use domain::models::CallFlow;

use crate::entities::CallFlowEntity;
use crate::metrics::QueryTimer;

/// Repository for `pbx_call_flows`.
#[derive(Clone)]
pub struct CallFlowRepository {
    pool: PgPool,
}

impl CallFlowRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Enabled call flows, optionally limited to one context.
    pub async fn list(&self, context: Option<&str>) -> Result<Vec<CallFlow>, sqlx::Error> {
        let timer = QueryTimer::new("list_call_flows");
        let result = sqlx::query_as::<_, CallFlowEntity>(
            r#"
            SELECT id, extension, feature_code, status::text AS status, context
            FROM pbx_call_flows
            WHERE enabled = 'true'
              AND ($1::text IS NULL OR context = $1)
            ORDER BY context, feature_code
            "#,
        )
        .bind(context)
        .fetch_all(&self.pool)
        .await;

        let rows = timer.finish(result)?;
        Ok(rows.into_iter().map(CallFlow::from).collect())
    }
}
