use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// One generated `CREATE OR REPLACE VIEW` statement
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AnalyticsViewDto {
    /// View name inside the dataset, e.g. `vw_metricas_generales`
    pub name: String,
    pub title: String,
    pub sql: String,
}
