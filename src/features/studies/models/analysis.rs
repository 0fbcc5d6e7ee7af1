use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Output of the external scoring job
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisData {
    pub risk_score: f64,
    #[serde(default)]
    pub performance: Vec<PerformanceYear>,
    #[serde(default)]
    pub ratios: RatioGroups,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reputation: Option<ReputationData>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PerformanceYear {
    pub year: i32,
    pub ingresos: f64,
    pub costos: f64,
    pub utilidades: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct RatioGroups {
    pub liquidez: Vec<Ratio>,
    pub solvencia: Vec<Ratio>,
    pub rentabilidad: Vec<Ratio>,
    pub apalancamiento: Vec<Ratio>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Ratio {
    pub name: String,
    pub value: f64,
    pub previous_value: f64,
    #[serde(default)]
    pub interpretation: String,
}

/// Reputational analysis merged into a study after submission
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ReputationData {
    pub empresa: String,
    /// `positiva`, `neutral` or `negativa`
    pub calificacion_reputacional: String,
    pub impacto_score_crediticio: String,
    pub impacto_score_num: i32,
    pub resumen_reputacional: String,
    #[serde(default)]
    pub riesgos: Vec<String>,
    #[serde(default)]
    pub oportunidades: Vec<String>,
    #[serde(default)]
    pub fuentes: Vec<String>,
}
