use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::features::studies::lifecycle::JobHandle;
use crate::features::studies::models::{
    AnalysisData, PerformanceYear, Questionnaire, RatioGroups, ReputationData, StudyStatus,
};

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct CreateStudyDto {
    #[serde(default)]
    pub questionnaire: Option<Questionnaire>,
}

/// Query params for listing studies
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
pub struct ListStudiesQuery {
    /// Case-insensitive match on company name or RFC
    pub search: Option<String>,
}

/// Scoring job as seen by the caller
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ScoringJobDto {
    pub study_id: Uuid,
    pub job_id: Uuid,
    pub status: StudyStatus,
}

impl ScoringJobDto {
    pub fn new(handle: JobHandle, status: StudyStatus) -> Self {
        Self {
            study_id: handle.study_id,
            job_id: handle.job_id,
            status,
        }
    }
}

/// Result of a cancel: the status is final for the caller even if the
/// background write has not landed yet
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CancelScoringDto {
    pub study_id: Uuid,
    pub job_id: Uuid,
    pub status: StudyStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum RiskBand {
    High,
    Moderate,
    Low,
}

impl RiskBand {
    /// `high` up to 50, `moderate` up to 75, `low` above
    pub fn for_score(score: f64) -> Self {
        if score <= 50.0 {
            RiskBand::High
        } else if score <= 75.0 {
            RiskBand::Moderate
        } else {
            RiskBand::Low
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Recommendation {
    Approve,
    ReviewWithCaution,
}

impl Recommendation {
    pub fn for_score(score: f64) -> Self {
        if score > 70.0 {
            Recommendation::Approve
        } else {
            Recommendation::ReviewWithCaution
        }
    }
}

/// Executive summary of a scored study
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReportSummaryDto {
    pub study_id: Uuid,
    pub empresa_nombre: String,
    pub rfc: String,
    pub status: StudyStatus,
    pub risk_score: f64,
    pub risk_band: RiskBand,
    pub recommendation: Recommendation,
    pub performance: Vec<PerformanceYear>,
    pub ratios: RatioGroups,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reputation: Option<ReputationData>,
}

impl ReportSummaryDto {
    pub fn new(
        study_id: Uuid,
        empresa_nombre: String,
        rfc: String,
        status: StudyStatus,
        analysis: AnalysisData,
        reputation: Option<ReputationData>,
    ) -> Self {
        Self {
            study_id,
            empresa_nombre,
            rfc,
            status,
            risk_score: analysis.risk_score,
            risk_band: RiskBand::for_score(analysis.risk_score),
            recommendation: Recommendation::for_score(analysis.risk_score),
            performance: analysis.performance,
            ratios: analysis.ratios,
            reputation: reputation.or(analysis.reputation),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_risk_band_boundaries() {
        assert_eq!(RiskBand::for_score(0.0), RiskBand::High);
        assert_eq!(RiskBand::for_score(50.0), RiskBand::High);
        assert_eq!(RiskBand::for_score(50.5), RiskBand::Moderate);
        assert_eq!(RiskBand::for_score(75.0), RiskBand::Moderate);
        assert_eq!(RiskBand::for_score(75.1), RiskBand::Low);
    }

    #[test]
    fn test_recommendation_threshold() {
        assert_eq!(Recommendation::for_score(70.0), Recommendation::ReviewWithCaution);
        assert_eq!(Recommendation::for_score(70.1), Recommendation::Approve);
        assert_eq!(
            serde_json::to_string(&Recommendation::ReviewWithCaution).unwrap(),
            "\"review_with_caution\""
        );
    }
}
