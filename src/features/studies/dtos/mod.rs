mod study_dto;

pub use study_dto::{
    CancelScoringDto, CreateStudyDto, ListStudiesQuery, Recommendation, ReportSummaryDto,
    RiskBand, ScoringJobDto,
};
