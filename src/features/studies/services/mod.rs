mod document_service;
mod report_service;
mod reputation_service;
mod study_service;

pub use document_service::{DocumentService, DocumentUpload};
pub use report_service::ReportService;
pub use reputation_service::{DigestReputationProvider, ReputationProvider};
pub use study_service::StudyService;
