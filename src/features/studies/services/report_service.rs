use std::sync::Arc;
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::auth::model::AuthenticatedUser;
use crate::features::studies::dtos::ReportSummaryDto;
use crate::features::studies::repositories::StudyStore;

/// Builds the executive summary of a scored study
pub struct ReportService {
    store: Arc<dyn StudyStore>,
}

impl ReportService {
    pub fn new(store: Arc<dyn StudyStore>) -> Self {
        Self { store }
    }

    pub async fn summary(&self, user: &AuthenticatedUser, study_id: Uuid) -> Result<ReportSummaryDto> {
        let study = self.store.get(study_id).await?;
        if !study.is_visible_to(user) {
            return Err(AppError::NotAuthorized(
                "You do not have access to this study".to_string(),
            ));
        }

        let status = study.status;
        let document = study.document;
        let analysis = document.analysis_data.ok_or_else(|| {
            AppError::InvalidState("Study has not been scored yet".to_string())
        })?;

        Ok(ReportSummaryDto::new(
            study_id,
            document.empresa_nombre,
            document.rfc,
            status,
            analysis,
            document.reputation_data,
        ))
    }
}
