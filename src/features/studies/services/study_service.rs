use serde_json::Value;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::auth::model::AuthenticatedUser;
use crate::features::studies::models::{
    FieldPath, Questionnaire, Study, StudyFilter, StudyPatch,
};
use crate::features::studies::repositories::StudyStore;
use crate::shared::validation::is_valid_rfc;

/// Study intake and retrieval. Status changes go through the lifecycle
/// controller, never through here.
pub struct StudyService {
    store: Arc<dyn StudyStore>,
}

impl StudyService {
    pub fn new(store: Arc<dyn StudyStore>) -> Self {
        Self { store }
    }

    /// Persist a new draft owned by the caller
    pub async fn create(
        &self,
        user: &AuthenticatedUser,
        questionnaire: Option<Questionnaire>,
    ) -> Result<Study> {
        let mut study = Study::draft(&user.sub);
        if let Some(questionnaire) = questionnaire {
            Self::validate_questionnaire(&questionnaire)?;
            study.document.empresa_nombre = questionnaire.datos_generales.nombre_empresa.clone();
            study.document.rfc = questionnaire.datos_generales.rfc.clone();
            study.document.giro = questionnaire.datos_generales.sector.clone();
            study.document.questionnaire = questionnaire;
        }

        let study = self.store.create(&study).await?;
        info!("Study {:?} created by {}", study.id, user.sub);
        Ok(study)
    }

    /// Fetch a study the caller may see
    pub async fn get(&self, user: &AuthenticatedUser, id: Uuid) -> Result<Study> {
        let study = self.store.get(id).await?;
        if !study.is_visible_to(user) {
            return Err(AppError::NotAuthorized(
                "You do not have access to this study".to_string(),
            ));
        }
        Ok(study)
    }

    /// Studies visible to the caller, newest first, optionally narrowed by a
    /// case-insensitive match on company name or RFC
    pub async fn list(&self, user: &AuthenticatedUser, search: Option<&str>) -> Result<Vec<Study>> {
        let filter = if user.can_review() {
            StudyFilter::All
        } else {
            StudyFilter::OwnedBy(user.sub.clone())
        };

        let mut studies = self.store.query(filter).await?;
        studies.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let search = search
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty());
        if let Some(term) = search {
            studies.retain(|study| {
                study.document.empresa_nombre.to_lowercase().contains(&term)
                    || study.document.rfc.to_lowercase().contains(&term)
            });
        }

        Ok(studies)
    }

    /// Replace the questionnaire and its denormalised header fields
    pub async fn save_questionnaire(
        &self,
        user: &AuthenticatedUser,
        id: Uuid,
        questionnaire: Questionnaire,
    ) -> Result<Study> {
        self.get(user, id).await?;
        Self::validate_questionnaire(&questionnaire)?;

        let general = &questionnaire.datos_generales;
        let patch = StudyPatch::default()
            .set(field("empresaNombre")?, Value::String(general.nombre_empresa.clone()))
            .set(field("rfc")?, Value::String(general.rfc.clone()))
            .set(field("giro")?, Value::String(general.sector.clone()))
            .set(
                field("questionnaire")?,
                serde_json::to_value(&questionnaire)
                    .map_err(|e| AppError::Internal(format!("Failed to encode questionnaire: {}", e)))?,
            );

        let study = self.store.merge(id, patch).await?;
        info!("Questionnaire saved for study {} by {}", id, user.sub);
        Ok(study)
    }

    fn validate_questionnaire(questionnaire: &Questionnaire) -> Result<()> {
        let rfc = questionnaire.datos_generales.rfc.trim();
        if !rfc.is_empty() && !is_valid_rfc(rfc) {
            return Err(AppError::Validation(format!("Invalid RFC: {}", rfc)));
        }
        Ok(())
    }
}

fn field(path: &str) -> Result<FieldPath> {
    FieldPath::parse(path).map_err(AppError::Internal)
}
