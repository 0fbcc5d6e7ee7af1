use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::features::analytics::{dtos as analytics_dtos, handlers as analytics_handlers};
use crate::features::studies::handlers::{
    document_handler, lifecycle_handler, study_handler, webhook_handler,
};
use crate::features::studies::{dtos as studies_dtos, lifecycle, models as studies_models};
use crate::features::users::{dtos as users_dtos, handlers::user_handler, models as users_models};
use crate::shared::types::{ApiResponse, Meta};

#[derive(OpenApi)]
#[openapi(
    paths(
        // Users
        user_handler::me,
        user_handler::list_users,
        user_handler::invite_user,
        user_handler::remove_user,
        // Studies
        study_handler::list_studies,
        study_handler::create_study,
        study_handler::get_study,
        study_handler::save_questionnaire,
        study_handler::report_summary,
        // Lifecycle
        lifecycle_handler::submit_study,
        lifecycle_handler::start_scoring,
        lifecycle_handler::active_job,
        lifecycle_handler::cancel_scoring,
        lifecycle_handler::reset_study,
        lifecycle_handler::approve_study,
        lifecycle_handler::reject_study,
        lifecycle_handler::request_reputation,
        // Documents
        document_handler::upload_document,
        document_handler::remove_document,
        // Webhooks
        webhook_handler::complete_scoring,
        // Analytics
        analytics_handlers::analytics_handler::list_views,
    ),
    components(
        schemas(
            Meta,
            // Users
            users_models::UserRole,
            users_models::UserStatus,
            users_dtos::InviteUserDto,
            users_dtos::UserResponseDto,
            ApiResponse<users_dtos::UserResponseDto>,
            ApiResponse<Vec<users_dtos::UserResponseDto>>,
            // Studies
            studies_models::Study,
            studies_models::StudyStatus,
            studies_models::StudyDocument,
            studies_models::Questionnaire,
            studies_models::DatosGenerales,
            studies_models::Accionista,
            studies_models::ClienteProveedor,
            studies_models::SolicitudCredito,
            studies_models::AnalysisData,
            studies_models::PerformanceYear,
            studies_models::RatioGroups,
            studies_models::Ratio,
            studies_models::ReputationData,
            studies_dtos::CreateStudyDto,
            studies_dtos::ScoringJobDto,
            studies_dtos::CancelScoringDto,
            studies_dtos::RiskBand,
            studies_dtos::Recommendation,
            studies_dtos::ReportSummaryDto,
            lifecycle::JobHandle,
            document_handler::UploadDocumentForm,
            ApiResponse<studies_models::Study>,
            ApiResponse<Vec<studies_models::Study>>,
            ApiResponse<studies_dtos::ScoringJobDto>,
            ApiResponse<studies_dtos::CancelScoringDto>,
            ApiResponse<studies_dtos::ReportSummaryDto>,
            // Analytics
            analytics_dtos::AnalyticsViewDto,
            ApiResponse<Vec<analytics_dtos::AnalyticsViewDto>>,
        )
    ),
    tags(
        (name = "users", description = "Caller identity"),
        (name = "admin", description = "User directory and analytics (admin/reviewer)"),
        (name = "studies", description = "Credit study intake and reports"),
        (name = "lifecycle", description = "Study status transitions and scoring jobs"),
        (name = "documents", description = "Study document slots"),
        (name = "webhooks", description = "Scoring service callbacks (API key)"),
    ),
    modifiers(&SecurityAddon),
    info(
        title = "Credit IQ API",
        version = "0.1.0",
        description = "API documentation for Credit IQ",
    )
)]
pub struct ApiDoc;

/// Adds Bearer JWT security scheme to OpenAPI spec
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// Modifier to override OpenAPI info from config
pub struct SwaggerInfoModifier {
    pub title: String,
    pub version: String,
    pub description: String,
}

impl Modify for SwaggerInfoModifier {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        openapi.info.title = self.title.clone();
        openapi.info.version = self.version.clone();
        openapi.info.description = Some(self.description.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_lists_lifecycle_paths() {
        let doc = ApiDoc::openapi();

        assert!(doc.paths.paths.contains_key("/api/studies/{id}/scoring"));
        assert!(doc
            .paths
            .paths
            .contains_key("/api/webhooks/scoring/{id}/complete"));
        assert!(doc
            .components
            .as_ref()
            .is_some_and(|c| c.security_schemes.contains_key("bearer_auth")));
    }
}
