use axum::{
    extract::{Path, State},
    http::HeaderMap,
    Json,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::core::extractor::AppJson;
use crate::features::studies::lifecycle::LifecycleController;
use crate::features::studies::models::{AnalysisData, Study};
use crate::shared::constants::SCORING_API_KEY_HEADER;
use crate::shared::types::ApiResponse;

/// State for the scoring completion webhook
#[derive(Clone)]
pub struct WebhookState {
    pub lifecycle: Arc<LifecycleController>,
    /// Shared secret the scoring job must echo; `None` disables the webhook
    pub api_key: Option<Arc<String>>,
}

fn api_key_matches(headers: &HeaderMap, expected: Option<&str>) -> bool {
    let Some(expected) = expected else {
        return false;
    };
    headers
        .get(SCORING_API_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|key| key == expected)
}

/// Completion callback from the scoring job
#[utoipa::path(
    post,
    path = "/api/webhooks/scoring/{id}/complete",
    params(
        ("id" = Uuid, Path, description = "Study ID"),
        ("x-api-key" = String, Header, description = "Scoring secret key")
    ),
    request_body = AnalysisData,
    responses(
        (status = 200, description = "Study moved to pending review", body = ApiResponse<Study>),
        (status = 401, description = "Missing or wrong secret key"),
        (status = 404, description = "Study not found"),
        (status = 409, description = "Study is not processing")
    ),
    tag = "webhooks"
)]
pub async fn complete_scoring(
    State(state): State<WebhookState>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
    AppJson(analysis): AppJson<AnalysisData>,
) -> Result<Json<ApiResponse<Study>>> {
    if !api_key_matches(&headers, state.api_key.as_deref().map(String::as_str)) {
        return Err(AppError::Unauthorized("Invalid scoring key".to_string()));
    }

    let study = state.lifecycle.complete_scoring(id, analysis).await?;
    Ok(Json(ApiResponse::success(
        Some(study),
        Some("Scoring completed".to_string()),
        None,
    )))
}
