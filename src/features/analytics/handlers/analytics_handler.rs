use axum::{extract::State, Json};
use chrono::{Datelike, Utc};
use std::sync::Arc;

use crate::core::error::Result;
use crate::features::analytics::dtos::AnalyticsViewDto;
use crate::features::analytics::services::AnalyticsService;
use crate::features::auth::guards::RequireReviewer;
use crate::shared::types::ApiResponse;

/// Warehouse view statements for the analytics dashboards
///
/// The performance view covers the three closed fiscal years before the
/// current one.
#[utoipa::path(
    get,
    path = "/api/admin/analytics/views",
    responses(
        (status = 200, description = "Rendered view statements", body = ApiResponse<Vec<AnalyticsViewDto>>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Reviewer access required")
    ),
    tag = "admin",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_views(
    RequireReviewer(_user): RequireReviewer,
    State(service): State<Arc<AnalyticsService>>,
) -> Result<Json<ApiResponse<Vec<AnalyticsViewDto>>>> {
    let views = service.views(Utc::now().year() - 1)?;
    Ok(Json(ApiResponse::<AnalyticsViewDto>::list(views)))
}
