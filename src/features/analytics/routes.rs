use axum::{routing::get, Router};
use std::sync::Arc;

use crate::features::analytics::handlers::analytics_handler;
use crate::features::analytics::services::AnalyticsService;

pub fn routes(service: Arc<AnalyticsService>) -> Router {
    Router::new()
        .route(
            "/api/admin/analytics/views",
            get(analytics_handler::list_views),
        )
        .with_state(service)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::AnalyticsConfig;
    use crate::features::users::models::UserRole;
    use crate::shared::test_helpers::with_user;
    use axum::http::StatusCode;
    use axum_test::TestServer;

    fn server(role: UserRole) -> TestServer {
        let service = Arc::new(AnalyticsService::new(AnalyticsConfig::default()).unwrap());
        TestServer::new(with_user(routes(service), "user-1", role)).unwrap()
    }

    #[tokio::test]
    async fn test_reviewer_gets_views() {
        let body: serde_json::Value = server(UserRole::Reviewer)
            .get("/api/admin/analytics/views")
            .await
            .json();

        assert_eq!(body["meta"]["total"], 4);
        assert_eq!(body["data"][0]["name"], "vw_metricas_generales");
    }

    #[tokio::test]
    async fn test_requester_is_forbidden() {
        server(UserRole::Requester)
            .get("/api/admin/analytics/views")
            .await
            .assert_status(StatusCode::FORBIDDEN);
    }
}
