use crate::core::error::AppError;
use crate::features::auth::model::{AuthenticatedUser, Identity};
use crate::features::auth::TokenVerifier;
use crate::features::users::services::UserService;
use axum::{
    extract::{Request, State},
    http::{header, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use base64::prelude::*;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::request_id::{MakeRequestId, RequestId};
use tracing::Span;
use uuid::Uuid;

/// Request ID generator using UUID v7 (time-ordered)
#[derive(Clone, Copy)]
pub struct MakeRequestUuid;

impl MakeRequestId for MakeRequestUuid {
    fn make_request_id<B>(&mut self, _request: &axum::http::Request<B>) -> Option<RequestId> {
        HeaderValue::from_str(&Uuid::now_v7().to_string())
            .ok()
            .map(RequestId::new)
    }
}

/// Custom MakeSpan that includes request_id in the tracing span
#[derive(Clone, Debug)]
pub struct MakeSpanWithRequestId;

impl<B> tower_http::trace::MakeSpan<B> for MakeSpanWithRequestId {
    fn make_span(&mut self, request: &axum::http::Request<B>) -> Span {
        let request_id = request
            .headers()
            .get("x-request-id")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("-");

        tracing::info_span!(
            "request",
            method = %request.method(),
            uri = %request.uri(),
            request_id = %request_id,
        )
    }
}

pub fn cors_layer(allowed_origins: Vec<String>) -> CorsLayer {
    let cors = CorsLayer::new().allow_methods(Any).allow_headers(Any);

    if allowed_origins.iter().any(|o| o == "*") {
        cors.allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> = allowed_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        cors.allow_origin(AllowOrigin::list(origins))
    }
}

/// Check a `Basic` authorization header against "username:password"
fn basic_credentials_match(auth_header: Option<&str>, expected: &str) -> bool {
    auth_header
        .and_then(|h| h.strip_prefix("Basic "))
        .and_then(|encoded| BASE64_STANDARD.decode(encoded).ok())
        .and_then(|decoded| String::from_utf8(decoded).ok())
        .is_some_and(|creds| creds == expected)
}

/// Guards the Swagger UI with HTTP basic auth
pub fn basic_auth_middleware(
    valid_credentials: Arc<String>,
) -> impl Fn(
    Request,
    Next,
)
    -> std::pin::Pin<Box<dyn std::future::Future<Output = Result<Response, Response>> + Send>>
       + Clone {
    move |req: Request, next: Next| {
        let credentials = valid_credentials.clone();
        Box::pin(async move {
            let auth_header = req
                .headers()
                .get(header::AUTHORIZATION)
                .and_then(|header| header.to_str().ok());

            if basic_credentials_match(auth_header, &credentials) {
                return Ok(next.run(req).await);
            }

            Err((
                StatusCode::UNAUTHORIZED,
                [(header::WWW_AUTHENTICATE, "Basic realm=\"Swagger UI\"")],
                "Unauthorized",
            )
                .into_response())
        })
    }
}

/// State for the bearer auth middleware
#[derive(Clone)]
pub struct AuthState {
    pub verifier: Arc<dyn TokenVerifier>,
    pub users: Arc<UserService>,
}

/// Validates the bearer token, resolves the caller's role from the user
/// directory and stores an `AuthenticatedUser` in the request extensions.
pub async fn auth_middleware(
    State(state): State<AuthState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let auth_header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| AppError::Unauthorized("Missing authorization header".to_string()))?;

    let token = auth_header.strip_prefix("Bearer ").ok_or_else(|| {
        AppError::Unauthorized("Invalid authorization header format".to_string())
    })?;

    let Identity { sub, email } = state.verifier.verify(token).await?;
    let record = state
        .users
        .resolve(&Identity {
            sub: sub.clone(),
            email: email.clone(),
        })
        .await?;

    req.extensions_mut().insert(AuthenticatedUser {
        sub,
        email: email.or(Some(record.email)),
        role: record.role,
    });
    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::users::models::UserRole;
    use crate::shared::test_helpers::{InMemoryUserDirectory, StaticTokenVerifier};
    use axum::{routing::get, Json, Router};
    use axum_test::TestServer;

    async fn whoami(user: AuthenticatedUser) -> Json<AuthenticatedUser> {
        Json(user)
    }

    fn server(directory: Arc<InMemoryUserDirectory>) -> TestServer {
        let state = AuthState {
            verifier: Arc::new(StaticTokenVerifier),
            users: Arc::new(UserService::new(directory)),
        };
        let router = Router::new()
            .route("/whoami", get(whoami))
            .layer(axum::middleware::from_fn_with_state(state, auth_middleware));
        TestServer::new(router).unwrap()
    }

    #[test]
    fn test_basic_credentials_match() {
        let encoded = BASE64_STANDARD.encode("admin:secret");
        let header = format!("Basic {}", encoded);

        assert!(basic_credentials_match(Some(&header), "admin:secret"));
        assert!(!basic_credentials_match(Some(&header), "admin:other"));
        assert!(!basic_credentials_match(Some("Bearer abc"), "admin:secret"));
        assert!(!basic_credentials_match(None, "admin:secret"));
    }

    #[tokio::test]
    async fn test_missing_token_is_unauthorized() {
        let server = server(Arc::new(InMemoryUserDirectory::default()));
        server.get("/whoami").await.assert_status_unauthorized();
    }

    #[tokio::test]
    async fn test_role_comes_from_directory() {
        let directory = Arc::new(InMemoryUserDirectory::default());
        directory.seed("boss@example.com", Some("sub-boss"), UserRole::Admin);
        let server = server(directory);

        let user: AuthenticatedUser = server
            .get("/whoami")
            .add_header("authorization", "Bearer sub-boss|boss@example.com")
            .await
            .json();

        assert_eq!(user.role, UserRole::Admin);
        assert_eq!(user.sub, "sub-boss");
    }

    #[tokio::test]
    async fn test_first_login_provisions_requester() {
        let server = server(Arc::new(InMemoryUserDirectory::default()));

        let user: AuthenticatedUser = server
            .get("/whoami")
            .add_header("authorization", "Bearer sub-new|new@example.com")
            .await
            .json();

        assert_eq!(user.role, UserRole::Requester);
    }
}
