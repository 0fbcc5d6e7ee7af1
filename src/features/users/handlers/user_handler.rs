use crate::core::error::{AppError, Result};
use crate::core::extractor::AppJson;
use crate::features::auth::guards::RequireAdmin;
use crate::features::auth::model::{AuthenticatedUser, Identity};
use crate::features::users::dtos::{InviteUserDto, UserResponseDto};
use crate::features::users::services::UserService;
use crate::shared::types::ApiResponse;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;
use validator::Validate;

#[utoipa::path(
    get,
    path = "/api/users/me",
    responses(
        (status = 200, description = "Caller's directory record", body = ApiResponse<UserResponseDto>),
        (status = 401, description = "Unauthorized")
    ),
    tag = "users",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn me(
    user: AuthenticatedUser,
    State(service): State<Arc<UserService>>,
) -> Result<Json<ApiResponse<UserResponseDto>>> {
    let record = service
        .resolve(&Identity {
            sub: user.sub,
            email: user.email,
        })
        .await?;
    Ok(Json(ApiResponse::success(Some(record.into()), None, None)))
}

#[utoipa::path(
    get,
    path = "/api/admin/users",
    responses(
        (status = 200, description = "All directory records", body = ApiResponse<Vec<UserResponseDto>>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Admin access required")
    ),
    tag = "admin",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_users(
    RequireAdmin(_admin): RequireAdmin,
    State(service): State<Arc<UserService>>,
) -> Result<Json<ApiResponse<Vec<UserResponseDto>>>> {
    let users = service
        .list()
        .await?
        .into_iter()
        .map(UserResponseDto::from)
        .collect();
    Ok(Json(ApiResponse::<UserResponseDto>::list(users)))
}

#[utoipa::path(
    post,
    path = "/api/admin/users/invitations",
    request_body = InviteUserDto,
    responses(
        (status = 201, description = "User invited", body = ApiResponse<UserResponseDto>),
        (status = 400, description = "Validation error"),
        (status = 403, description = "Admin access required"),
        (status = 409, description = "Email already registered")
    ),
    tag = "admin",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn invite_user(
    RequireAdmin(_admin): RequireAdmin,
    State(service): State<Arc<UserService>>,
    AppJson(dto): AppJson<InviteUserDto>,
) -> Result<(StatusCode, Json<ApiResponse<UserResponseDto>>)> {
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let user = service.invite(&dto.email, dto.role).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(
            Some(user.into()),
            Some("User invited".to_string()),
            None,
        )),
    ))
}

#[utoipa::path(
    delete,
    path = "/api/admin/users/{email}",
    params(
        ("email" = String, Path, description = "Email of the records to remove")
    ),
    responses(
        (status = 200, description = "User removed"),
        (status = 403, description = "Admin access required"),
        (status = 404, description = "No user with that email")
    ),
    tag = "admin",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn remove_user(
    RequireAdmin(_admin): RequireAdmin,
    State(service): State<Arc<UserService>>,
    Path(email): Path<String>,
) -> Result<Json<ApiResponse<()>>> {
    let removed = service.remove(&email).await?;
    Ok(Json(ApiResponse::success(
        None,
        Some(format!("Removed {} record(s)", removed)),
        None,
    )))
}
