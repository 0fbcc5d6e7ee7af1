use crate::features::users::handlers::user_handler;
use crate::features::users::services::UserService;
use axum::{
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;

pub fn routes(service: Arc<UserService>) -> Router {
    Router::new()
        .route("/api/users/me", get(user_handler::me))
        .route("/api/admin/users", get(user_handler::list_users))
        .route(
            "/api/admin/users/invitations",
            post(user_handler::invite_user),
        )
        .route(
            "/api/admin/users/{email}",
            delete(user_handler::remove_user),
        )
        .with_state(service)
}
