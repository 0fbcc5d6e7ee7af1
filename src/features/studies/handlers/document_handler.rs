use axum::{
    extract::{Multipart, Path, State},
    Json,
};
use std::sync::Arc;
use tracing::debug;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::auth::model::AuthenticatedUser;
use crate::features::studies::models::Study;
use crate::features::studies::services::{DocumentService, DocumentUpload};
use crate::shared::types::ApiResponse;

/// Multipart form for a document upload.
///
/// Swagger documentation only; the handler reads `Multipart` directly.
#[derive(Debug, ToSchema)]
#[allow(dead_code)]
pub struct UploadDocumentForm {
    /// The document (PDF, XLSX/XLS, CSV, JPEG or PNG; max 20 MB)
    #[schema(format = Binary, content_media_type = "application/octet-stream")]
    pub file: String,
}

/// Upload a document into a slot of the study
///
/// Accepts multipart/form-data with a single `file` field. Replaces any
/// document previously in the slot.
#[utoipa::path(
    put,
    path = "/api/studies/{id}/files/{slot}",
    params(
        ("id" = Uuid, Path, description = "Study ID"),
        ("slot" = String, Path, description = "Document slot, e.g. estadosFinancierosAnual1")
    ),
    request_body(
        content = UploadDocumentForm,
        content_type = "multipart/form-data",
    ),
    responses(
        (status = 200, description = "Document stored", body = ApiResponse<Study>),
        (status = 400, description = "Invalid slot, type or size"),
        (status = 403, description = "Study belongs to another requester"),
        (status = 404, description = "Study not found")
    ),
    tag = "documents",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn upload_document(
    user: AuthenticatedUser,
    State(service): State<Arc<DocumentService>>,
    Path((id, slot)): Path<(Uuid, String)>,
    mut multipart: Multipart,
) -> Result<Json<ApiResponse<Study>>> {
    let mut upload: Option<DocumentUpload> = None;

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        debug!("Failed to read multipart field: {}", e);
        AppError::BadRequest(format!("Failed to read multipart data: {}", e))
    })? {
        let field_name = field.name().unwrap_or("").to_string();
        if field_name != "file" {
            debug!("Ignoring unknown field: {}", field_name);
            continue;
        }

        let content_type = field
            .content_type()
            .map(|s| s.to_string())
            .unwrap_or_else(|| "application/octet-stream".to_string());
        let file_name = field
            .file_name()
            .map(|s| s.to_string())
            .unwrap_or_else(|| format!("{}.bin", slot));
        let bytes = field.bytes().await.map_err(|e| {
            debug!("Failed to read file bytes: {}", e);
            AppError::BadRequest(format!("Failed to read file data: {}", e))
        })?;

        upload = Some(DocumentUpload {
            file_name,
            content_type,
            bytes: bytes.to_vec(),
        });
    }

    let upload = upload.ok_or_else(|| AppError::BadRequest("File is required".to_string()))?;
    let study = service.upload(&user, id, &slot, upload).await?;

    Ok(Json(ApiResponse::success(
        Some(study),
        Some("Document stored".to_string()),
        None,
    )))
}

/// Delete the document in a slot and clear it
#[utoipa::path(
    delete,
    path = "/api/studies/{id}/files/{slot}",
    params(
        ("id" = Uuid, Path, description = "Study ID"),
        ("slot" = String, Path, description = "Document slot")
    ),
    responses(
        (status = 200, description = "Document removed", body = ApiResponse<Study>),
        (status = 400, description = "Invalid slot"),
        (status = 403, description = "Study belongs to another requester"),
        (status = 404, description = "Study not found")
    ),
    tag = "documents",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn remove_document(
    user: AuthenticatedUser,
    State(service): State<Arc<DocumentService>>,
    Path((id, slot)): Path<(Uuid, String)>,
) -> Result<Json<ApiResponse<Study>>> {
    let study = service.remove(&user, id, &slot).await?;
    Ok(Json(ApiResponse::success(
        Some(study),
        Some("Document removed".to_string()),
        None,
    )))
}
