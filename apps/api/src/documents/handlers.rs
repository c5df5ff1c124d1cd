use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::documents::service::{
    analyze_document, apply_analysis, delete_document, get_document, list_documents,
    upload_document, ApplyReport, Store, Upload,
};
use crate::errors::AppError;
use crate::models::document::DocumentRow;
use crate::state::AppState;

fn store(state: &AppState) -> Store<'_> {
    Store {
        s3: &state.s3,
        bucket: &state.config.s3_bucket,
    }
}

/// Pulls the `file` part out of a multipart body.
async fn read_file_part(mut multipart: Multipart) -> Result<Upload, AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("invalid multipart body: {e}")))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let file_name = field
            .file_name()
            .map(str::to_string)
            .filter(|n| !n.trim().is_empty())
            .ok_or_else(|| AppError::Validation("file part must carry a file name".to_string()))?;
        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::Validation(format!("could not read uploaded file: {e}")))?;
        return Ok(Upload {
            file_name,
            content_type,
            bytes,
        });
    }
    Err(AppError::Validation("multipart body has no 'file' part".to_string()))
}

/// GET /api/v1/consultants/:id/documents
pub async fn handle_list(
    State(state): State<AppState>,
    Path(consultant_id): Path<Uuid>,
) -> Result<Json<Vec<DocumentRow>>, AppError> {
    Ok(Json(list_documents(&state.db, consultant_id).await?))
}

/// POST /api/v1/consultants/:id/documents
pub async fn handle_upload(
    State(state): State<AppState>,
    Path(consultant_id): Path<Uuid>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<DocumentRow>), AppError> {
    let upload = read_file_part(multipart).await?;
    let row = upload_document(&state.db, store(&state), consultant_id, upload).await?;
    Ok((StatusCode::CREATED, Json(row)))
}

/// GET /api/v1/documents/:id
pub async fn handle_get(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<DocumentRow>, AppError> {
    Ok(Json(get_document(&state.db, id).await?))
}

/// DELETE /api/v1/documents/:id
pub async fn handle_delete(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    delete_document(&state.db, store(&state), id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/documents/:id/analyze
pub async fn handle_analyze(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<DocumentRow>, AppError> {
    Ok(Json(analyze_document(&state.db, state.cv_analyzer.as_ref(), id).await?))
}

/// POST /api/v1/documents/:id/apply
pub async fn handle_apply(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApplyReport>, AppError> {
    Ok(Json(apply_analysis(&state.db, id).await?))
}
