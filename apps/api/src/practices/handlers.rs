use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::practice::{PracticeOverviewRow, PracticeRow};
use crate::practices::service::{
    create_practice, delete_practice, get_practice, list_practices, practice_overview,
    update_practice, NewPractice, PracticePatch,
};
use crate::state::AppState;

/// GET /api/v1/practices
pub async fn handle_list(State(state): State<AppState>) -> Result<Json<Vec<PracticeRow>>, AppError> {
    Ok(Json(list_practices(&state.db).await?))
}

/// POST /api/v1/practices
pub async fn handle_create(
    State(state): State<AppState>,
    Json(req): Json<NewPractice>,
) -> Result<(StatusCode, Json<PracticeRow>), AppError> {
    let row = create_practice(&state.db, req).await?;
    Ok((StatusCode::CREATED, Json(row)))
}

/// GET /api/v1/practices/overview
/// Consultant and availability counts per practice.
pub async fn handle_overview(
    State(state): State<AppState>,
) -> Result<Json<Vec<PracticeOverviewRow>>, AppError> {
    Ok(Json(practice_overview(&state.db).await?))
}

/// GET /api/v1/practices/:id
pub async fn handle_get(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<PracticeRow>, AppError> {
    Ok(Json(get_practice(&state.db, id).await?))
}

/// PATCH /api/v1/practices/:id
pub async fn handle_update(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(patch): Json<PracticePatch>,
) -> Result<Json<PracticeRow>, AppError> {
    Ok(Json(update_practice(&state.db, id, patch).await?))
}

/// DELETE /api/v1/practices/:id
pub async fn handle_delete(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    delete_practice(&state.db, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
