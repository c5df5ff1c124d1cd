use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::competences::service::{
    attach_competence, attach_language, detach_competence, AttachCompetence, AttachLanguage,
};
use crate::consultants::query::{ConsultantFilters, SearchParams};
use crate::consultants::service::{
    consultant_stats, create_consultant, delete_consultant, get_consultant_detail,
    search_consultants, update_consultant, ConsultantDetail, ConsultantPatch, ConsultantStats,
    ConsultantSummary, NewConsultant,
};
use crate::errors::AppError;
use crate::missions::service::{list_for_consultant, MissionView};
use crate::models::competence::{ConsultantCompetenceRow, ConsultantLanguageRow};
use crate::models::consultant::ConsultantRow;
use crate::pagination::Page;
use crate::state::AppState;

/// GET /api/v1/consultants
pub async fn handle_search(
    State(state): State<AppState>,
    Query(filters): Query<ConsultantFilters>,
) -> Result<Json<Page<ConsultantSummary>>, AppError> {
    let params = SearchParams::try_from(filters)?;
    Ok(Json(search_consultants(&state.db, &params).await?))
}

/// POST /api/v1/consultants
pub async fn handle_create(
    State(state): State<AppState>,
    Json(req): Json<NewConsultant>,
) -> Result<(StatusCode, Json<ConsultantRow>), AppError> {
    let row = create_consultant(&state.db, req).await?;
    Ok((StatusCode::CREATED, Json(row)))
}

/// GET /api/v1/consultants/stats
pub async fn handle_stats(State(state): State<AppState>) -> Result<Json<ConsultantStats>, AppError> {
    Ok(Json(consultant_stats(&state.db).await?))
}

/// GET /api/v1/consultants/:id
pub async fn handle_get(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ConsultantDetail>, AppError> {
    Ok(Json(get_consultant_detail(&state.db, id).await?))
}

/// PATCH /api/v1/consultants/:id
pub async fn handle_update(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(patch): Json<ConsultantPatch>,
) -> Result<Json<ConsultantRow>, AppError> {
    Ok(Json(update_consultant(&state.db, id, patch).await?))
}

/// DELETE /api/v1/consultants/:id
pub async fn handle_delete(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    delete_consultant(&state.db, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/consultants/:id/missions
pub async fn handle_list_missions(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<MissionView>>, AppError> {
    Ok(Json(list_for_consultant(&state.db, id).await?))
}

/// POST /api/v1/consultants/:id/competences
pub async fn handle_attach_competence(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<AttachCompetence>,
) -> Result<Json<ConsultantCompetenceRow>, AppError> {
    Ok(Json(attach_competence(&state.db, id, req).await?))
}

/// DELETE /api/v1/consultants/:id/competences/:cid
pub async fn handle_detach_competence(
    State(state): State<AppState>,
    Path((id, competence_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, AppError> {
    detach_competence(&state.db, id, competence_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/consultants/:id/languages
pub async fn handle_attach_language(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<AttachLanguage>,
) -> Result<Json<ConsultantLanguageRow>, AppError> {
    Ok(Json(attach_language(&state.db, id, req).await?))
}
