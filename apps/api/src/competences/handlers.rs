use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::competences::service::{
    create_competence, find_consultants_with_skill, get_competence, list_competences,
    NewCompetence,
};
use crate::errors::AppError;
use crate::models::competence::CompetenceRow;
use crate::models::consultant::ConsultantRow;
use crate::state::AppState;

/// GET /api/v1/competences
pub async fn handle_list(State(state): State<AppState>) -> Result<Json<Vec<CompetenceRow>>, AppError> {
    Ok(Json(list_competences(&state.db).await?))
}

/// POST /api/v1/competences
pub async fn handle_create(
    State(state): State<AppState>,
    Json(req): Json<NewCompetence>,
) -> Result<(StatusCode, Json<CompetenceRow>), AppError> {
    let row = create_competence(&state.db, req).await?;
    Ok((StatusCode::CREATED, Json(row)))
}

/// GET /api/v1/competences/:id/consultants
pub async fn handle_list_consultants(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<ConsultantRow>>, AppError> {
    let competence = get_competence(&state.db, id).await?;
    Ok(Json(find_consultants_with_skill(&state.db, &competence.name).await?))
}
