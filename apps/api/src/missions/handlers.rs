use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::errors::AppError;
use crate::missions::service::{
    create_mission, delete_mission, get_mission_view, list_by_client, list_clients,
    update_mission, MissionPatch, MissionView, NewMission,
};
use crate::models::mission::MissionRow;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct ClientQuery {
    pub client: String,
}

/// GET /api/v1/missions?client=
pub async fn handle_list_by_client(
    State(state): State<AppState>,
    Query(params): Query<ClientQuery>,
) -> Result<Json<Vec<MissionRow>>, AppError> {
    if params.client.trim().is_empty() {
        return Err(AppError::Validation("client cannot be empty".to_string()));
    }
    Ok(Json(list_by_client(&state.db, &params.client).await?))
}

/// POST /api/v1/missions
pub async fn handle_create(
    State(state): State<AppState>,
    Json(req): Json<NewMission>,
) -> Result<(StatusCode, Json<MissionView>), AppError> {
    let view = create_mission(&state.db, req).await?;
    Ok((StatusCode::CREATED, Json(view)))
}

/// GET /api/v1/missions/clients
pub async fn handle_list_clients(State(state): State<AppState>) -> Result<Json<Vec<String>>, AppError> {
    Ok(Json(list_clients(&state.db).await?))
}

/// GET /api/v1/missions/:id
pub async fn handle_get(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<MissionView>, AppError> {
    Ok(Json(get_mission_view(&state.db, id).await?))
}

/// PATCH /api/v1/missions/:id
pub async fn handle_update(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(patch): Json<MissionPatch>,
) -> Result<Json<MissionView>, AppError> {
    Ok(Json(update_mission(&state.db, id, patch).await?))
}

/// DELETE /api/v1/missions/:id
pub async fn handle_delete(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    delete_mission(&state.db, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
