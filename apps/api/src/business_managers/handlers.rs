use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::business_managers::service::{
    assign, create_business_manager, delete_business_manager, get_business_manager, history_of,
    list_business_managers, list_consultants_of, update_business_manager, AssignOutcome,
    AssignRequest, BusinessManagerPatch, NewBusinessManager,
};
use crate::errors::AppError;
use crate::models::business_manager::{AssignmentDetailRow, BusinessManagerRow};
use crate::models::consultant::ConsultantRow;
use crate::state::AppState;

/// GET /api/v1/business-managers
pub async fn handle_list(
    State(state): State<AppState>,
) -> Result<Json<Vec<BusinessManagerRow>>, AppError> {
    Ok(Json(list_business_managers(&state.db).await?))
}

/// POST /api/v1/business-managers
pub async fn handle_create(
    State(state): State<AppState>,
    Json(req): Json<NewBusinessManager>,
) -> Result<(StatusCode, Json<BusinessManagerRow>), AppError> {
    let row = create_business_manager(&state.db, req).await?;
    Ok((StatusCode::CREATED, Json(row)))
}

/// GET /api/v1/business-managers/:id
pub async fn handle_get(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<BusinessManagerRow>, AppError> {
    Ok(Json(get_business_manager(&state.db, id).await?))
}

/// PATCH /api/v1/business-managers/:id
pub async fn handle_update(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(patch): Json<BusinessManagerPatch>,
) -> Result<Json<BusinessManagerRow>, AppError> {
    Ok(Json(update_business_manager(&state.db, id, patch).await?))
}

/// DELETE /api/v1/business-managers/:id
pub async fn handle_delete(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    delete_business_manager(&state.db, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/business-managers/:id/consultants
pub async fn handle_list_consultants(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<ConsultantRow>>, AppError> {
    Ok(Json(list_consultants_of(&state.db, id).await?))
}

/// GET /api/v1/consultants/:id/business-manager
/// Full assignment history, most recent first.
pub async fn handle_history(
    State(state): State<AppState>,
    Path(consultant_id): Path<Uuid>,
) -> Result<Json<Vec<AssignmentDetailRow>>, AppError> {
    Ok(Json(history_of(&state.db, consultant_id).await?))
}

/// POST /api/v1/consultants/:id/business-manager
pub async fn handle_assign(
    State(state): State<AppState>,
    Path(consultant_id): Path<Uuid>,
    Json(req): Json<AssignRequest>,
) -> Result<(StatusCode, Json<AssignOutcome>), AppError> {
    let outcome = assign(&state.db, consultant_id, req).await?;
    let status = if outcome.unchanged {
        StatusCode::OK
    } else {
        StatusCode::CREATED
    };
    Ok((status, Json(outcome)))
}
