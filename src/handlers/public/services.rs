use axum::{
    extract::{Path, State},
    Json,
};

use crate::app::AppState;
use crate::database::{parse_id, Document, Filter, Projection};
use crate::error::{ApiError, ApiResult};

/// GET /services - every service document
pub async fn list(State(state): State<AppState>) -> ApiResult<Json<Vec<Document>>> {
    let services = state
        .store
        .find(&state.collections.services, &Filter::all(), None)
        .await?;
    Ok(Json(services))
}

/// GET /services/title - every service, reduced to `_id` and `title`
pub async fn titles(State(state): State<AppState>) -> ApiResult<Json<Vec<Document>>> {
    let projection = Projection::include(["title"]);
    let services = state
        .store
        .find(&state.collections.services, &Filter::all(), Some(&projection))
        .await?;
    Ok(Json(services))
}

/// GET /services/:id - one service by id
pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Document>> {
    let id = parse_id(&id)?;

    state
        .store
        .find_one(&state.collections.services, &Filter::by_id(id))
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found(format!("Service {} not found", id)))
}
