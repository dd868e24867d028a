use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Json,
};
use serde_json::Value;

use crate::app::AppState;
use crate::database::{parse_id, DeleteResult, Filter, InsertOneResult, UpdateResult};
use crate::error::ApiResult;
use crate::models::{NewBooking, StatusUpdate};

/// POST /bookings - store a new booking
pub async fn create(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Json<InsertOneResult>> {
    let Json(body) = payload?;
    let booking = NewBooking::parse(body)?;
    tracing::debug!("Creating booking for {}", booking.email());

    let result = state
        .store
        .insert_one(&state.collections.bookings, booking.into_document())
        .await?;
    Ok(Json(result))
}

/// PATCH /bookings/:id - set the booking's status
pub async fn update_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<StatusUpdate>, JsonRejection>,
) -> ApiResult<Json<UpdateResult>> {
    let id = parse_id(&id)?;
    let Json(update) = payload?;
    let set = update.into_set()?;

    let result = state
        .store
        .update_one(&state.collections.bookings, &Filter::by_id(id), set)
        .await?;
    Ok(Json(result))
}

/// DELETE /bookings/:id - remove a booking; a missing id deletes nothing
pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<DeleteResult>> {
    let id = parse_id(&id)?;

    let result = state
        .store
        .delete_one(&state.collections.bookings, &Filter::by_id(id))
        .await?;
    Ok(Json(result))
}
