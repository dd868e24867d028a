use axum::{
    extract::{rejection::QueryRejection, Query, State},
    Json,
};
use serde::Deserialize;

use crate::app::AppState;
use crate::database::{Document, Filter};
use crate::error::ApiResult;
use crate::middleware::AuthUser;

#[derive(Debug, Deserialize)]
pub struct BookingQuery {
    pub email: Option<String>,
}

/// GET /bookings?email= - the caller's own bookings
///
/// The requested email must equal the token's email; otherwise 403 and the
/// store is never queried.
pub async fn list(
    State(state): State<AppState>,
    user: AuthUser,
    query: Result<Query<BookingQuery>, QueryRejection>,
) -> ApiResult<Json<Vec<Document>>> {
    let Query(query) = query?;
    user.ensure_owner(query.email.as_deref())?;

    let bookings = state
        .store
        .find(
            &state.collections.bookings,
            &Filter::all().eq("email", user.email()),
            None,
        )
        .await?;
    Ok(Json(bookings))
}
