use axum::{extract::State, Json};

use crate::app::AppState;
use crate::database::{Document, Filter};
use crate::error::ApiResult;

/// GET /products - every product document
pub async fn list(State(state): State<AppState>) -> ApiResult<Json<Vec<Document>>> {
    let products = state
        .store
        .find(&state.collections.products, &Filter::all(), None)
        .await?;
    Ok(Json(products))
}
