use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use axum_extra::extract::cookie::CookieJar;
use serde_json::{json, Value};

use crate::app::AppState;
use crate::auth::{clear_session_cookie, session_cookie, Identity};
use crate::error::{ApiError, ApiResult};

/// POST /jwt - issue a token for the posted identity and set it as the
/// `token` cookie
///
/// Input: `{ "email": "a@x.com", ... }`; extra fields become claims.
pub async fn issue(
    State(state): State<AppState>,
    jar: CookieJar,
    payload: Result<Json<Identity>, JsonRejection>,
) -> ApiResult<(CookieJar, Json<Value>)> {
    let Json(identity) = payload?;
    if identity.email.trim().is_empty() {
        return Err(ApiError::bad_request("email is required"));
    }

    let token = state.tokens.issue(&identity)?;
    tracing::info!("Issued session token for {}", identity.email);

    let jar = jar.add(session_cookie(token, state.cookie_secure));
    Ok((
        jar,
        Json(json!({
            "success": true,
            "expires_in": state.tokens.ttl().num_seconds()
        })),
    ))
}

/// POST /logout - clear the `token` cookie
pub async fn logout(jar: CookieJar) -> (CookieJar, Json<Value>) {
    (jar.add(clear_session_cookie()), Json(json!({ "success": true })))
}
