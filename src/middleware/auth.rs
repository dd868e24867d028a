use async_trait::async_trait;
use axum::{
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;

use crate::app::AppState;
use crate::auth::{Identity, TOKEN_COOKIE};
use crate::error::ApiError;

/// Authenticated identity extracted from the `token` cookie
#[derive(Clone, Debug, PartialEq)]
pub struct AuthUser {
    pub identity: Identity,
}

impl From<Identity> for AuthUser {
    fn from(identity: Identity) -> Self {
        Self { identity }
    }
}

impl AuthUser {
    pub fn email(&self) -> &str {
        &self.identity.email
    }

    /// Ownership check: the caller may only act on resources keyed by its own email
    pub fn ensure_owner(&self, owner_email: Option<&str>) -> Result<(), ApiError> {
        match owner_email {
            Some(owner) if owner == self.email() => Ok(()),
            _ => {
                tracing::warn!(
                    "Ownership check failed: '{}' requested resources of {:?}",
                    self.email(),
                    owner_email
                );
                Err(ApiError::forbidden("Forbidden access"))
            }
        }
    }
}

/// Cookie JWT middleware. Verifies the `token` cookie and injects [`AuthUser`]
/// into the request; anything else ends the request with 401 before the
/// downstream handler runs.
pub async fn jwt_cookie_middleware(
    State(state): State<AppState>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = jar
        .get(TOKEN_COOKIE)
        .map(|cookie| cookie.value().to_string())
        .filter(|value| !value.is_empty())
        .ok_or_else(|| {
            tracing::warn!("Rejected {}: missing token cookie", request.uri().path());
            ApiError::unauthorized("Unauthorized access")
        })?;

    let identity = state.tokens.verify(&token).map_err(|e| {
        tracing::warn!("Rejected {}: {}", request.uri().path(), e);
        ApiError::unauthorized("Unauthorized access")
    })?;

    request.extensions_mut().insert(AuthUser::from(identity));

    Ok(next.run(request).await)
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .ok_or_else(|| ApiError::unauthorized("Unauthorized access"))
    }
}
