use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use tracing::warn;
use uuid::Uuid;

use super::{jwt::JwtKeys, services::SESSION_COOKIE};
use crate::error::ApiError;

/// Identity attached to an authenticated request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub id: Uuid,
    pub username: String,
}

/// Finds a candidate token: `Authorization: Bearer` first, then the session
/// cookie. A non-bearer Authorization header falls through to the cookie.
pub fn find_token(headers: &HeaderMap) -> Option<String> {
    let bearer = headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty());
    if let Some(token) = bearer {
        return Some(token.to_string());
    }

    CookieJar::from_headers(headers)
        .get(SESSION_COOKIE)
        .map(|c| c.value().to_string())
        .filter(|v| !v.is_empty())
}

/// Resolves the caller's identity. Expired and invalid tokens are rejected
/// with the same response.
pub fn authenticate(headers: &HeaderMap, keys: &JwtKeys) -> Result<AuthUser, ApiError> {
    let token = find_token(headers).ok_or(ApiError::Unauthorized("Unauthorized"))?;
    let claims = keys.verify(&token).map_err(|e| {
        warn!(reason = %e, "rejected session token");
        ApiError::Unauthorized("Invalid token")
    })?;
    Ok(AuthUser {
        id: claims.sub,
        username: claims.username,
    })
}

/// Auth gate for route groups: rejects with 401 or stores `AuthUser` in the
/// request extensions before continuing.
pub async fn require_auth(
    State(keys): State<JwtKeys>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let user = authenticate(req.headers(), &keys)?;
    req.extensions_mut().insert(user);
    Ok(next.run(req).await)
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    JwtKeys: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        // Already resolved by `require_auth`.
        if let Some(user) = parts.extensions.get::<AuthUser>() {
            return Ok(user.clone());
        }
        let keys = JwtKeys::from_ref(state);
        authenticate(&parts.headers, &keys)
    }
}
