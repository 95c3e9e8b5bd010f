use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use axum_extra::extract::cookie::CookieJar;
use tracing::{error, instrument};

use crate::{
    auth::{
        dto::{LoginRequest, MessageResponse, PublicUser, RegisterRequest},
        extractors::AuthUser,
        repo_types::User,
        services::{
            authenticate_user, register_user, removal_cookie, session_cookie,
            validate_login, validate_registration,
        },
    },
    error::{ApiError, ApiResult},
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/logout", post(logout))
        .route("/auth/me", get(me))
}

/// Signs a token for `user` and puts it in the session cookie.
fn start_session(state: &AppState, jar: CookieJar, user: &User) -> ApiResult<CookieJar> {
    let token = state.keys.issue(user).map_err(|e| {
        error!(error = %e, "jwt sign failed");
        ApiError::Internal(e)
    })?;
    let cookie = session_cookie(token, state.keys.ttl(), state.config.environment.is_production());
    Ok(jar.add(cookie))
}

fn public(user: &User) -> PublicUser {
    PublicUser {
        id: user.id,
        username: user.username.clone(),
    }
}

#[instrument(skip(state, jar, payload))]
pub async fn register(
    State(state): State<AppState>,
    jar: CookieJar,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, CookieJar, Json<PublicUser>)> {
    let Json(payload) = payload?;
    let registration = validate_registration(payload)?;
    let user = register_user(&state, registration).await?;
    let jar = start_session(&state, jar, &user)?;
    Ok((StatusCode::CREATED, jar, Json(public(&user))))
}

#[instrument(skip(state, jar, payload))]
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<(CookieJar, Json<PublicUser>)> {
    let Json(payload) = payload?;
    let (username, password) = validate_login(payload)?;
    let user = authenticate_user(&state, &username, password).await?;
    let jar = start_session(&state, jar, &user)?;
    Ok((jar, Json(public(&user))))
}

/// Always succeeds. Only the cookie is cleared; a copy of the token used as a
/// bearer header stays valid until it expires.
#[instrument(skip(state, jar))]
pub async fn logout(
    State(state): State<AppState>,
    jar: CookieJar,
) -> (CookieJar, Json<MessageResponse>) {
    let jar = jar.add(removal_cookie(state.config.environment.is_production()));
    (jar, Json(MessageResponse { message: "Logged out" }))
}

/// Returns the identity embedded in the token; no store lookup.
#[instrument(skip(user), fields(user_id = %user.id))]
pub async fn me(user: AuthUser) -> Json<PublicUser> {
    Json(PublicUser {
        id: user.id,
        username: user.username,
    })
}
