use std::time::Duration;

use axum_extra::extract::cookie::{Cookie, SameSite};
use tracing::{error, info, warn};

use crate::auth::{
    dto::{LoginRequest, RegisterRequest},
    repo_types::{NewUser, User},
};
use crate::error::{ApiError, FieldError, StoreError};
use crate::state::AppState;
use crate::validation::{check_length, is_valid_email, normalize};

pub const SESSION_COOKIE: &str = "token";

const INVALID_CREDENTIALS: &str = "Invalid credentials";
const USERNAME_TAKEN: &str = "Username already taken";

/// Registration input after trimming and validation.
#[derive(Debug)]
pub struct Registration {
    pub username: String,
    pub password: String,
    pub email: Option<String>,
}

/// Checks every field and reports all failures at once.
pub fn validate_registration(req: RegisterRequest) -> Result<Registration, ApiError> {
    let username = req.username.map(|u| u.trim().to_string());
    let email = normalize(req.email).map(|e| e.to_lowercase());

    let mut errors = Vec::new();
    check_length(&mut errors, "username", username.as_deref(), 3, 50);
    check_length(&mut errors, "password", req.password.as_deref(), 6, 100);
    if let Some(email) = email.as_deref() {
        if !is_valid_email(email) {
            errors.push(FieldError::new("email", "email is invalid"));
        }
    }

    match (username, req.password) {
        (Some(username), Some(password)) if errors.is_empty() => Ok(Registration {
            username,
            password,
            email,
        }),
        _ => Err(ApiError::Validation(errors)),
    }
}

/// Login only checks presence; anything else is decided by the credential check.
pub fn validate_login(req: LoginRequest) -> Result<(String, String), ApiError> {
    let username = req
        .username
        .map(|u| u.trim().to_string())
        .filter(|u| !u.is_empty());

    let mut errors = Vec::new();
    if username.is_none() {
        errors.push(FieldError::new("username", "username is required"));
    }
    if req.password.is_none() {
        errors.push(FieldError::new("password", "password is required"));
    }

    match (username, req.password) {
        (Some(username), Some(password)) => Ok((username, password)),
        _ => Err(ApiError::Validation(errors)),
    }
}

/// Creates the account. The existence check only saves a hash on the common
/// path; the store's unique constraint is what actually rejects duplicates.
pub async fn register_user(state: &AppState, reg: Registration) -> Result<User, ApiError> {
    match state.users.find_by_username(&reg.username).await {
        Ok(Some(_)) => {
            warn!(username = %reg.username, "username already registered");
            return Err(ApiError::Conflict(USERNAME_TAKEN));
        }
        Ok(None) => {}
        Err(e) => {
            error!(error = %e, "find_by_username failed");
            return Err(e.into());
        }
    }

    let password_hash = state.hasher.hash_blocking(reg.password).await.map_err(|e| {
        error!(error = %e, "hash_password failed");
        ApiError::Internal(e)
    })?;

    let user = state
        .users
        .create(NewUser {
            username: reg.username,
            email: reg.email,
            password_hash,
        })
        .await
        .map_err(|e| match e {
            StoreError::Conflict => {
                warn!("username claimed by a concurrent registration");
                ApiError::Conflict(USERNAME_TAKEN)
            }
            StoreError::Other(e) => {
                error!(error = %e, "create user failed");
                ApiError::Internal(e)
            }
        })?;

    info!(user_id = %user.id, username = %user.username, "user registered");
    Ok(user)
}

/// Unknown user and wrong password produce the same error.
pub async fn authenticate_user(
    state: &AppState,
    username: &str,
    password: String,
) -> Result<User, ApiError> {
    let user = match state.users.find_by_username(username).await {
        Ok(Some(u)) => u,
        Ok(None) => {
            // Same Argon2 work as the wrong-password path.
            state.hasher.verify_decoy_blocking(password).await;
            warn!(username = %username, "login unknown username");
            return Err(ApiError::Unauthorized(INVALID_CREDENTIALS));
        }
        Err(e) => {
            error!(error = %e, "find_by_username failed");
            return Err(e.into());
        }
    };

    let ok = state
        .hasher
        .verify_blocking(password, user.password_hash.clone())
        .await
        .map_err(|e| {
            error!(error = %e, user_id = %user.id, "verify_password failed");
            ApiError::Internal(e)
        })?;

    if !ok {
        warn!(user_id = %user.id, "login invalid password");
        return Err(ApiError::Unauthorized(INVALID_CREDENTIALS));
    }

    info!(user_id = %user.id, "user logged in");
    Ok(user)
}

fn base_cookie(value: String, production: bool) -> Cookie<'static> {
    let same_site = if production {
        SameSite::None
    } else {
        SameSite::Lax
    };
    Cookie::build((SESSION_COOKIE, value))
        .http_only(true)
        .secure(production)
        .same_site(same_site)
        .path("/")
        .build()
}

/// Session cookie whose max-age mirrors the token lifetime.
pub fn session_cookie(token: String, ttl: Duration, production: bool) -> Cookie<'static> {
    let mut cookie = base_cookie(token, production);
    cookie.set_max_age(time::Duration::seconds(
        i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX),
    ));
    cookie
}

/// Expired, empty cookie with the same attributes as the session cookie.
pub fn removal_cookie(production: bool) -> Cookie<'static> {
    let mut cookie = base_cookie(String::new(), production);
    cookie.make_removal();
    cookie
}
