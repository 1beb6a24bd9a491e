/// Authentication endpoints
///
/// Login verifies credentials and issues a one-hour bearer token. The
/// failure message is identical for an unknown username and a wrong
/// password so the endpoint does not leak which usernames exist.

use crate::{
    app::AppState,
    config::AdminConfig,
    error::{ApiError, ApiResult},
};
use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tripledger_shared::{
    auth::{jwt, password},
    models::user::{CreateUser, User},
};

/// Login request
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: Option<String>,
    pub password: Option<String>,
}

/// Login response carrying the bearer token
#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
}

/// POST /auth/login
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    let username = payload
        .username
        .as_deref()
        .filter(|u| !u.trim().is_empty())
        .ok_or_else(|| ApiError::Validation("username is required".to_string()))?;
    let plain = payload
        .password
        .as_deref()
        .filter(|p| !p.is_empty())
        .ok_or_else(|| ApiError::Validation("password is required".to_string()))?;

    let invalid = || ApiError::Unauthorized("Invalid username or password".to_string());

    let user = User::find_by_username(&state.db, username)
        .await?
        .ok_or_else(invalid)?;

    if !password::verify_password(plain, &user.password_hash)? {
        return Err(invalid());
    }

    let claims = jwt::Claims::new(user.id, user.username.clone());
    let token = jwt::create_token(&claims, state.jwt_secret())?;

    tracing::info!(username = %user.username, "User logged in");

    Ok(Json(LoginResponse {
        access_token: token,
        token_type: "bearer".to_string(),
        expires_in: jwt::TOKEN_LIFETIME_SECONDS,
    }))
}

/// Setup response
#[derive(Debug, Serialize)]
pub struct SetupAdminResponse {
    pub message: String,
    pub username: String,
}

/// POST /auth/setup_admin
///
/// Creates the default admin account from startup configuration.
/// Conflicts once the account exists, so this is safe to expose during
/// first-run provisioning only.
pub async fn setup_admin(
    State(state): State<AppState>,
) -> ApiResult<(StatusCode, Json<SetupAdminResponse>)> {
    let admin = &state.config.admin;

    if !ensure_admin(&state.db, admin)
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?
    {
        return Err(ApiError::AlreadyExists(
            "Admin user already exists".to_string(),
        ));
    }

    Ok((
        StatusCode::CREATED,
        Json(SetupAdminResponse {
            message: "Admin user created".to_string(),
            username: admin.username.clone(),
        }),
    ))
}

/// Creates the admin account if absent
///
/// Returns true when the account was created, false when it already
/// existed. Shared between the setup endpoint and startup bootstrap.
pub async fn ensure_admin(pool: &PgPool, admin: &AdminConfig) -> anyhow::Result<bool> {
    if User::find_by_username(pool, &admin.username)
        .await?
        .is_some()
    {
        return Ok(false);
    }

    let password_hash = password::hash_password(&admin.password)?;

    let user = User::create(
        pool,
        CreateUser {
            username: admin.username.clone(),
            password_hash,
        },
    )
    .await?;

    tracing::info!(username = %user.username, "Admin user created");

    Ok(true)
}
