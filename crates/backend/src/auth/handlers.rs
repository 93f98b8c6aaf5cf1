//! Authentication HTTP handlers.

use std::net::SocketAddr;

use axum::{
    extract::{ConnectInfo, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Extension, Json,
};
use shared_types::{AuthUserResponse, LoginRequest, RegisterRequest, User};

use crate::db::{get_conn, users};
use crate::error::{ApiError, ApiResult};
use crate::handlers::validated;
use crate::AppState;

use super::{build_auth_cookie, build_logout_cookie, jwt, password, types::AuthUser};

fn session_response(state: &AppState, status: StatusCode, user: User) -> ApiResult<Response> {
    let token = jwt::create_token(&state.auth_config, user.id, &user.email)
        .map_err(|e| ApiError::Internal(anyhow::anyhow!("Failed to create token: {}", e)))?;
    let cookie = build_auth_cookie(&state.auth_config, &token);

    let body = AuthUserResponse {
        id: user.id,
        email: user.email,
        name: user.name,
        token: Some(token),
    };

    Ok((status, [(header::SET_COOKIE, cookie)], Json(body)).into_response())
}

/// Create an account and start a session.
pub async fn register(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    Json(payload): Json<RegisterRequest>,
) -> ApiResult<Response> {
    state.login_limiter.check(addr.ip())?;
    let payload = validated(payload)?;

    let password_hash = password::hash_password(&payload.password)?;

    let mut conn = get_conn(&state.pool).await?;
    let user = users::create(
        &mut conn,
        payload.email.trim(),
        payload.name.as_deref(),
        &password_hash,
    )
    .await?
    .ok_or_else(|| {
        tracing::info!("Registration rejected for existing email");
        ApiError::Conflict("An account with this email already exists".to_string())
    })?;

    tracing::info!(user_id = %user.id, "Registered new user");
    session_response(&state, StatusCode::CREATED, user)
}

/// Exchange email and password for a session.
pub async fn login(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    Json(payload): Json<LoginRequest>,
) -> ApiResult<Response> {
    state.login_limiter.check(addr.ip())?;
    let payload = validated(payload)?;

    let mut conn = get_conn(&state.pool).await?;
    let row = users::find_by_email(&mut conn, payload.email.trim()).await?;

    let Some(row) = row else {
        tracing::warn!("Login attempt for unknown email from {}", addr.ip());
        return Err(ApiError::unauthorized("Invalid email or password"));
    };

    if let Err(e) = password::verify_password(&payload.password, &row.password_hash) {
        tracing::warn!(user_id = %row.id, "Failed login from {}", addr.ip());
        return Err(e);
    }

    tracing::info!(user_id = %row.id, "Successful login");
    session_response(&state, StatusCode::OK, row.into())
}

/// Current authenticated user.
pub async fn me(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> ApiResult<Json<AuthUserResponse>> {
    let mut conn = get_conn(&state.pool).await?;
    let user = users::find_by_id(&mut conn, auth.id)
        .await?
        .ok_or_else(|| ApiError::unauthorized("Account no longer exists"))?;

    Ok(Json(AuthUserResponse {
        id: user.id,
        email: user.email,
        name: user.name,
        token: None,
    }))
}

/// Logout - clear auth cookie.
pub async fn logout(State(state): State<AppState>) -> impl IntoResponse {
    let cookie = build_logout_cookie(&state.auth_config);

    (StatusCode::NO_CONTENT, [(header::SET_COOKIE, cookie)])
}
