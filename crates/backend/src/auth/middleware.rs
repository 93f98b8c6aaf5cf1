//! Authentication middleware layer for protecting routes.

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderMap, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};
use cookie::{time::Duration, Cookie, SameSite};

use crate::error::ApiError;
use crate::AppState;

use super::jwt;
use super::types::{AuthConfig, AuthUser};

/// Middleware function that requires authentication.
///
/// Used with `axum::middleware::from_fn_with_state`. On success the
/// [`AuthUser`] is available to handlers as an `Extension`.
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let config = &state.auth_config;

    let claims = match extract_token(request.headers(), &config.cookie_name) {
        Some(token) => match jwt::validate_token(config, &token) {
            Ok(claims) => claims,
            Err(e) => {
                tracing::debug!("Rejected token: {}", e);
                return ApiError::unauthorized("Invalid or expired token").into_response();
            }
        },
        None => return ApiError::unauthorized("Missing authentication").into_response(),
    };

    let refresh = jwt::should_refresh(&claims);
    let user = AuthUser::from(claims);
    request.extensions_mut().insert(user.clone());

    let response = next.run(request).await;

    if refresh {
        if let Ok(new_token) = jwt::create_token(config, user.id, &user.email) {
            let (mut parts, body) = response.into_parts();
            if let Ok(cookie_value) = build_auth_cookie(config, &new_token).parse() {
                parts.headers.insert(header::SET_COOKIE, cookie_value);
            }
            return Response::from_parts(parts, body);
        }
    }

    response
}

/// Cookie first, then `Authorization: Bearer`.
pub fn extract_token(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    extract_token_from_cookie(headers, cookie_name).or_else(|| extract_token_from_header(headers))
}

fn extract_token_from_cookie(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    let cookie_header = headers.get(header::COOKIE)?.to_str().ok()?;

    Cookie::split_parse(cookie_header)
        .filter_map(Result::ok)
        .find(|cookie| cookie.name() == cookie_name && !cookie.value().is_empty())
        .map(|cookie| cookie.value().to_string())
}

fn extract_token_from_header(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Build the `Set-Cookie` value carrying a session token.
pub fn build_auth_cookie(config: &AuthConfig, token: &str) -> String {
    Cookie::build((config.cookie_name.clone(), token.to_string()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(config.cookie_secure)
        .max_age(Duration::days(config.token_duration_days))
        .build()
        .to_string()
}

/// Build the `Set-Cookie` value that clears the session cookie.
pub fn build_logout_cookie(config: &AuthConfig) -> String {
    Cookie::build((config.cookie_name.clone(), String::new()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(config.cookie_secure)
        .max_age(Duration::ZERO)
        .build()
        .to_string()
}
