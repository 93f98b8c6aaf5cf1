use axum::{
    http::{header, Method},
    Router,
};
use std::net::SocketAddr;
use std::time::Duration;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    services::{ServeDir, ServeFile},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod auth;
mod config;
mod db;
pub mod error;
mod handlers;
mod models;
mod rate_limit;
pub mod repository;
mod routes;
mod schema;
mod services;

use crate::auth::AuthConfig;
use crate::config::AppConfig;
use crate::db::DbPool;
use crate::rate_limit::LoginRateLimiter;

const LIMITER_PRUNE_INTERVAL: Duration = Duration::from_secs(60);

/// Shared handler state. Every field is cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub auth_config: AuthConfig,
    pub login_limiter: LoginRateLimiter,
}

impl AppState {
    pub fn new(pool: DbPool, config: &AppConfig) -> Self {
        AppState {
            pool,
            auth_config: AuthConfig::from(config),
            login_limiter: LoginRateLimiter::per_minute(config.login_rate_limit_per_minute),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "backend=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env()?;

    tracing::info!("Starting ShiftSync backend");

    let pool = db::establish_connection_pool(&config)?;
    tracing::info!(
        size = config.database_pool_size,
        tls = config.database_tls,
        "Database connection pool initialized"
    );

    let state = AppState::new(pool, &config);
    spawn_limiter_pruning(state.login_limiter.clone());

    let app = build_app(state, &config);

    // Serve static frontend files if the directory exists
    let app = if std::path::Path::new(&config.frontend_dir).exists() {
        tracing::info!("Serving frontend from {}", config.frontend_dir);
        let index_path = format!("{}/index.html", config.frontend_dir);
        let serve_dir =
            ServeDir::new(&config.frontend_dir).not_found_service(ServeFile::new(&index_path));
        app.fallback_service(serve_dir)
    } else {
        tracing::info!(
            "Frontend directory not found at {}, serving API only",
            config.frontend_dir
        );
        app
    };

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}

/// Periodically drops replenished rate limiter buckets.
fn spawn_limiter_pruning(limiter: LoginRateLimiter) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(LIMITER_PRUNE_INTERVAL);
        loop {
            ticker.tick().await;
            limiter.prune();
        }
    });
}

fn build_app(state: AppState, config: &AppConfig) -> Router {
    Router::new()
        .nest("/api", routes::api_routes(state.clone()))
        .layer(TraceLayer::new_for_http())
        .layer(build_cors_layer(config))
        .with_state(state)
}

/// Build CORS layer based on environment configuration.
///
/// If CORS_ALLOWED_ORIGINS is set, only those origins are allowed.
/// If not set, defaults to permissive CORS (for development only).
fn build_cors_layer(config: &AppConfig) -> CorsLayer {
    let origins: Vec<_> = config
        .cors_origins()
        .iter()
        .filter_map(|s| s.parse().ok())
        .collect();

    if origins.is_empty() {
        tracing::warn!(
            "CORS_ALLOWED_ORIGINS not set, using permissive CORS (not recommended for production)"
        );
        return CorsLayer::permissive();
    }

    tracing::info!("CORS configured for origins: {:?}", origins);
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .allow_credentials(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::{to_bytes, Body},
        extract::ConnectInfo,
        http::{Request, StatusCode},
    };
    use shared_types::{ErrorResponse, HealthResponse, RecurrencePreviewResponse};
    use tower::ServiceExt;
    use uuid::Uuid;

    fn test_app(config: &AppConfig) -> Router {
        // Building the pool does not connect, so these tests need no database.
        let pool = db::establish_connection_pool(config).expect("pool");
        build_app(AppState::new(pool, config), config)
    }

    fn bearer(config: &AppConfig) -> String {
        let token = auth::create_token(&AuthConfig::from(config), Uuid::new_v4(), "a@b.com")
            .expect("token");
        format!("Bearer {}", token)
    }

    fn with_peer(mut request: Request<Body>) -> Request<Body> {
        request
            .extensions_mut()
            .insert(ConnectInfo(SocketAddr::from(([127, 0, 0, 1], 4000))));
        request
    }

    async fn body_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        serde_json::from_slice(&bytes).expect("json")
    }

    #[tokio::test]
    async fn test_health() {
        let app = test_app(&AppConfig::for_tests());
        let response = app
            .oneshot(Request::get("/api/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let health: HealthResponse = body_json(response).await;
        assert_eq!(health.status, "ok");
    }

    #[tokio::test]
    async fn test_protected_routes_require_auth() {
        let config = AppConfig::for_tests();
        for path in ["/api/shifts", "/api/workplaces", "/api/calendar", "/api/auth/me"] {
            let response = test_app(&config)
                .oneshot(Request::get(path).body(Body::empty()).unwrap())
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{}", path);
        }

        let response = test_app(&config)
            .oneshot(
                Request::get("/api/dashboard")
                    .header(header::AUTHORIZATION, "Bearer not-a-jwt")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let error: ErrorResponse = body_json(response).await;
        assert_eq!(error.error, "Invalid or expired token");
    }

    #[tokio::test]
    async fn test_preview_expands_template() {
        let config = AppConfig::for_tests();
        let body = r#"{
            "start_datetime": "2024-01-01T10:00:00Z",
            "end_datetime": "2024-01-01T11:00:00Z",
            "is_recurring": true,
            "recurrence_pattern": "daily",
            "recurrence_end_date": "2024-01-22",
            "now": "2024-01-10T12:00:00Z"
        }"#;

        let response = test_app(&config)
            .oneshot(
                Request::post("/api/recurrence/preview")
                    .header(header::AUTHORIZATION, bearer(&config))
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let preview: RecurrencePreviewResponse = body_json(response).await;
        assert_eq!(preview.recurrence_label, "Every Day");
        assert!(preview.is_active);
        assert_eq!(preview.occurrences.len(), 22);
        assert_eq!(
            preview.next_occurrence.map(|o| o.start_datetime.to_rfc3339()),
            Some("2024-01-11T10:00:00+00:00".to_string())
        );
    }

    #[tokio::test]
    async fn test_preview_rejects_invalid_template() {
        let config = AppConfig::for_tests();
        let body = r#"{
            "start_datetime": "2024-01-01T10:00:00Z",
            "end_datetime": "2024-01-01T09:00:00Z",
            "is_recurring": true
        }"#;

        let response = test_app(&config)
            .oneshot(
                Request::post("/api/recurrence/preview")
                    .header(header::AUTHORIZATION, bearer(&config))
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_calendar_window_too_long() {
        let config = AppConfig::for_tests();
        let response = test_app(&config)
            .oneshot(
                Request::get("/api/calendar?from=2024-01-01T00:00:00Z&to=2025-06-01T00:00:00Z")
                    .header(header::AUTHORIZATION, bearer(&config))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_login_rate_limited_before_database() {
        let mut config = AppConfig::for_tests();
        config.login_rate_limit_per_minute = 1;
        let app = test_app(&config);

        // Invalid bodies fail validation without touching the database, but
        // still consume the caller's budget.
        let login = || {
            with_peer(
                Request::post("/api/auth/login")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"email":"not-an-email","password":"x"}"#))
                    .unwrap(),
            )
        };

        let first = app.clone().oneshot(login()).await.unwrap();
        assert_eq!(first.status(), StatusCode::BAD_REQUEST);

        let second = app.oneshot(login()).await.unwrap();
        assert_eq!(second.status(), StatusCode::TOO_MANY_REQUESTS);
    }

    #[tokio::test]
    async fn test_logout_clears_cookie() {
        let response = test_app(&AppConfig::for_tests())
            .oneshot(
                Request::post("/api/auth/logout")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        let cookie = response
            .headers()
            .get(header::SET_COOKIE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        assert!(cookie.starts_with("shiftsync_token=;"));
        assert!(cookie.contains("Max-Age=0"));
    }
}
