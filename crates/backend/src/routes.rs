use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use crate::auth;
use crate::handlers::{calendar, health_check, recurrence, shifts, study_sessions, workplaces};
use crate::AppState;

/// Everything mounted under `/api`.
pub fn api_routes(state: AppState) -> Router<AppState> {
    let public = Router::new()
        .route("/health", get(health_check))
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/logout", post(auth::logout));

    let protected = Router::new()
        .route("/auth/me", get(auth::me))
        // Workplace routes
        .route(
            "/workplaces",
            get(workplaces::list_workplaces).post(workplaces::create_workplace),
        )
        .route(
            "/workplaces/:id",
            get(workplaces::get_workplace)
                .put(workplaces::update_workplace)
                .delete(workplaces::delete_workplace),
        )
        // Shift routes
        .route("/shifts", get(shifts::list_shifts).post(shifts::create_shift))
        .route(
            "/shifts/:id",
            get(shifts::get_shift)
                .put(shifts::update_shift)
                .delete(shifts::delete_shift),
        )
        .route("/shifts/:id/occurrences", get(shifts::shift_occurrences))
        .route("/shifts/:id/next", get(shifts::next_shift_occurrence))
        // Study session routes
        .route(
            "/study-sessions",
            get(study_sessions::list_study_sessions).post(study_sessions::create_study_session),
        )
        .route(
            "/study-sessions/:id",
            get(study_sessions::get_study_session)
                .put(study_sessions::update_study_session)
                .delete(study_sessions::delete_study_session),
        )
        .route(
            "/study-sessions/:id/occurrences",
            get(study_sessions::study_session_occurrences),
        )
        .route(
            "/study-sessions/:id/next",
            get(study_sessions::next_study_session_occurrence),
        )
        // Calendar and dashboard
        .route("/calendar", get(calendar::get_calendar))
        .route("/dashboard", get(calendar::get_dashboard))
        .route("/recurrence/preview", post(recurrence::preview))
        .route_layer(middleware::from_fn_with_state(state, auth::require_auth));

    public.merge(protected)
}
