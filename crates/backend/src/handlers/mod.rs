use axum::Json;
use shared_types::HealthResponse;
use validator::Validate;

use crate::error::{ApiError, ApiResult};

pub mod calendar;
pub mod recurrence;
pub mod shifts;
pub mod study_sessions;
pub mod workplaces;

/// Run field validation on a request body.
pub fn validated<T: Validate>(payload: T) -> ApiResult<T> {
    payload.validate()?;
    Ok(payload)
}

/// Turn a scoped lookup into a 404 when the row is missing or not the caller's.
pub fn found<T>(item: Option<T>, resource: &str) -> ApiResult<T> {
    item.ok_or_else(|| ApiError::not_found(resource))
}

pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}
