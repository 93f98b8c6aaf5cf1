use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::Utc;
use shared_types::{
    CreateStudySessionRequest, NextOccurrenceQuery, NextOccurrenceResponse, OccurrencesQuery,
    OccurrencesResponse, Scheduled, StudySessionResponse, UpdateStudySessionRequest,
};
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::db::get_conn;
use crate::error::{ApiError, ApiResult};
use crate::repository::{StudySessions, UserScopedRepository};
use crate::AppState;

use super::recurrence::{check_schedule, next_response, occurrences_response};
use super::{found, validated};

pub async fn list_study_sessions(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<Json<Vec<StudySessionResponse>>> {
    let mut conn = get_conn(&state.pool).await?;
    let items = StudySessions::list(&mut conn, user.id).await?;
    Ok(Json(items))
}

pub async fn get_study_session(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<StudySessionResponse>> {
    let mut conn = get_conn(&state.pool).await?;
    let session = StudySessions::get(&mut conn, user.id, id).await?;
    Ok(Json(found(session, StudySessions::RESOURCE)?))
}

pub async fn create_study_session(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<CreateStudySessionRequest>,
) -> ApiResult<(StatusCode, Json<StudySessionResponse>)> {
    let payload = validated(payload)?;
    let mut conn = get_conn(&state.pool).await?;

    let created = StudySessions::create(&mut conn, user.id, payload).await?;
    tracing::info!(session_id = %created.id, recurring = created.is_recurring, "Created study session");
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn update_study_session(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateStudySessionRequest>,
) -> ApiResult<Json<StudySessionResponse>> {
    let payload = validated(payload)?;
    let mut conn = get_conn(&state.pool).await?;

    let current = found(
        StudySessions::get(&mut conn, user.id, id).await?,
        StudySessions::RESOURCE,
    )?;
    check_schedule(&payload.merged_recurrence(&current))?;

    let updated = StudySessions::update(&mut conn, user.id, id, payload).await?;
    Ok(Json(found(updated, StudySessions::RESOURCE)?))
}

pub async fn delete_study_session(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    let mut conn = get_conn(&state.pool).await?;
    if StudySessions::delete(&mut conn, user.id, id).await? {
        tracing::info!(session_id = %id, "Deleted study session");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::not_found(StudySessions::RESOURCE))
    }
}

pub async fn study_session_occurrences(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    Query(query): Query<OccurrencesQuery>,
) -> ApiResult<Json<OccurrencesResponse>> {
    let query = validated(query)?;
    let mut conn = get_conn(&state.pool).await?;
    let session = found(
        StudySessions::get(&mut conn, user.id, id).await?,
        StudySessions::RESOURCE,
    )?;

    Ok(Json(occurrences_response(
        &session.recurrence(),
        query.max_instances,
        Utc::now(),
    )))
}

pub async fn next_study_session_occurrence(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    Query(query): Query<NextOccurrenceQuery>,
) -> ApiResult<Json<NextOccurrenceResponse>> {
    let mut conn = get_conn(&state.pool).await?;
    let session = found(
        StudySessions::get(&mut conn, user.id, id).await?,
        StudySessions::RESOURCE,
    )?;

    let now = query.now.unwrap_or_else(Utc::now);
    Ok(Json(next_response(&session.recurrence(), now)))
}
