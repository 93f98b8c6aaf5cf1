use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::Utc;
use shared_types::{
    CreateShiftRequest, ListShiftsQuery, NextOccurrenceQuery, NextOccurrenceResponse,
    OccurrencesQuery, OccurrencesResponse, Scheduled, ShiftResponse, UpdateShiftRequest,
};
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::db::{self, get_conn};
use crate::error::{ApiError, ApiResult};
use crate::repository::{Shifts, UserScopedRepository, Workplaces};
use crate::AppState;

use super::recurrence::{check_schedule, next_response, occurrences_response};
use super::{found, validated};

pub async fn list_shifts(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<ListShiftsQuery>,
) -> ApiResult<Json<Vec<ShiftResponse>>> {
    let mut conn = get_conn(&state.pool).await?;
    let items = db::shifts::list_for_user(&mut conn, user.id, query.workplace_id).await?;
    Ok(Json(items))
}

pub async fn get_shift(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ShiftResponse>> {
    let mut conn = get_conn(&state.pool).await?;
    let shift = Shifts::get(&mut conn, user.id, id).await?;
    Ok(Json(found(shift, Shifts::RESOURCE)?))
}

pub async fn create_shift(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<CreateShiftRequest>,
) -> ApiResult<(StatusCode, Json<ShiftResponse>)> {
    let payload = validated(payload)?;
    let mut conn = get_conn(&state.pool).await?;

    let workplace = Workplaces::get(&mut conn, user.id, payload.workplace_id).await?;
    found(workplace, Workplaces::RESOURCE)?;

    let created = Shifts::create(&mut conn, user.id, payload).await?;
    tracing::info!(shift_id = %created.id, recurring = created.is_recurring, "Created shift");
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn update_shift(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateShiftRequest>,
) -> ApiResult<Json<ShiftResponse>> {
    let payload = validated(payload)?;
    let mut conn = get_conn(&state.pool).await?;

    let current = found(Shifts::get(&mut conn, user.id, id).await?, Shifts::RESOURCE)?;
    check_schedule(&payload.merged_recurrence(&current))?;

    if let Some(workplace_id) = payload.workplace_id {
        let workplace = Workplaces::get(&mut conn, user.id, workplace_id).await?;
        found(workplace, Workplaces::RESOURCE)?;
    }

    let updated = Shifts::update(&mut conn, user.id, id, payload).await?;
    Ok(Json(found(updated, Shifts::RESOURCE)?))
}

pub async fn delete_shift(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    let mut conn = get_conn(&state.pool).await?;
    if Shifts::delete(&mut conn, user.id, id).await? {
        tracing::info!(shift_id = %id, "Deleted shift");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::not_found(Shifts::RESOURCE))
    }
}

pub async fn shift_occurrences(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    Query(query): Query<OccurrencesQuery>,
) -> ApiResult<Json<OccurrencesResponse>> {
    let query = validated(query)?;
    let mut conn = get_conn(&state.pool).await?;
    let shift = found(Shifts::get(&mut conn, user.id, id).await?, Shifts::RESOURCE)?;

    Ok(Json(occurrences_response(
        &shift.recurrence(),
        query.max_instances,
        Utc::now(),
    )))
}

pub async fn next_shift_occurrence(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    Query(query): Query<NextOccurrenceQuery>,
) -> ApiResult<Json<NextOccurrenceResponse>> {
    let mut conn = get_conn(&state.pool).await?;
    let shift = found(Shifts::get(&mut conn, user.id, id).await?, Shifts::RESOURCE)?;

    let now = query.now.unwrap_or_else(Utc::now);
    Ok(Json(next_response(&shift.recurrence(), now)))
}
