use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use shared_types::{CreateWorkplaceRequest, UpdateWorkplaceRequest, WorkplaceResponse};
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::db::get_conn;
use crate::error::ApiResult;
use crate::repository::{UserScopedRepository, Workplaces};
use crate::AppState;

use super::{found, validated};

pub async fn list_workplaces(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<Json<Vec<WorkplaceResponse>>> {
    let mut conn = get_conn(&state.pool).await?;
    let items = Workplaces::list(&mut conn, user.id).await?;
    Ok(Json(items))
}

pub async fn get_workplace(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<WorkplaceResponse>> {
    let mut conn = get_conn(&state.pool).await?;
    let item = Workplaces::get(&mut conn, user.id, id).await?;
    Ok(Json(found(item, Workplaces::RESOURCE)?))
}

pub async fn create_workplace(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<CreateWorkplaceRequest>,
) -> ApiResult<(StatusCode, Json<WorkplaceResponse>)> {
    let payload = validated(payload)?;
    let mut conn = get_conn(&state.pool).await?;
    let created = Workplaces::create(&mut conn, user.id, payload).await?;
    tracing::info!(workplace_id = %created.id, "Created workplace");
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn update_workplace(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateWorkplaceRequest>,
) -> ApiResult<Json<WorkplaceResponse>> {
    let payload = validated(payload)?;
    let mut conn = get_conn(&state.pool).await?;
    let updated = Workplaces::update(&mut conn, user.id, id, payload).await?;
    Ok(Json(found(updated, Workplaces::RESOURCE)?))
}

pub async fn delete_workplace(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    let mut conn = get_conn(&state.pool).await?;
    if Workplaces::delete(&mut conn, user.id, id).await? {
        tracing::info!(workplace_id = %id, "Deleted workplace");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(crate::error::ApiError::not_found(Workplaces::RESOURCE))
    }
}
