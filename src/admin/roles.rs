use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use tracing::{info, instrument};
use uuid::Uuid;

use super::{dto::RoleRequest, ensure_ids_match};
use crate::{
    auth::AdminUser,
    error::{AppError, AppResult},
    identity::Role,
    state::AppState,
};

pub fn role_routes() -> Router<AppState> {
    Router::new()
        .route("/admin/roles", get(list_roles).post(create_role))
        .route(
            "/admin/roles/:id",
            get(get_role).put(rename_role).delete(delete_role),
        )
}

#[instrument(skip(state, _admin))]
pub async fn list_roles(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> AppResult<Json<Vec<Role>>> {
    Ok(Json(state.roles.list().await?))
}

#[instrument(skip(state, _admin))]
pub async fn get_role(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Role>> {
    state
        .roles
        .find_by_id(id)
        .await?
        .map(Json)
        .ok_or(AppError::NotFound("Role"))
}

#[instrument(skip(state, admin, payload), fields(admin_id = %admin.0.id))]
pub async fn create_role(
    State(state): State<AppState>,
    admin: AdminUser,
    payload: Result<Json<RoleRequest>, JsonRejection>,
) -> AppResult<(StatusCode, Json<Role>)> {
    let Json(req) = payload?;
    let name = req.validated_name()?;
    let role = state.roles.create(&name).await?;
    info!(role_id = %role.id, role = %role.name, "role created");
    Ok((StatusCode::CREATED, Json(role)))
}

#[instrument(skip(state, admin, payload), fields(admin_id = %admin.0.id))]
pub async fn rename_role(
    State(state): State<AppState>,
    admin: AdminUser,
    Path(id): Path<Uuid>,
    payload: Result<Json<RoleRequest>, JsonRejection>,
) -> AppResult<Json<Role>> {
    let Json(req) = payload?;
    ensure_ids_match(id, req.id)?;
    if state.roles.find_by_id(id).await?.is_none() {
        return Err(AppError::NotFound("Role"));
    }
    let name = req.validated_name()?;
    state.roles.rename(id, &name).await?;
    info!(role_id = %id, role = %name, "role renamed");
    Ok(Json(Role { id, name }))
}

/// Deleting an unknown role is a no-op.
#[instrument(skip(state, admin), fields(admin_id = %admin.0.id))]
pub async fn delete_role(
    State(state): State<AppState>,
    admin: AdminUser,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    if state.roles.find_by_id(id).await?.is_some() {
        state.roles.delete(id).await?;
        info!(role_id = %id, "role deleted");
    }
    Ok(StatusCode::NO_CONTENT)
}
