use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use tracing::{info, instrument};
use uuid::Uuid;

use super::{
    dto::{CreateUserRequest, EditUserRequest, UserDetails},
    ensure_ids_match,
};
use crate::{
    auth::{password::hash_password, AdminUser},
    error::{AppError, AppResult},
    identity::{ensure_roles_exist, sync_roles, UserWithRoles},
    state::AppState,
};

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/admin/users", get(list_users).post(create_user))
        .route(
            "/admin/users/:id",
            get(get_user).put(edit_user).delete(delete_user),
        )
}

#[instrument(skip(state, _admin))]
pub async fn list_users(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> AppResult<Json<Vec<UserWithRoles>>> {
    Ok(Json(state.users.list_with_roles().await?))
}

#[instrument(skip(state, _admin))]
pub async fn get_user(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<UserDetails>> {
    let user = state
        .users
        .find_by_id(id)
        .await?
        .ok_or(AppError::NotFound("User"))?;
    let roles = state.users.roles_of(id).await?;
    let available_roles = state
        .roles
        .list()
        .await?
        .into_iter()
        .map(|r| r.name)
        .collect();
    Ok(Json(UserDetails {
        id: user.id,
        email: user.email,
        roles,
        available_roles,
    }))
}

/// Accounts created here start without any role.
#[instrument(skip(state, admin, payload), fields(admin_id = %admin.0.id))]
pub async fn create_user(
    State(state): State<AppState>,
    admin: AdminUser,
    payload: Result<Json<CreateUserRequest>, JsonRejection>,
) -> AppResult<(StatusCode, Json<UserWithRoles>)> {
    let Json(req) = payload?;
    let email = req.validate()?;
    let hash = hash_password(&req.password)?;
    let user = state.users.create(&email, &hash).await?;
    info!(user_id = %user.id, "user created by admin");
    Ok((
        StatusCode::CREATED,
        Json(UserWithRoles {
            id: user.id,
            email: user.email,
            roles: Vec::new(),
        }),
    ))
}

#[instrument(skip(state, admin, payload), fields(admin_id = %admin.0.id))]
pub async fn edit_user(
    State(state): State<AppState>,
    admin: AdminUser,
    Path(id): Path<Uuid>,
    payload: Result<Json<EditUserRequest>, JsonRejection>,
) -> AppResult<Json<UserWithRoles>> {
    let Json(req) = payload?;
    ensure_ids_match(id, req.id)?;
    if state.users.find_by_id(id).await?.is_none() {
        return Err(AppError::NotFound("User"));
    }
    let email = req.validate()?;
    ensure_roles_exist(state.roles.as_ref(), &req.roles).await?;

    state.users.update_email(id, &email).await?;
    let changes = sync_roles(state.users.as_ref(), id, &req.roles).await?;
    info!(
        user_id = %id,
        removed = ?changes.to_remove,
        added = ?changes.to_add,
        "user updated"
    );

    Ok(Json(UserWithRoles {
        id,
        email,
        roles: state.users.roles_of(id).await?,
    }))
}

/// Deleting an unknown user is a no-op.
#[instrument(skip(state, admin), fields(admin_id = %admin.0.id))]
pub async fn delete_user(
    State(state): State<AppState>,
    admin: AdminUser,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    if state.users.find_by_id(id).await?.is_some() {
        state.users.delete(id).await?;
        info!(user_id = %id, "user deleted");
    }
    Ok(StatusCode::NO_CONTENT)
}
