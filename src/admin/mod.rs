//! Role and user administration, restricted to the `Admin` role.

pub mod dto;
pub mod roles;
pub mod users;

use axum::Router;
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .merge(roles::role_routes())
        .merge(users::user_routes())
}

/// A payload id, when present, must name the same record as the path.
fn ensure_ids_match(path_id: Uuid, payload_id: Option<Uuid>) -> AppResult<()> {
    match payload_id {
        Some(body_id) if body_id != path_id => Err(AppError::BadRequest(format!(
            "path id {} does not match payload id {}",
            path_id, body_id
        ))),
        _ => Ok(()),
    }
}
