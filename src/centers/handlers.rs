use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use tracing::instrument;

use super::repo_types::RecyclingCenter;
use crate::{
    error::{AppError, AppResult},
    state::AppState,
};

pub fn center_routes() -> Router<AppState> {
    Router::new()
        .route("/recycling-centers", get(list_centers))
        .route("/recycling-centers/:id", get(get_center))
}

#[instrument(skip(state))]
pub async fn list_centers(State(state): State<AppState>) -> AppResult<Json<Vec<RecyclingCenter>>> {
    Ok(Json(state.centers.list_active().await?))
}

#[instrument(skip(state))]
pub async fn get_center(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<RecyclingCenter>> {
    state
        .centers
        .find(id)
        .await?
        .map(Json)
        .ok_or(AppError::NotFound("Recycling center"))
}
