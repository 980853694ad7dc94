use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    routing::get,
    Json, Router,
};
use tracing::instrument;

use super::dto::{
    CreateApplianceRequest, CreatedApplianceResponse, ListQuery, Page, UpdateApplianceRequest,
};
use super::repo_types::Appliance;
use super::services;
use crate::{auth::AuthUser, error::AppResult, state::AppState};

pub const CREATED_MESSAGE: &str = "Appliance collection request submitted successfully!";

pub fn appliance_routes() -> Router<AppState> {
    Router::new()
        .route("/appliances", get(list_appliances).post(create_appliance))
        .route(
            "/appliances/:id",
            get(get_appliance)
                .put(update_appliance)
                .delete(delete_appliance),
        )
}

#[instrument(skip(state, principal), fields(user_id = %principal.id))]
pub async fn list_appliances(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    Query(q): Query<ListQuery>,
) -> AppResult<Json<Page<Appliance>>> {
    let page = services::list_visible(
        state.appliances.as_ref(),
        &principal,
        q.page,
        state.config.appliances_page_size,
    )
    .await?;
    Ok(Json(page))
}

#[instrument(skip(state, principal), fields(user_id = %principal.id))]
pub async fn get_appliance(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    Path(id): Path<i64>,
) -> AppResult<Json<Appliance>> {
    Ok(Json(
        services::get(state.appliances.as_ref(), &principal, id).await?,
    ))
}

#[instrument(skip(state, principal, payload), fields(user_id = %principal.id))]
pub async fn create_appliance(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    payload: Result<Json<CreateApplianceRequest>, JsonRejection>,
) -> AppResult<(StatusCode, HeaderMap, Json<CreatedApplianceResponse>)> {
    let Json(req) = payload?;
    let appliance = services::create(state.appliances.as_ref(), &principal, req).await?;

    let mut headers = HeaderMap::new();
    if let Ok(location) = HeaderValue::from_str(&format!("/api/v1/appliances/{}", appliance.id)) {
        headers.insert(header::LOCATION, location);
    }

    Ok((
        StatusCode::CREATED,
        headers,
        Json(CreatedApplianceResponse {
            message: CREATED_MESSAGE,
            appliance,
        }),
    ))
}

#[instrument(skip(state, principal, payload), fields(user_id = %principal.id))]
pub async fn update_appliance(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    Path(id): Path<i64>,
    payload: Result<Json<UpdateApplianceRequest>, JsonRejection>,
) -> AppResult<Json<Appliance>> {
    let Json(req) = payload?;
    Ok(Json(
        services::update(state.appliances.as_ref(), &principal, id, req).await?,
    ))
}

#[instrument(skip(state, principal), fields(user_id = %principal.id))]
pub async fn delete_appliance(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    Path(id): Path<i64>,
) -> AppResult<StatusCode> {
    services::delete(state.appliances.as_ref(), &principal, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
