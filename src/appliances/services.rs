use time::OffsetDateTime;
use tracing::{info, warn};

use super::dto::{normalize_page, CreateApplianceRequest, Page, UpdateApplianceRequest};
use super::repo::ApplianceStore;
use super::repo_types::Appliance;
use crate::error::{AppError, AppResult};
use crate::policy::{Decision, Operation, Policy, Principal};

fn ensure_allowed(principal: &Principal, appliance: &Appliance, op: Operation) -> AppResult<()> {
    match Policy::for_principal(principal).authorize(principal, appliance.user_id, op) {
        Decision::Allowed => Ok(()),
        Decision::Denied => {
            warn!(
                user_id = %principal.id,
                appliance_id = appliance.id,
                op = ?op,
                "appliance access denied"
            );
            Err(AppError::Forbidden)
        }
    }
}

/// Loads a record and checks `op` against it. Missing ids are reported
/// before ownership is looked at.
async fn load_authorized(
    store: &dyn ApplianceStore,
    principal: &Principal,
    id: i64,
    op: Operation,
) -> AppResult<Appliance> {
    let appliance = store
        .find(id)
        .await?
        .ok_or(AppError::NotFound("Appliance"))?;
    ensure_allowed(principal, &appliance, op)?;
    Ok(appliance)
}

pub async fn list_visible(
    store: &dyn ApplianceStore,
    principal: &Principal,
    page: Option<i64>,
    page_size: i64,
) -> AppResult<Page<Appliance>> {
    let scope = Policy::for_principal(principal).list_scope(principal);
    let page = normalize_page(page);
    let total = store.count(scope).await?;
    let items = store
        .list(scope, page_size, (page - 1).saturating_mul(page_size))
        .await?;
    Ok(Page::new(items, page, page_size, total))
}

pub async fn get(store: &dyn ApplianceStore, principal: &Principal, id: i64) -> AppResult<Appliance> {
    load_authorized(store, principal, id, Operation::View).await
}

pub async fn create(
    store: &dyn ApplianceStore,
    principal: &Principal,
    req: CreateApplianceRequest,
) -> AppResult<Appliance> {
    let new = req.into_new(principal.id, OffsetDateTime::now_utc())?;
    let appliance = store.insert(new).await?;
    info!(user_id = %principal.id, appliance_id = appliance.id, "appliance submitted");
    Ok(appliance)
}

pub async fn update(
    store: &dyn ApplianceStore,
    principal: &Principal,
    path_id: i64,
    req: UpdateApplianceRequest,
) -> AppResult<Appliance> {
    if path_id != req.id {
        return Err(AppError::BadRequest(format!(
            "path id {} does not match payload id {}",
            path_id, req.id
        )));
    }

    let existing = load_authorized(store, principal, path_id, Operation::Edit).await?;
    let updated = req.apply_to(&existing, OffsetDateTime::now_utc())?;

    if store.update(&updated, existing.last_updated).await? {
        info!(user_id = %principal.id, appliance_id = updated.id, "appliance updated");
        return Ok(updated);
    }

    if !store.exists(path_id).await? {
        warn!(appliance_id = path_id, "appliance vanished during update");
        return Err(AppError::NotFound("Appliance"));
    }
    warn!(appliance_id = path_id, "concurrent update detected");
    Err(AppError::Conflict(format!(
        "appliance {} was modified by another request",
        path_id
    )))
}

/// Idempotent: a missing id is reported as success.
pub async fn delete(store: &dyn ApplianceStore, principal: &Principal, id: i64) -> AppResult<()> {
    let Some(appliance) = store.find(id).await? else {
        return Ok(());
    };
    ensure_allowed(principal, &appliance, Operation::Delete)?;
    store.delete(id).await?;
    info!(user_id = %principal.id, appliance_id = id, "appliance deleted");
    Ok(())
}
