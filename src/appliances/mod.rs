pub mod dto;
pub mod handlers;
pub mod repo;
pub mod repo_types;
pub mod services;
mod validation;

use crate::state::AppState;
use axum::Router;

pub use repo::{ApplianceStore, PgApplianceStore};
pub use repo_types::{
    Appliance, ApplianceCondition, CollectionStatus, NewAppliance, RecyclingStatus,
};

pub fn router() -> Router<AppState> {
    handlers::appliance_routes()
}
