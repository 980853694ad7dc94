pub mod handlers;
pub mod repo;
pub mod repo_types;

use crate::state::AppState;
use axum::Router;

pub use repo::{CenterStore, PgCenterStore};
pub use repo_types::RecyclingCenter;

pub fn router() -> Router<AppState> {
    handlers::center_routes()
}
