use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Directory entry for a physical recycling facility.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct RecyclingCenter {
    pub id: i32,
    pub center_name: String,
    pub address: String,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip_code: Option<String>,
    pub phone_number: Option<String>,
    pub email: Option<String>,
    pub operating_hours: Option<String>,
    pub accepted_appliances: Option<String>,
    pub is_active: bool,
}
