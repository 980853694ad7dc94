use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "appliance_condition", rename_all = "snake_case")]
pub enum ApplianceCondition {
    Working,
    PartiallyWorking,
    NotWorking,
    ForParts,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "collection_status", rename_all = "snake_case")]
pub enum CollectionStatus {
    #[default]
    Pending,
    Scheduled,
    InTransit,
    Collected,
    Cancelled,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "recycling_status", rename_all = "snake_case")]
pub enum RecyclingStatus {
    #[default]
    NotProcessed,
    InProcessing,
    Recycled,
    Disposed,
    Resold,
}

pub fn default_collection_fee() -> Decimal {
    Decimal::from(50)
}

/// Appliance row as stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Appliance {
    pub id: i64,
    pub appliance_type: String,
    pub brand: Option<String>,
    pub model_number: Option<String>,
    pub year_of_manufacture: Option<i32>,
    pub condition: ApplianceCondition,
    pub description: Option<String>,
    pub weight: Option<Decimal>,
    #[serde(with = "time::serde::rfc3339::option")]
    pub collection_date: Option<OffsetDateTime>,
    pub collection_address: Option<String>,
    pub collection_fee: Decimal,
    pub status: CollectionStatus,
    pub recycling_status: RecyclingStatus,
    pub estimated_value: Option<Decimal>,
    pub recycled_value: Option<Decimal>,
    pub recycling_comment: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub date_submitted: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339::option")]
    pub last_updated: Option<OffsetDateTime>,
    pub user_id: Option<Uuid>,
    pub customer_name: Option<String>,
    pub customer_phone: Option<String>,
    pub customer_email: Option<String>,
}

/// Everything needed to insert a row; the store assigns `id`.
#[derive(Debug, Clone, PartialEq)]
pub struct NewAppliance {
    pub appliance_type: String,
    pub brand: Option<String>,
    pub model_number: Option<String>,
    pub year_of_manufacture: Option<i32>,
    pub condition: ApplianceCondition,
    pub description: Option<String>,
    pub weight: Option<Decimal>,
    pub collection_date: Option<OffsetDateTime>,
    pub collection_address: Option<String>,
    pub collection_fee: Decimal,
    pub status: CollectionStatus,
    pub recycling_status: RecyclingStatus,
    pub estimated_value: Option<Decimal>,
    pub recycled_value: Option<Decimal>,
    pub recycling_comment: Option<String>,
    pub date_submitted: OffsetDateTime,
    pub last_updated: Option<OffsetDateTime>,
    pub user_id: Option<Uuid>,
    pub customer_name: Option<String>,
    pub customer_phone: Option<String>,
    pub customer_email: Option<String>,
}

impl NewAppliance {
    pub fn with_id(self, id: i64) -> Appliance {
        Appliance {
            id,
            appliance_type: self.appliance_type,
            brand: self.brand,
            model_number: self.model_number,
            year_of_manufacture: self.year_of_manufacture,
            condition: self.condition,
            description: self.description,
            weight: self.weight,
            collection_date: self.collection_date,
            collection_address: self.collection_address,
            collection_fee: self.collection_fee,
            status: self.status,
            recycling_status: self.recycling_status,
            estimated_value: self.estimated_value,
            recycled_value: self.recycled_value,
            recycling_comment: self.recycling_comment,
            date_submitted: self.date_submitted,
            last_updated: self.last_updated,
            user_id: self.user_id,
            customer_name: self.customer_name,
            customer_phone: self.customer_phone,
            customer_email: self.customer_email,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enums_serialize_as_variant_names() {
        assert_eq!(
            serde_json::to_string(&ApplianceCondition::PartiallyWorking).unwrap(),
            "\"PartiallyWorking\""
        );
        assert_eq!(
            serde_json::from_str::<CollectionStatus>("\"InTransit\"").unwrap(),
            CollectionStatus::InTransit
        );
    }

    #[test]
    fn workflow_defaults() {
        assert_eq!(CollectionStatus::default(), CollectionStatus::Pending);
        assert_eq!(RecyclingStatus::default(), RecyclingStatus::NotProcessed);
        assert_eq!(default_collection_fee(), Decimal::from(50));
    }
}
