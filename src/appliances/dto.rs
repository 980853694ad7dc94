use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use super::repo_types::{
    default_collection_fee, Appliance, ApplianceCondition, CollectionStatus, NewAppliance,
    RecyclingStatus,
};
use super::validation::{self, Submission};
use crate::error::{AppError, AppResult};

/// Fields a caller may set when submitting an appliance. Owner, id and
/// submission time are not part of this shape and are assigned server-side.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateApplianceRequest {
    pub appliance_type: Option<String>,
    pub brand: Option<String>,
    pub model_number: Option<String>,
    pub year_of_manufacture: Option<i32>,
    pub condition: Option<ApplianceCondition>,
    pub description: Option<String>,
    pub weight: Option<Decimal>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub collection_date: Option<OffsetDateTime>,
    pub collection_address: Option<String>,
    pub status: Option<CollectionStatus>,
    pub recycling_status: Option<RecyclingStatus>,
    pub estimated_value: Option<Decimal>,
    pub recycled_value: Option<Decimal>,
    pub customer_name: Option<String>,
    pub customer_phone: Option<String>,
    pub customer_email: Option<String>,
}

impl CreateApplianceRequest {
    fn submission(&self) -> Submission<'_> {
        Submission {
            appliance_type: self.appliance_type.as_deref(),
            has_condition: self.condition.is_some(),
            has_status: self.status.is_some(),
            brand: self.brand.as_deref(),
            model_number: self.model_number.as_deref(),
            description: self.description.as_deref(),
            collection_address: self.collection_address.as_deref(),
            recycling_comment: None,
            customer_name: self.customer_name.as_deref(),
            customer_phone: self.customer_phone.as_deref(),
            customer_email: self.customer_email.as_deref(),
        }
    }

    /// Validates the submission and stamps owner and submission time.
    pub fn into_new(self, owner: Uuid, now: OffsetDateTime) -> AppResult<NewAppliance> {
        validation::validate(&self.submission())?;
        let (Some(appliance_type), Some(condition), Some(status)) =
            (self.appliance_type, self.condition, self.status)
        else {
            return Err(AppError::BadRequest("missing required fields".into()));
        };
        Ok(NewAppliance {
            appliance_type,
            brand: self.brand,
            model_number: self.model_number,
            year_of_manufacture: self.year_of_manufacture,
            condition,
            description: self.description,
            weight: self.weight,
            collection_date: self.collection_date,
            collection_address: self.collection_address,
            collection_fee: default_collection_fee(),
            status,
            recycling_status: self.recycling_status.unwrap_or_default(),
            estimated_value: self.estimated_value,
            recycled_value: self.recycled_value,
            recycling_comment: None,
            date_submitted: now,
            last_updated: None,
            user_id: Some(owner),
            customer_name: self.customer_name,
            customer_phone: self.customer_phone,
            customer_email: self.customer_email,
        })
    }
}

/// Full desired state of an existing appliance.
///
/// `user_id` and `date_submitted` round-trip: when present they are stored as
/// given, when omitted the stored values are kept. Same for `collection_fee`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateApplianceRequest {
    pub id: i64,
    pub appliance_type: Option<String>,
    pub brand: Option<String>,
    pub model_number: Option<String>,
    pub year_of_manufacture: Option<i32>,
    pub condition: Option<ApplianceCondition>,
    pub description: Option<String>,
    pub weight: Option<Decimal>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub collection_date: Option<OffsetDateTime>,
    pub collection_address: Option<String>,
    pub collection_fee: Option<Decimal>,
    pub status: Option<CollectionStatus>,
    pub recycling_status: Option<RecyclingStatus>,
    pub estimated_value: Option<Decimal>,
    pub recycled_value: Option<Decimal>,
    pub recycling_comment: Option<String>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub date_submitted: Option<OffsetDateTime>,
    pub user_id: Option<Uuid>,
    pub customer_name: Option<String>,
    pub customer_phone: Option<String>,
    pub customer_email: Option<String>,
}

impl UpdateApplianceRequest {
    fn submission(&self) -> Submission<'_> {
        Submission {
            appliance_type: self.appliance_type.as_deref(),
            has_condition: self.condition.is_some(),
            has_status: self.status.is_some(),
            brand: self.brand.as_deref(),
            model_number: self.model_number.as_deref(),
            description: self.description.as_deref(),
            collection_address: self.collection_address.as_deref(),
            recycling_comment: self.recycling_comment.as_deref(),
            customer_name: self.customer_name.as_deref(),
            customer_phone: self.customer_phone.as_deref(),
            customer_email: self.customer_email.as_deref(),
        }
    }

    pub fn validate(&self) -> AppResult<()> {
        validation::validate(&self.submission())
    }

    /// Builds the row to persist from the stored one.
    pub fn apply_to(self, existing: &Appliance, now: OffsetDateTime) -> AppResult<Appliance> {
        self.validate()?;
        let (Some(appliance_type), Some(condition), Some(status)) =
            (self.appliance_type, self.condition, self.status)
        else {
            return Err(AppError::BadRequest("missing required fields".into()));
        };
        Ok(Appliance {
            id: existing.id,
            appliance_type,
            brand: self.brand,
            model_number: self.model_number,
            year_of_manufacture: self.year_of_manufacture,
            condition,
            description: self.description,
            weight: self.weight,
            collection_date: self.collection_date,
            collection_address: self.collection_address,
            collection_fee: self.collection_fee.unwrap_or(existing.collection_fee),
            status,
            recycling_status: self.recycling_status.unwrap_or(existing.recycling_status),
            estimated_value: self.estimated_value,
            recycled_value: self.recycled_value,
            recycling_comment: self.recycling_comment,
            date_submitted: self.date_submitted.unwrap_or(existing.date_submitted),
            last_updated: Some(now),
            user_id: self.user_id.or(existing.user_id),
            customer_name: self.customer_name,
            customer_phone: self.customer_phone,
            customer_email: self.customer_email,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub page: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: i64,
    pub page_size: i64,
    pub total_items: i64,
    pub total_pages: i64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, page: i64, page_size: i64, total_items: i64) -> Self {
        let total_pages = if page_size > 0 {
            total_items / page_size + i64::from(total_items % page_size != 0)
        } else {
            0
        };
        Self {
            items,
            page,
            page_size,
            total_items,
            total_pages,
        }
    }
}

/// 1-based page number; absent or non-positive means the first page.
pub fn normalize_page(page: Option<i64>) -> i64 {
    page.filter(|p| *p > 0).unwrap_or(1)
}

#[derive(Debug, Serialize)]
pub struct CreatedApplianceResponse {
    pub message: &'static str,
    pub appliance: Appliance,
}
