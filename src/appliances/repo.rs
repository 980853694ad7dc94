use anyhow::Context;
use async_trait::async_trait;
use sqlx::PgPool;
use time::OffsetDateTime;
use uuid::Uuid;

use super::repo_types::{Appliance, NewAppliance};
use crate::policy::ListScope;

/// Persistence boundary for appliance rows.
#[async_trait]
pub trait ApplianceStore: Send + Sync {
    /// Rows visible in `scope`, newest submission first.
    async fn list(&self, scope: ListScope, limit: i64, offset: i64)
        -> anyhow::Result<Vec<Appliance>>;
    async fn count(&self, scope: ListScope) -> anyhow::Result<i64>;
    async fn find(&self, id: i64) -> anyhow::Result<Option<Appliance>>;
    async fn exists(&self, id: i64) -> anyhow::Result<bool>;
    async fn insert(&self, new: NewAppliance) -> anyhow::Result<Appliance>;
    /// Overwrites the row only while its `last_updated` still equals
    /// `expected_last_updated`. Returns `false` when no row matched.
    async fn update(
        &self,
        appliance: &Appliance,
        expected_last_updated: Option<OffsetDateTime>,
    ) -> anyhow::Result<bool>;
    /// Returns whether a row was removed.
    async fn delete(&self, id: i64) -> anyhow::Result<bool>;
    async fn clear(&self) -> anyhow::Result<u64>;
}

macro_rules! appliance_columns {
    () => {
        "id, appliance_type, brand, model_number, year_of_manufacture, condition, description, \
         weight, collection_date, collection_address, collection_fee, status, recycling_status, \
         estimated_value, recycled_value, recycling_comment, date_submitted, last_updated, \
         user_id, customer_name, customer_phone, customer_email"
    };
}

#[derive(Clone)]
pub struct PgApplianceStore {
    db: PgPool,
}

impl PgApplianceStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

fn owner_filter(scope: ListScope) -> Option<Uuid> {
    match scope {
        ListScope::All => None,
        ListScope::OwnedBy(id) => Some(id),
    }
}

#[async_trait]
impl ApplianceStore for PgApplianceStore {
    async fn list(
        &self,
        scope: ListScope,
        limit: i64,
        offset: i64,
    ) -> anyhow::Result<Vec<Appliance>> {
        let rows = sqlx::query_as::<_, Appliance>(concat!(
            "SELECT ",
            appliance_columns!(),
            r#"
            FROM appliances
            WHERE ($1::uuid IS NULL OR user_id = $1)
            ORDER BY date_submitted DESC, id DESC
            LIMIT $2 OFFSET $3
            "#
        ))
        .bind(owner_filter(scope))
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.db)
        .await
        .context("list appliances")?;
        Ok(rows)
    }

    async fn count(&self, scope: ListScope) -> anyhow::Result<i64> {
        let total: i64 = sqlx::query_scalar(
            r#"SELECT COUNT(*) FROM appliances WHERE ($1::uuid IS NULL OR user_id = $1)"#,
        )
        .bind(owner_filter(scope))
        .fetch_one(&self.db)
        .await
        .context("count appliances")?;
        Ok(total)
    }

    async fn find(&self, id: i64) -> anyhow::Result<Option<Appliance>> {
        let row = sqlx::query_as::<_, Appliance>(concat!(
            "SELECT ",
            appliance_columns!(),
            " FROM appliances WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await
        .context("find appliance")?;
        Ok(row)
    }

    async fn exists(&self, id: i64) -> anyhow::Result<bool> {
        let found: bool =
            sqlx::query_scalar(r#"SELECT EXISTS (SELECT 1 FROM appliances WHERE id = $1)"#)
                .bind(id)
                .fetch_one(&self.db)
                .await
                .context("appliance exists")?;
        Ok(found)
    }

    async fn insert(&self, new: NewAppliance) -> anyhow::Result<Appliance> {
        let row = sqlx::query_as::<_, Appliance>(concat!(
            r#"
            INSERT INTO appliances (
                appliance_type, brand, model_number, year_of_manufacture, condition, description,
                weight, collection_date, collection_address, collection_fee, status,
                recycling_status, estimated_value, recycled_value, recycling_comment,
                date_submitted, last_updated, user_id, customer_name, customer_phone,
                customer_email
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17,
                    $18, $19, $20, $21)
            RETURNING "#,
            appliance_columns!()
        ))
        .bind(new.appliance_type)
        .bind(new.brand)
        .bind(new.model_number)
        .bind(new.year_of_manufacture)
        .bind(new.condition)
        .bind(new.description)
        .bind(new.weight)
        .bind(new.collection_date)
        .bind(new.collection_address)
        .bind(new.collection_fee)
        .bind(new.status)
        .bind(new.recycling_status)
        .bind(new.estimated_value)
        .bind(new.recycled_value)
        .bind(new.recycling_comment)
        .bind(new.date_submitted)
        .bind(new.last_updated)
        .bind(new.user_id)
        .bind(new.customer_name)
        .bind(new.customer_phone)
        .bind(new.customer_email)
        .fetch_one(&self.db)
        .await
        .context("insert appliance")?;
        Ok(row)
    }

    async fn update(
        &self,
        a: &Appliance,
        expected_last_updated: Option<OffsetDateTime>,
    ) -> anyhow::Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE appliances SET
                appliance_type = $2, brand = $3, model_number = $4, year_of_manufacture = $5,
                condition = $6, description = $7, weight = $8, collection_date = $9,
                collection_address = $10, collection_fee = $11, status = $12,
                recycling_status = $13, estimated_value = $14, recycled_value = $15,
                recycling_comment = $16, date_submitted = $17, last_updated = $18,
                user_id = $19, customer_name = $20, customer_phone = $21, customer_email = $22
            WHERE id = $1 AND last_updated IS NOT DISTINCT FROM $23
            "#,
        )
        .bind(a.id)
        .bind(&a.appliance_type)
        .bind(&a.brand)
        .bind(&a.model_number)
        .bind(a.year_of_manufacture)
        .bind(a.condition)
        .bind(&a.description)
        .bind(a.weight)
        .bind(a.collection_date)
        .bind(&a.collection_address)
        .bind(a.collection_fee)
        .bind(a.status)
        .bind(a.recycling_status)
        .bind(a.estimated_value)
        .bind(a.recycled_value)
        .bind(&a.recycling_comment)
        .bind(a.date_submitted)
        .bind(a.last_updated)
        .bind(a.user_id)
        .bind(&a.customer_name)
        .bind(&a.customer_phone)
        .bind(&a.customer_email)
        .bind(expected_last_updated)
        .execute(&self.db)
        .await
        .context("update appliance")?;
        Ok(result.rows_affected() == 1)
    }

    async fn delete(&self, id: i64) -> anyhow::Result<bool> {
        let result = sqlx::query(r#"DELETE FROM appliances WHERE id = $1"#)
            .bind(id)
            .execute(&self.db)
            .await
            .context("delete appliance")?;
        Ok(result.rows_affected() > 0)
    }

    async fn clear(&self) -> anyhow::Result<u64> {
        let result = sqlx::query(r#"DELETE FROM appliances"#)
            .execute(&self.db)
            .await
            .context("clear appliances")?;
        Ok(result.rows_affected())
    }
}
