use anyhow::Context;
use async_trait::async_trait;
use sqlx::PgPool;

use super::repo_types::RecyclingCenter;

#[async_trait]
pub trait CenterStore: Send + Sync {
    /// Active centers, ordered by name.
    async fn list_active(&self) -> anyhow::Result<Vec<RecyclingCenter>>;
    /// Any center by id, active or not.
    async fn find(&self, id: i32) -> anyhow::Result<Option<RecyclingCenter>>;
}

#[derive(Clone)]
pub struct PgCenterStore {
    db: PgPool,
}

impl PgCenterStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl CenterStore for PgCenterStore {
    async fn list_active(&self) -> anyhow::Result<Vec<RecyclingCenter>> {
        let rows = sqlx::query_as::<_, RecyclingCenter>(
            r#"
            SELECT id, center_name, address, city, state, zip_code, phone_number, email,
                   operating_hours, accepted_appliances, is_active
            FROM recycling_centers
            WHERE is_active
            ORDER BY center_name ASC
            "#,
        )
        .fetch_all(&self.db)
        .await
        .context("list active recycling centers")?;
        Ok(rows)
    }

    async fn find(&self, id: i32) -> anyhow::Result<Option<RecyclingCenter>> {
        let row = sqlx::query_as::<_, RecyclingCenter>(
            r#"
            SELECT id, center_name, address, city, state, zip_code, phone_number, email,
                   operating_hours, accepted_appliances, is_active
            FROM recycling_centers
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await
        .context("find recycling center")?;
        Ok(row)
    }
}
