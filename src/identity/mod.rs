//! Users, roles and role memberships.
//!
//! The rest of the crate only needs a stable user id and the role names
//! attached to it; everything else here backs the administration screens and
//! the login flow.

use std::collections::BTreeSet;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;
use time::OffsetDateTime;
use uuid::Uuid;

pub mod repo;

pub use repo::PgIdentity;

#[derive(Debug, Error)]
pub enum IdentityError {
    /// The directory refused the operation; messages are meant for humans.
    #[error("{}", .0.join("; "))]
    Rejected(Vec<String>),

    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

impl IdentityError {
    pub fn rejected(message: impl Into<String>) -> Self {
        IdentityError::Rejected(vec![message.into()])
    }
}

pub type IdentityResult<T> = Result<T, IdentityError>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct UserRecord {
    pub id: Uuid,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct Role {
    pub id: Uuid,
    pub name: String,
}

/// A user together with the names of the roles they hold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserWithRoles {
    pub id: Uuid,
    pub email: String,
    pub roles: Vec<String>,
}

#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<UserRecord>>;
    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<UserRecord>>;
    async fn create(&self, email: &str, password_hash: &str) -> IdentityResult<UserRecord>;
    async fn list_with_roles(&self) -> anyhow::Result<Vec<UserWithRoles>>;
    async fn update_email(&self, id: Uuid, email: &str) -> IdentityResult<()>;
    async fn delete(&self, id: Uuid) -> IdentityResult<()>;
    async fn roles_of(&self, id: Uuid) -> anyhow::Result<Vec<String>>;
    async fn add_to_roles(&self, id: Uuid, roles: &[String]) -> IdentityResult<()>;
    async fn remove_from_roles(&self, id: Uuid, roles: &[String]) -> IdentityResult<()>;
}

#[async_trait]
pub trait RoleDirectory: Send + Sync {
    async fn create(&self, name: &str) -> IdentityResult<Role>;
    async fn list(&self) -> anyhow::Result<Vec<Role>>;
    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<Role>>;
    async fn rename(&self, id: Uuid, name: &str) -> IdentityResult<()>;
    async fn delete(&self, id: Uuid) -> IdentityResult<()>;
}

/// Membership changes that turn `current` into `desired`.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RoleChanges {
    pub to_remove: Vec<String>,
    pub to_add: Vec<String>,
}

impl RoleChanges {
    pub fn is_empty(&self) -> bool {
        self.to_remove.is_empty() && self.to_add.is_empty()
    }
}

pub fn reconcile_roles(current: &[String], desired: &[String]) -> RoleChanges {
    let current: BTreeSet<&String> = current.iter().collect();
    let desired: BTreeSet<&String> = desired.iter().collect();
    RoleChanges {
        to_remove: current.difference(&desired).map(|r| (*r).clone()).collect(),
        to_add: desired.difference(&current).map(|r| (*r).clone()).collect(),
    }
}

/// Rejects role names that are not in the directory.
pub async fn ensure_roles_exist(
    roles: &dyn RoleDirectory,
    names: &[String],
) -> IdentityResult<()> {
    let known: BTreeSet<String> = roles.list().await?.into_iter().map(|r| r.name).collect();
    let missing: Vec<String> = names
        .iter()
        .filter(|name| !known.contains(*name))
        .map(|name| format!("Role {} does not exist.", name))
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(IdentityError::Rejected(missing))
    }
}

/// Applies a desired role list to a user, touching only the differences.
pub async fn sync_roles(
    users: &dyn UserDirectory,
    user_id: Uuid,
    desired: &[String],
) -> IdentityResult<RoleChanges> {
    let current = users.roles_of(user_id).await?;
    let changes = reconcile_roles(&current, desired);
    if !changes.to_remove.is_empty() {
        users.remove_from_roles(user_id, &changes.to_remove).await?;
    }
    if !changes.to_add.is_empty() {
        users.add_to_roles(user_id, &changes.to_add).await?;
    }
    Ok(changes)
}
