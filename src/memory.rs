//! In-process implementations of the store and directory traits, used by
//! `AppState::fake()` and the test suites.

use std::collections::{BTreeMap, BTreeSet};

use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::appliances::{Appliance, ApplianceStore, NewAppliance};
use crate::centers::{CenterStore, RecyclingCenter};
use crate::identity::{
    IdentityError, IdentityResult, Role, RoleDirectory, UserDirectory, UserRecord, UserWithRoles,
};
use crate::policy::{ListScope, ADMIN_ROLE, USER_ROLE};

#[derive(Default)]
struct ApplianceRows {
    next_id: i64,
    rows: BTreeMap<i64, Appliance>,
}

#[derive(Default)]
pub struct MemoryApplianceStore {
    inner: Mutex<ApplianceRows>,
}

impl MemoryApplianceStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn to_usize(v: i64) -> usize {
    usize::try_from(v).unwrap_or(0)
}

#[async_trait]
impl ApplianceStore for MemoryApplianceStore {
    async fn list(
        &self,
        scope: ListScope,
        limit: i64,
        offset: i64,
    ) -> anyhow::Result<Vec<Appliance>> {
        let inner = self.inner.lock().await;
        let mut rows: Vec<Appliance> = inner
            .rows
            .values()
            .filter(|a| scope.includes(a.user_id))
            .cloned()
            .collect();
        rows.sort_by(|a, b| {
            b.date_submitted
                .cmp(&a.date_submitted)
                .then_with(|| b.id.cmp(&a.id))
        });
        Ok(rows
            .into_iter()
            .skip(to_usize(offset))
            .take(to_usize(limit))
            .collect())
    }

    async fn count(&self, scope: ListScope) -> anyhow::Result<i64> {
        let inner = self.inner.lock().await;
        let n = inner
            .rows
            .values()
            .filter(|a| scope.includes(a.user_id))
            .count();
        Ok(i64::try_from(n)?)
    }

    async fn find(&self, id: i64) -> anyhow::Result<Option<Appliance>> {
        Ok(self.inner.lock().await.rows.get(&id).cloned())
    }

    async fn exists(&self, id: i64) -> anyhow::Result<bool> {
        Ok(self.inner.lock().await.rows.contains_key(&id))
    }

    async fn insert(&self, new: NewAppliance) -> anyhow::Result<Appliance> {
        let mut inner = self.inner.lock().await;
        inner.next_id += 1;
        let appliance = new.with_id(inner.next_id);
        inner.rows.insert(appliance.id, appliance.clone());
        Ok(appliance)
    }

    async fn update(
        &self,
        appliance: &Appliance,
        expected_last_updated: Option<OffsetDateTime>,
    ) -> anyhow::Result<bool> {
        let mut inner = self.inner.lock().await;
        match inner.rows.get_mut(&appliance.id) {
            Some(row) if row.last_updated == expected_last_updated => {
                *row = appliance.clone();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn delete(&self, id: i64) -> anyhow::Result<bool> {
        Ok(self.inner.lock().await.rows.remove(&id).is_some())
    }

    async fn clear(&self) -> anyhow::Result<u64> {
        let mut inner = self.inner.lock().await;
        let n = inner.rows.len();
        inner.rows.clear();
        Ok(u64::try_from(n)?)
    }
}

pub struct MemoryCenterStore {
    centers: Vec<RecyclingCenter>,
}

impl MemoryCenterStore {
    pub fn new(centers: Vec<RecyclingCenter>) -> Self {
        Self { centers }
    }

    /// The two centers every fresh database starts with.
    pub fn with_defaults() -> Self {
        Self::new(vec![
            RecyclingCenter {
                id: 1,
                center_name: "Green Tech Recycling".into(),
                address: "123 Eco Street".into(),
                city: Some("Springfield".into()),
                state: Some("IL".into()),
                zip_code: Some("62701".into()),
                phone_number: Some("555-0100".into()),
                email: Some("info@greentech.com".into()),
                operating_hours: Some("Mon-Fri 8AM-5PM".into()),
                accepted_appliances: Some("Refrigerators, Washers, Dryers, Dishwashers".into()),
                is_active: true,
            },
            RecyclingCenter {
                id: 2,
                center_name: "Eco Appliance Solutions".into(),
                address: "456 Recycle Avenue".into(),
                city: Some("Springfield".into()),
                state: Some("IL".into()),
                zip_code: Some("62702".into()),
                phone_number: Some("555-0200".into()),
                email: Some("contact@ecoapp.com".into()),
                operating_hours: Some("Mon-Sat 9AM-6PM".into()),
                accepted_appliances: Some("All major appliances, Small electronics".into()),
                is_active: true,
            },
        ])
    }
}

#[async_trait]
impl CenterStore for MemoryCenterStore {
    async fn list_active(&self) -> anyhow::Result<Vec<RecyclingCenter>> {
        let mut active: Vec<RecyclingCenter> =
            self.centers.iter().filter(|c| c.is_active).cloned().collect();
        active.sort_by(|a, b| a.center_name.cmp(&b.center_name));
        Ok(active)
    }

    async fn find(&self, id: i32) -> anyhow::Result<Option<RecyclingCenter>> {
        Ok(self.centers.iter().find(|c| c.id == id).cloned())
    }
}

#[derive(Default)]
struct IdentityTables {
    users: BTreeMap<Uuid, UserRecord>,
    roles: BTreeMap<Uuid, Role>,
    memberships: BTreeSet<(Uuid, Uuid)>,
}

impl IdentityTables {
    fn role_id(&self, name: &str) -> Option<Uuid> {
        self.roles.values().find(|r| r.name == name).map(|r| r.id)
    }

    fn role_names(&self, user_id: Uuid) -> Vec<String> {
        let mut names: Vec<String> = self
            .memberships
            .iter()
            .filter(|(u, _)| *u == user_id)
            .filter_map(|(_, r)| self.roles.get(r).map(|role| role.name.clone()))
            .collect();
        names.sort();
        names
    }

    fn email_taken(&self, email: &str, except: Option<Uuid>) -> bool {
        self.users
            .values()
            .any(|u| u.email == email && Some(u.id) != except)
    }
}

#[derive(Default)]
pub struct MemoryIdentity {
    inner: Mutex<IdentityTables>,
}

impl MemoryIdentity {
    pub fn new() -> Self {
        Self::default()
    }

    /// Directory preloaded with the `Admin` and `User` roles.
    pub fn with_default_roles() -> Self {
        let mut tables = IdentityTables::default();
        for name in [ADMIN_ROLE, USER_ROLE] {
            let id = Uuid::new_v4();
            tables.roles.insert(
                id,
                Role {
                    id,
                    name: name.to_string(),
                },
            );
        }
        Self {
            inner: Mutex::new(tables),
        }
    }
}

#[async_trait]
impl UserDirectory for MemoryIdentity {
    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<UserRecord>> {
        Ok(self.inner.lock().await.users.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<UserRecord>> {
        let inner = self.inner.lock().await;
        Ok(inner.users.values().find(|u| u.email == email).cloned())
    }

    async fn create(&self, email: &str, password_hash: &str) -> IdentityResult<UserRecord> {
        let mut inner = self.inner.lock().await;
        if inner.email_taken(email, None) {
            return Err(IdentityError::rejected(format!(
                "Email '{}' is already taken.",
                email
            )));
        }
        let user = UserRecord {
            id: Uuid::new_v4(),
            email: email.to_string(),
            password_hash: password_hash.to_string(),
            created_at: OffsetDateTime::now_utc(),
        };
        inner.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn list_with_roles(&self) -> anyhow::Result<Vec<UserWithRoles>> {
        let inner = self.inner.lock().await;
        let mut users: Vec<UserWithRoles> = inner
            .users
            .values()
            .map(|u| UserWithRoles {
                id: u.id,
                email: u.email.clone(),
                roles: inner.role_names(u.id),
            })
            .collect();
        users.sort_by(|a, b| a.email.cmp(&b.email));
        Ok(users)
    }

    async fn update_email(&self, id: Uuid, email: &str) -> IdentityResult<()> {
        let mut inner = self.inner.lock().await;
        if inner.email_taken(email, Some(id)) {
            return Err(IdentityError::rejected(format!(
                "Email '{}' is already taken.",
                email
            )));
        }
        match inner.users.get_mut(&id) {
            Some(user) => {
                user.email = email.to_string();
                Ok(())
            }
            None => Err(IdentityError::rejected(format!(
                "User '{}' does not exist.",
                id
            ))),
        }
    }

    async fn delete(&self, id: Uuid) -> IdentityResult<()> {
        let mut inner = self.inner.lock().await;
        if inner.users.remove(&id).is_none() {
            return Err(IdentityError::rejected(format!(
                "User '{}' does not exist.",
                id
            )));
        }
        inner.memberships.retain(|(u, _)| *u != id);
        Ok(())
    }

    async fn roles_of(&self, id: Uuid) -> anyhow::Result<Vec<String>> {
        Ok(self.inner.lock().await.role_names(id))
    }

    async fn add_to_roles(&self, id: Uuid, roles: &[String]) -> IdentityResult<()> {
        let mut inner = self.inner.lock().await;
        let mut role_ids = Vec::with_capacity(roles.len());
        for name in roles {
            let Some(role_id) = inner.role_id(name) else {
                return Err(IdentityError::rejected(format!(
                    "Role {} does not exist.",
                    name
                )));
            };
            role_ids.push(role_id);
        }
        for role_id in role_ids {
            inner.memberships.insert((id, role_id));
        }
        Ok(())
    }

    async fn remove_from_roles(&self, id: Uuid, roles: &[String]) -> IdentityResult<()> {
        let mut inner = self.inner.lock().await;
        let role_ids: Vec<Uuid> = roles.iter().filter_map(|n| inner.role_id(n)).collect();
        inner
            .memberships
            .retain(|(u, r)| !(*u == id && role_ids.contains(r)));
        Ok(())
    }
}

#[async_trait]
impl RoleDirectory for MemoryIdentity {
    async fn create(&self, name: &str) -> IdentityResult<Role> {
        let mut inner = self.inner.lock().await;
        if inner.role_id(name).is_some() {
            return Err(IdentityError::rejected(format!(
                "Role name '{}' is already taken.",
                name
            )));
        }
        let role = Role {
            id: Uuid::new_v4(),
            name: name.to_string(),
        };
        inner.roles.insert(role.id, role.clone());
        Ok(role)
    }

    async fn list(&self) -> anyhow::Result<Vec<Role>> {
        let inner = self.inner.lock().await;
        let mut roles: Vec<Role> = inner.roles.values().cloned().collect();
        roles.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(roles)
    }

    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<Role>> {
        Ok(self.inner.lock().await.roles.get(&id).cloned())
    }

    async fn rename(&self, id: Uuid, name: &str) -> IdentityResult<()> {
        let mut inner = self.inner.lock().await;
        if inner.role_id(name).is_some_and(|other| other != id) {
            return Err(IdentityError::rejected(format!(
                "Role name '{}' is already taken.",
                name
            )));
        }
        match inner.roles.get_mut(&id) {
            Some(role) => {
                role.name = name.to_string();
                Ok(())
            }
            None => Err(IdentityError::rejected(format!(
                "Role '{}' does not exist.",
                id
            ))),
        }
    }

    async fn delete(&self, id: Uuid) -> IdentityResult<()> {
        let mut inner = self.inner.lock().await;
        if inner.roles.remove(&id).is_none() {
            return Err(IdentityError::rejected(format!(
                "Role '{}' does not exist.",
                id
            )));
        }
        inner.memberships.retain(|(_, r)| *r != id);
        Ok(())
    }
}
