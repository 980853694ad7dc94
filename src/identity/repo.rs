use anyhow::Context;
use async_trait::async_trait;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use super::{
    IdentityError, IdentityResult, Role, RoleDirectory, UserDirectory, UserRecord, UserWithRoles,
};

/// Postgres-backed user and role directory.
#[derive(Clone)]
pub struct PgIdentity {
    db: PgPool,
}

impl PgIdentity {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db) if db.is_unique_violation())
}

#[async_trait]
impl UserDirectory for PgIdentity {
    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<UserRecord>> {
        let user = sqlx::query_as::<_, UserRecord>(
            r#"SELECT id, email, password_hash, created_at FROM users WHERE id = $1"#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await
        .context("find user by id")?;
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<UserRecord>> {
        let user = sqlx::query_as::<_, UserRecord>(
            r#"
            SELECT id, email, password_hash, created_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.db)
        .await
        .context("find user by email")?;
        Ok(user)
    }

    async fn create(&self, email: &str, password_hash: &str) -> IdentityResult<UserRecord> {
        let created = sqlx::query_as::<_, UserRecord>(
            r#"
            INSERT INTO users (email, password_hash)
            VALUES ($1, $2)
            RETURNING id, email, password_hash, created_at
            "#,
        )
        .bind(email)
        .bind(password_hash)
        .fetch_one(&self.db)
        .await;
        match created {
            Ok(user) => {
                info!(user_id = %user.id, "user created");
                Ok(user)
            }
            Err(e) if is_unique_violation(&e) => Err(IdentityError::rejected(format!(
                "Email '{}' is already taken.",
                email
            ))),
            Err(e) => Err(anyhow::Error::new(e).context("create user").into()),
        }
    }

    async fn list_with_roles(&self) -> anyhow::Result<Vec<UserWithRoles>> {
        let rows = sqlx::query_as::<_, (Uuid, String, Vec<String>)>(
            r#"
            SELECT u.id, u.email,
                   COALESCE(array_agg(r.name ORDER BY r.name) FILTER (WHERE r.name IS NOT NULL),
                            '{}') AS roles
            FROM users u
            LEFT JOIN user_roles ur ON ur.user_id = u.id
            LEFT JOIN roles r ON r.id = ur.role_id
            GROUP BY u.id, u.email
            ORDER BY u.email
            "#,
        )
        .fetch_all(&self.db)
        .await
        .context("list users with roles")?;
        Ok(rows
            .into_iter()
            .map(|(id, email, roles)| UserWithRoles { id, email, roles })
            .collect())
    }

    async fn update_email(&self, id: Uuid, email: &str) -> IdentityResult<()> {
        let result = sqlx::query(r#"UPDATE users SET email = $2 WHERE id = $1"#)
            .bind(id)
            .bind(email)
            .execute(&self.db)
            .await;
        match result {
            Ok(r) if r.rows_affected() == 0 => {
                Err(IdentityError::rejected(format!("User '{}' does not exist.", id)))
            }
            Ok(_) => Ok(()),
            Err(e) if is_unique_violation(&e) => Err(IdentityError::rejected(format!(
                "Email '{}' is already taken.",
                email
            ))),
            Err(e) => Err(anyhow::Error::new(e).context("update user email").into()),
        }
    }

    async fn delete(&self, id: Uuid) -> IdentityResult<()> {
        let result = sqlx::query(r#"DELETE FROM users WHERE id = $1"#)
            .bind(id)
            .execute(&self.db)
            .await
            .context("delete user")?;
        if result.rows_affected() == 0 {
            return Err(IdentityError::rejected(format!(
                "User '{}' does not exist.",
                id
            )));
        }
        Ok(())
    }

    async fn roles_of(&self, id: Uuid) -> anyhow::Result<Vec<String>> {
        let roles: Vec<String> = sqlx::query_scalar(
            r#"
            SELECT r.name
            FROM user_roles ur
            JOIN roles r ON r.id = ur.role_id
            WHERE ur.user_id = $1
            ORDER BY r.name
            "#,
        )
        .bind(id)
        .fetch_all(&self.db)
        .await
        .context("roles of user")?;
        Ok(roles)
    }

    async fn add_to_roles(&self, id: Uuid, roles: &[String]) -> IdentityResult<()> {
        let mut tx = self.db.begin().await.context("begin tx")?;
        for name in roles {
            let role_id: Option<Uuid> =
                sqlx::query_scalar(r#"SELECT id FROM roles WHERE name = $1"#)
                    .bind(name)
                    .fetch_optional(&mut *tx)
                    .await
                    .context("find role by name")?;
            let Some(role_id) = role_id else {
                return Err(IdentityError::rejected(format!(
                    "Role {} does not exist.",
                    name
                )));
            };
            sqlx::query(
                r#"
                INSERT INTO user_roles (user_id, role_id)
                VALUES ($1, $2)
                ON CONFLICT DO NOTHING
                "#,
            )
            .bind(id)
            .bind(role_id)
            .execute(&mut *tx)
            .await
            .context("insert user role")?;
        }
        tx.commit().await.context("commit tx")?;
        Ok(())
    }

    async fn remove_from_roles(&self, id: Uuid, roles: &[String]) -> IdentityResult<()> {
        sqlx::query(
            r#"
            DELETE FROM user_roles ur
            USING roles r
            WHERE ur.role_id = r.id AND ur.user_id = $1 AND r.name = ANY($2)
            "#,
        )
        .bind(id)
        .bind(roles)
        .execute(&self.db)
        .await
        .context("remove user roles")?;
        Ok(())
    }
}

#[async_trait]
impl RoleDirectory for PgIdentity {
    async fn create(&self, name: &str) -> IdentityResult<Role> {
        let created = sqlx::query_as::<_, Role>(
            r#"INSERT INTO roles (name) VALUES ($1) RETURNING id, name"#,
        )
        .bind(name)
        .fetch_one(&self.db)
        .await;
        match created {
            Ok(role) => Ok(role),
            Err(e) if is_unique_violation(&e) => Err(IdentityError::rejected(format!(
                "Role name '{}' is already taken.",
                name
            ))),
            Err(e) => Err(anyhow::Error::new(e).context("create role").into()),
        }
    }

    async fn list(&self) -> anyhow::Result<Vec<Role>> {
        let roles = sqlx::query_as::<_, Role>(r#"SELECT id, name FROM roles ORDER BY name"#)
            .fetch_all(&self.db)
            .await
            .context("list roles")?;
        Ok(roles)
    }

    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<Role>> {
        let role = sqlx::query_as::<_, Role>(r#"SELECT id, name FROM roles WHERE id = $1"#)
            .bind(id)
            .fetch_optional(&self.db)
            .await
            .context("find role by id")?;
        Ok(role)
    }

    async fn rename(&self, id: Uuid, name: &str) -> IdentityResult<()> {
        let result = sqlx::query(r#"UPDATE roles SET name = $2 WHERE id = $1"#)
            .bind(id)
            .bind(name)
            .execute(&self.db)
            .await;
        match result {
            Ok(r) if r.rows_affected() == 0 => {
                Err(IdentityError::rejected(format!("Role '{}' does not exist.", id)))
            }
            Ok(_) => Ok(()),
            Err(e) if is_unique_violation(&e) => Err(IdentityError::rejected(format!(
                "Role name '{}' is already taken.",
                name
            ))),
            Err(e) => Err(anyhow::Error::new(e).context("rename role").into()),
        }
    }

    async fn delete(&self, id: Uuid) -> IdentityResult<()> {
        let result = sqlx::query(r#"DELETE FROM roles WHERE id = $1"#)
            .bind(id)
            .execute(&self.db)
            .await
            .context("delete role")?;
        if result.rows_affected() == 0 {
            return Err(IdentityError::rejected(format!(
                "Role '{}' does not exist.",
                id
            )));
        }
        Ok(())
    }
}
