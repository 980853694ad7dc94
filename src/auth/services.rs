use lazy_static::lazy_static;
use regex::Regex;
use tracing::{info, warn};

use super::{
    dto::{AuthResponse, PublicUser},
    jwt::JwtKeys,
    password::{hash_password, verify_password},
};
use crate::{
    config::AdminBootstrap,
    error::{AppError, AppResult, FieldErrors},
    identity::{RoleDirectory, UserDirectory, UserRecord},
    policy::{ADMIN_ROLE, USER_ROLE},
};

pub const MIN_REGISTER_PASSWORD_LEN: usize = 8;

lazy_static! {
    static ref EMAIL_RE: Option<Regex> = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").ok();
}

pub(crate) fn is_valid_email(email: &str) -> bool {
    match &*EMAIL_RE {
        Some(re) => re.is_match(email),
        None => false,
    }
}

pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Creates a self-service account and places it in the `User` role.
pub async fn register(
    users: &dyn UserDirectory,
    email: &str,
    password: &str,
) -> AppResult<UserRecord> {
    let email = normalize_email(email);

    let mut errors = FieldErrors::new();
    if !is_valid_email(&email) {
        errors.add("email", "Invalid email");
    }
    if password.chars().count() < MIN_REGISTER_PASSWORD_LEN {
        errors.add(
            "password",
            format!("Password must be at least {} characters", MIN_REGISTER_PASSWORD_LEN),
        );
    }
    if let Err(e) = errors.into_result() {
        warn!(email = %email, "registration rejected");
        return Err(e);
    }

    if users.find_by_email(&email).await?.is_some() {
        warn!(email = %email, "email already registered");
        return Err(AppError::Conflict("Email already registered".into()));
    }

    let hash = hash_password(password)?;
    let user = users.create(&email, &hash).await?;
    users.add_to_roles(user.id, &[USER_ROLE.to_string()]).await?;
    info!(user_id = %user.id, email = %user.email, "user registered");
    Ok(user)
}

/// Checks credentials. Unknown email and wrong password look the same.
pub async fn authenticate(
    users: &dyn UserDirectory,
    email: &str,
    password: &str,
) -> AppResult<UserRecord> {
    let email = normalize_email(email);
    if !is_valid_email(&email) {
        return Err(AppError::BadRequest("Invalid email".into()));
    }
    let Some(user) = users.find_by_email(&email).await? else {
        warn!(email = %email, "login unknown email");
        return Err(AppError::Unauthorized("Invalid credentials".into()));
    };
    if !verify_password(password, &user.password_hash)? {
        warn!(user_id = %user.id, "login invalid password");
        return Err(AppError::Unauthorized("Invalid credentials".into()));
    }
    info!(user_id = %user.id, "user logged in");
    Ok(user)
}

pub fn issue_tokens(keys: &JwtKeys, user: &UserRecord) -> AppResult<AuthResponse> {
    Ok(AuthResponse {
        access_token: keys.sign_access(user.id)?,
        refresh_token: keys.sign_refresh(user.id)?,
        user: PublicUser {
            id: user.id,
            email: user.email.clone(),
        },
    })
}

/// Makes sure the `Admin` and `User` roles exist.
pub async fn ensure_default_roles(roles: &dyn RoleDirectory) -> anyhow::Result<()> {
    let existing = roles.list().await?;
    for name in [ADMIN_ROLE, USER_ROLE] {
        if existing.iter().any(|r| r.name == name) {
            continue;
        }
        roles
            .create(name)
            .await
            .map_err(|e| anyhow::anyhow!("create role {}: {}", name, e))?;
        info!(role = name, "role created");
    }
    Ok(())
}

/// Creates the configured administrator if missing and grants it `Admin`.
pub async fn bootstrap_admin(
    users: &dyn UserDirectory,
    admin: &AdminBootstrap,
) -> anyhow::Result<()> {
    let email = normalize_email(&admin.email);
    let user = match users.find_by_email(&email).await? {
        Some(user) => user,
        None => {
            let hash = hash_password(&admin.password)?;
            let user = users
                .create(&email, &hash)
                .await
                .map_err(|e| anyhow::anyhow!("create admin account: {}", e))?;
            info!(user_id = %user.id, "admin account created");
            user
        }
    };
    if !users.roles_of(user.id).await?.iter().any(|r| r == ADMIN_ROLE) {
        users
            .add_to_roles(user.id, &[ADMIN_ROLE.to_string()])
            .await
            .map_err(|e| anyhow::anyhow!("grant admin role: {}", e))?;
        info!(user_id = %user.id, "admin role granted");
    }
    Ok(())
}
