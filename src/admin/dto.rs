use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::services::{is_valid_email, normalize_email};
use crate::error::{AppResult, FieldErrors};

pub const MIN_PASSWORD_LEN: usize = 6;
pub const MAX_PASSWORD_LEN: usize = 100;

#[derive(Debug, Deserialize)]
pub struct RoleRequest {
    #[serde(default)]
    pub id: Option<Uuid>,
    #[serde(default)]
    pub name: String,
}

impl RoleRequest {
    /// Trimmed role name, or a field error when it is blank.
    pub fn validated_name(&self) -> AppResult<String> {
        let name = self.name.trim();
        let mut errors = FieldErrors::new();
        if name.is_empty() {
            errors.add("name", "The Role Name field is required.");
        }
        errors.into_result()?;
        Ok(name.to_string())
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub confirm_password: String,
}

impl CreateUserRequest {
    /// Returns the normalised email once every rule passes.
    pub fn validate(&self) -> AppResult<String> {
        let email = normalize_email(&self.email);
        let mut errors = FieldErrors::new();
        check_email(&email, &mut errors);

        let len = self.password.chars().count();
        if !(MIN_PASSWORD_LEN..=MAX_PASSWORD_LEN).contains(&len) {
            errors.add(
                "password",
                format!(
                    "The Password must be at least {} and at max {} characters long.",
                    MIN_PASSWORD_LEN, MAX_PASSWORD_LEN
                ),
            );
        }
        if self.password != self.confirm_password {
            errors.add(
                "confirm_password",
                "The password and confirmation password do not match.",
            );
        }
        errors.into_result()?;
        Ok(email)
    }
}

#[derive(Debug, Deserialize)]
pub struct EditUserRequest {
    #[serde(default)]
    pub id: Option<Uuid>,
    #[serde(default)]
    pub email: String,
    /// Desired memberships; anything not listed is removed.
    #[serde(default)]
    pub roles: Vec<String>,
}

impl EditUserRequest {
    pub fn validate(&self) -> AppResult<String> {
        let email = normalize_email(&self.email);
        let mut errors = FieldErrors::new();
        check_email(&email, &mut errors);
        errors.into_result()?;
        Ok(email)
    }
}

fn check_email(email: &str, errors: &mut FieldErrors) {
    if email.is_empty() {
        errors.add("email", "The Email field is required.");
    } else if !is_valid_email(email) {
        errors.add("email", "The Email field is not a valid e-mail address.");
    }
}

/// User edit view: current memberships plus every role that could be picked.
#[derive(Debug, Serialize)]
pub struct UserDetails {
    pub id: Uuid,
    pub email: String,
    pub roles: Vec<String>,
    pub available_roles: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;

    fn create(email: &str, pw: &str, confirm: &str) -> CreateUserRequest {
        CreateUserRequest {
            email: email.into(),
            password: pw.into(),
            confirm_password: confirm.into(),
        }
    }

    fn fields(err: AppError) -> FieldErrors {
        match err {
            AppError::Validation(f) => f,
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn create_user_password_bounds() {
        assert!(create("a@b.co", "123456", "123456").validate().is_ok());
        let long = "x".repeat(100);
        assert!(create("a@b.co", &long, &long).validate().is_ok());

        let f = fields(create("a@b.co", "12345", "12345").validate().unwrap_err());
        assert!(f.contains("password"));
        let too_long = "x".repeat(101);
        let f = fields(create("a@b.co", &too_long, &too_long).validate().unwrap_err());
        assert!(f.contains("password"));
    }

    #[test]
    fn create_user_confirmation_and_email() {
        let f = fields(create("bad", "secret1", "secret2").validate().unwrap_err());
        assert!(f.contains("email"));
        assert!(f.contains("confirm_password"));
        assert!(!f.contains("password"));
    }

    #[test]
    fn create_user_normalises_email() {
        let email = create(" Someone@Example.ORG ", "secret1", "secret1")
            .validate()
            .unwrap();
        assert_eq!(email, "someone@example.org");
    }

    #[test]
    fn blank_role_name_is_rejected() {
        let req = RoleRequest {
            id: None,
            name: "   ".into(),
        };
        assert!(fields(req.validated_name().unwrap_err()).contains("name"));
        let req = RoleRequest {
            id: None,
            name: " Manager ".into(),
        };
        assert_eq!(req.validated_name().unwrap(), "Manager");
    }

    #[test]
    fn edit_user_requires_email() {
        let req = EditUserRequest {
            id: None,
            email: String::new(),
            roles: vec![],
        };
        assert!(fields(req.validate().unwrap_err()).contains("email"));
    }
}
