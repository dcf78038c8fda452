use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::{check_length, FieldErrors};

pub const MIN_PASSWORD_LENGTH: usize = 8;
pub const MAX_PASSWORD_LENGTH: usize = 128;

/// Row of the `"user"` table
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub is_active: bool,
    pub is_superuser: bool,
    pub full_name: Option<String>,
    pub hashed_password: String,
}

/// User as returned by the API (never carries the hash)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserPublic {
    pub id: Uuid,
    pub email: String,
    pub is_active: bool,
    pub is_superuser: bool,
    pub full_name: Option<String>,
}

impl From<User> for UserPublic {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            is_active: user.is_active,
            is_superuser: user.is_superuser,
            full_name: user.full_name,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UsersPublic {
    pub data: Vec<UserPublic>,
    pub count: i64,
}

/// Provisioning payload with a plain-text password
#[derive(Debug, Deserialize)]
pub struct UserCreate {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub full_name: Option<String>,
}

impl UserCreate {
    pub fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::default();
        if let Err(msg) = validate_email_format(&self.email) {
            errors.add("email", msg);
        }
        check_length(
            &mut errors,
            "password",
            &self.password,
            MIN_PASSWORD_LENGTH,
            MAX_PASSWORD_LENGTH,
        );
        if let Some(name) = &self.full_name {
            check_length(&mut errors, "full_name", name, 0, 255);
        }
        errors.into_result()
    }
}

/// Insert payload handed to the store once the password is hashed
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub hashed_password: String,
    pub full_name: Option<String>,
    pub is_active: bool,
    pub is_superuser: bool,
}

pub fn validate_password_length(password: &str) -> Result<(), FieldErrors> {
    let mut errors = FieldErrors::default();
    check_length(
        &mut errors,
        "new_password",
        password,
        MIN_PASSWORD_LENGTH,
        MAX_PASSWORD_LENGTH,
    );
    errors.into_result()
}

pub fn validate_email_format(email: &str) -> Result<(), String> {
    if email.is_empty() {
        return Err("Email cannot be empty".to_string());
    }
    if email.chars().count() > 255 {
        return Err("Email must be at most 255 characters".to_string());
    }

    let parts: Vec<&str> = email.split('@').collect();
    if parts.len() != 2 || parts[0].is_empty() || !parts[1].contains('.') {
        return Err("value is not a valid email address".to_string());
    }
    if parts[1].starts_with('.') || parts[1].ends_with('.') {
        return Err("value is not a valid email address".to_string());
    }

    Ok(())
}
