use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use super::validation_error;
use crate::models::usermodel::User;

pub const MIN_PASSWORD_LENGTH: u64 = 6;

/// 7–20 characters, lowercase letters and digits only.
pub fn validate_username(username: &str) -> Result<(), ValidationError> {
    let length = username.chars().count();
    if !(7..=20).contains(&length) {
        return Err(validation_error(
            "username_length",
            "Username must be between 7 and 20 characters",
        ));
    }
    if username.contains(char::is_whitespace) {
        return Err(validation_error(
            "username_spaces",
            "Username cannot contain spaces",
        ));
    }
    if username != username.to_lowercase() {
        return Err(validation_error(
            "username_lowercase",
            "Username must be lowercase",
        ));
    }
    if !username.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(validation_error(
            "username_alphanumeric",
            "Username can only contain letters and numbers",
        ));
    }
    Ok(())
}

#[derive(Validate, Debug, Default, Clone, Serialize, Deserialize)]
pub struct RegisterUserDto {
    #[serde(default)]
    #[validate(custom = "validate_username")]
    pub username: String,

    #[serde(default)]
    #[validate(
        email(message = "Email is invalid"),
        length(max = 255, message = "Email must be at most 255 characters")
    )]
    pub email: String,

    #[serde(default)]
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,

    pub avatar: Option<String>,
}

impl RegisterUserDto {
    pub fn has_empty_field(&self) -> bool {
        self.username.trim().is_empty() || self.email.trim().is_empty() || self.password.is_empty()
    }
}

#[derive(Validate, Debug, Default, Clone, Serialize, Deserialize)]
pub struct LoginUserDto {
    #[serde(default)]
    #[validate(length(min = 1, message = "Email is required"))]
    pub email: String,

    #[serde(default)]
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

#[derive(Validate, Debug, Default, Clone, Serialize, Deserialize)]
pub struct UpdateUserDto {
    #[validate(custom = "validate_username")]
    pub username: Option<String>,

    #[validate(
        email(message = "Email is invalid"),
        length(max = 255, message = "Email must be at most 255 characters")
    )]
    pub email: Option<String>,

    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: Option<String>,

    #[validate(length(min = 1, message = "Avatar cannot be empty"))]
    pub avatar: Option<String>,
}

/// A user as clients see it: everything but the password.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct FilterUserDto {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub avatar: String,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

impl FilterUserDto {
    pub fn filter_user(user: &User) -> Self {
        FilterUserDto {
            id: user.id,
            username: user.username.to_owned(),
            email: user.email.to_owned(),
            avatar: user.avatar.to_owned(),
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

#[derive(Serialize, Deserialize)]
pub struct Response {
    pub success: bool,
    pub message: String,
}
