use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::app::error::{ServiceError, ServiceResult};

pub const USERNAME_MIN_LEN: usize = 3;
pub const USERNAME_MAX_LEN: usize = 32;
pub const EMAIL_MAX_LEN: usize = 254;
pub const PASSWORD_MIN_LEN: usize = 6;
pub const PASSWORD_MAX_LEN: usize = 128;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// Author as embedded in posts and comments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorRef {
    pub id: Uuid,
    pub username: String,
}

/// Registration input after normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password: String,
}

impl NewUser {
    pub fn parse(username: &str, email: &str, password: &str) -> ServiceResult<Self> {
        let username = username.trim();
        let email = normalize_email(email);

        let username_len = username.chars().count();
        if username_len < USERNAME_MIN_LEN || username_len > USERNAME_MAX_LEN {
            return Err(ServiceError::invalid_input(
                "username must be between 3 and 32 characters",
            ));
        }
        if !username
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
        {
            return Err(ServiceError::invalid_input(
                "username may only contain letters, digits and underscores",
            ));
        }

        if email.is_empty() || email.len() > EMAIL_MAX_LEN || !is_plausible_email(&email) {
            return Err(ServiceError::invalid_input("email is invalid"));
        }

        let password_len = password.chars().count();
        if password.trim().is_empty() || password_len < PASSWORD_MIN_LEN {
            return Err(ServiceError::invalid_input(
                "password must be at least 6 characters",
            ));
        }
        if password_len > PASSWORD_MAX_LEN {
            return Err(ServiceError::invalid_input(
                "password must be at most 128 characters",
            ));
        }

        Ok(Self {
            username: username.to_string(),
            email,
            password: password.to_string(),
        })
    }
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn is_plausible_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.is_empty()
                && !domain.contains('@')
                && !email.chars().any(char::is_whitespace)
        }
        None => false,
    }
}
