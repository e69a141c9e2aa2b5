use anyhow::anyhow;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use sqlx::postgres::PgRow;
use sqlx::Row;
use uuid::Uuid;

use crate::app::error::{unique_violation, ServiceError, ServiceResult};
use crate::domain::user::{normalize_email, NewUser, User};
use crate::infra::db::Db;

const INVALID_CREDENTIALS: &str = "invalid credentials";

/// Credential store: owns the `users` table and password hashes.
#[derive(Clone)]
pub struct AuthService {
    db: Db,
}

impl AuthService {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    pub async fn register(&self, username: &str, email: &str, password: &str) -> ServiceResult<User> {
        let new_user = NewUser::parse(username, email, password)?;
        let password_hash = hash_password(&new_user.password)?;

        let row = sqlx::query(
            "INSERT INTO users (username, email, password_hash) \
             VALUES ($1, $2, $3) \
             RETURNING id, username, email, created_at",
        )
        .bind(&new_user.username)
        .bind(&new_user.email)
        .bind(password_hash)
        .fetch_one(self.db.pool())
        .await
        .map_err(|err| match unique_violation(&err) {
            Some(constraint) if constraint.contains("users_username_key") => {
                ServiceError::conflict("username already taken")
            }
            Some(constraint) if constraint.contains("users_email_key") => {
                ServiceError::conflict("email already registered")
            }
            Some(_) => ServiceError::conflict("user already exists"),
            None => ServiceError::Database(err),
        })?;

        let user = user_from_row(&row);
        tracing::info!(user_id = %user.id, "user registered");
        Ok(user)
    }

    /// Looks up the user by email and checks the password. Unknown email and
    /// wrong password are indistinguishable to the caller.
    pub async fn verify(&self, email: &str, password: &str) -> ServiceResult<User> {
        let row = sqlx::query(
            "SELECT id, username, email, created_at, password_hash \
             FROM users WHERE email = $1",
        )
        .bind(normalize_email(email))
        .fetch_optional(self.db.pool())
        .await?;

        let row = row.ok_or_else(|| ServiceError::unauthorized(INVALID_CREDENTIALS))?;
        let password_hash: String = row.get("password_hash");
        if !verify_password(password, &password_hash)? {
            return Err(ServiceError::unauthorized(INVALID_CREDENTIALS));
        }

        Ok(user_from_row(&row))
    }

    pub async fn get_user(&self, user_id: Uuid) -> ServiceResult<User> {
        let row = sqlx::query(
            "SELECT id, username, email, created_at \
             FROM users WHERE id = $1",
        )
        .bind(user_id)
        .fetch_optional(self.db.pool())
        .await?;

        row.map(|row| user_from_row(&row))
            .ok_or_else(|| ServiceError::not_found("user not found"))
    }
}

fn user_from_row(row: &PgRow) -> User {
    User {
        id: row.get("id"),
        username: row.get("username"),
        email: row.get("email"),
        created_at: row.get("created_at"),
    }
}

fn hash_password(password: &str) -> ServiceResult<String> {
    let salt = SaltString::generate(&mut argon2::password_hash::rand_core::OsRng);
    let argon2 = Argon2::default();
    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|err| anyhow!("failed to hash password: {}", err))?;
    Ok(hash.to_string())
}

fn verify_password(password: &str, hash: &str) -> ServiceResult<bool> {
    let parsed = PasswordHash::new(hash)
        .map_err(|err| anyhow!("failed to parse password hash: {}", err))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}
