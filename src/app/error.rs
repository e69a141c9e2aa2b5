/// Failure taxonomy shared by every store.
///
/// Validation and ownership failures carry a message that is safe to show to
/// the caller. `Database` and `Internal` are never rendered verbatim.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("{0}")]
    InvalidInput(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

pub type ServiceResult<T> = Result<T, ServiceError>;

impl ServiceError {
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict(message.into())
    }
}

/// Name of the unique constraint a query tripped over, if any.
pub(crate) fn unique_violation(err: &sqlx::Error) -> Option<String> {
    violated_constraint(err, "23505")
}

/// Name of the foreign key a query tripped over, if any.
pub(crate) fn foreign_key_violation(err: &sqlx::Error) -> Option<String> {
    violated_constraint(err, "23503")
}

/// A write whose `author_id` points at a deleted user. The caller still holds
/// a valid token for that account, so this is an authentication failure.
pub(crate) fn missing_author(err: sqlx::Error) -> ServiceError {
    match foreign_key_violation(&err) {
        Some(constraint) if constraint.ends_with("author_id_fkey") => {
            ServiceError::unauthorized("user no longer exists")
        }
        _ => ServiceError::Database(err),
    }
}

fn violated_constraint(err: &sqlx::Error, code: &str) -> Option<String> {
    let db_err = err.as_database_error()?;
    if db_err.code().as_deref() != Some(code) {
        return None;
    }
    Some(db_err.constraint().unwrap_or_default().to_string())
}
