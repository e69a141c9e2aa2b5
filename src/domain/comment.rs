use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::app::error::{ServiceError, ServiceResult};
use crate::domain::user::AuthorRef;

pub const COMMENT_MAX_LEN: usize = 2000;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub id: Uuid,
    pub post_id: Uuid,
    pub content: String,
    pub author_id: Uuid,
    pub author: AuthorRef,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

pub fn validate_content(content: &str) -> ServiceResult<()> {
    if content.trim().is_empty() {
        return Err(ServiceError::invalid_input("comment content is required"));
    }
    if content.chars().count() > COMMENT_MAX_LEN {
        return Err(ServiceError::invalid_input(
            "comment content exceeds 2000 characters",
        ));
    }
    Ok(())
}
