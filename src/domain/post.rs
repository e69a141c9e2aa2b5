use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::app::error::{ServiceError, ServiceResult};
use crate::domain::user::AuthorRef;

pub const TITLE_MAX_LEN: usize = 200;

/// A post as returned to clients. `content` is Markdown, stored verbatim.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub image: Option<String>,
    pub author_id: Uuid,
    pub author: AuthorRef,
    pub like_count: i64,
    pub comment_count: i64,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPost {
    pub title: String,
    pub content: String,
    pub image: Option<String>,
}

impl NewPost {
    pub fn parse(title: &str, content: &str, image: Option<String>) -> ServiceResult<Self> {
        if title.trim().is_empty() || content.trim().is_empty() {
            return Err(ServiceError::invalid_input("title and content are required"));
        }
        validate_title(title)?;

        Ok(Self {
            title: title.trim().to_string(),
            content: content.to_string(),
            image: non_blank(image),
        })
    }
}

/// Fields an author may change. Blank fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostPatch {
    pub title: Option<String>,
    pub content: Option<String>,
    pub image: Option<String>,
}

impl PostPatch {
    pub fn parse(
        title: Option<String>,
        content: Option<String>,
        image: Option<String>,
    ) -> ServiceResult<Self> {
        let title = non_blank(title).map(|title| title.trim().to_string());
        if let Some(title) = &title {
            validate_title(title)?;
        }

        Ok(Self {
            title,
            content: non_blank(content),
            image: non_blank(image),
        })
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.content.is_none() && self.image.is_none()
    }
}

/// Only the author may edit or delete a post.
pub fn can_mutate(author_id: Uuid, requester_id: Uuid) -> bool {
    author_id == requester_id
}

fn validate_title(title: &str) -> ServiceResult<()> {
    if title.trim().chars().count() > TITLE_MAX_LEN {
        return Err(ServiceError::invalid_input(
            "title must be at most 200 characters",
        ));
    }
    Ok(())
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|value| !value.trim().is_empty())
}
