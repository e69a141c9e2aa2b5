use sqlx::postgres::PgRow;
use sqlx::Row;
use uuid::Uuid;

use crate::app::error::{missing_author, ServiceError, ServiceResult};
use crate::domain::comment::{validate_content, Comment};
use crate::domain::user::AuthorRef;
use crate::infra::db::Db;

#[derive(Clone)]
pub struct CommentService {
    db: Db,
}

impl CommentService {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    pub async fn add(&self, post_id: Uuid, author_id: Uuid, content: &str) -> ServiceResult<Comment> {
        validate_content(content)?;

        let mut tx = self.db.pool().begin().await?;

        // Share lock keeps the post from being deleted underneath the insert.
        let exists: Option<Uuid> = sqlx::query_scalar("SELECT id FROM posts WHERE id = $1 FOR SHARE")
            .bind(post_id)
            .fetch_optional(&mut *tx)
            .await?;
        if exists.is_none() {
            return Err(ServiceError::not_found("post not found"));
        }

        let row = sqlx::query(
            "WITH inserted_comment AS ( \
                INSERT INTO comments (post_id, author_id, content) \
                VALUES ($1, $2, $3) \
                RETURNING id, post_id, author_id, content, created_at \
             ) \
             SELECT c.*, u.username AS author_username \
             FROM inserted_comment c \
             JOIN users u ON u.id = c.author_id",
        )
        .bind(post_id)
        .bind(author_id)
        .bind(content)
        .fetch_one(&mut *tx)
        .await
        .map_err(missing_author)?;

        let comment = comment_from_row(&row);
        tx.commit().await?;

        tracing::info!(comment_id = %comment.id, post_id = %post_id, author_id = %author_id, "comment added");
        Ok(comment)
    }

    /// Newest first. An unknown post simply has no comments.
    pub async fn list(&self, post_id: Uuid) -> ServiceResult<Vec<Comment>> {
        let rows = sqlx::query(
            "SELECT c.id, c.post_id, c.author_id, c.content, c.created_at, \
                    u.username AS author_username \
             FROM comments c \
             JOIN users u ON u.id = c.author_id \
             WHERE c.post_id = $1 \
             ORDER BY c.created_at DESC, c.id DESC",
        )
        .bind(post_id)
        .fetch_all(self.db.pool())
        .await?;

        Ok(rows.iter().map(comment_from_row).collect())
    }
}

fn comment_from_row(row: &PgRow) -> Comment {
    let author_id: Uuid = row.get("author_id");
    Comment {
        id: row.get("id"),
        post_id: row.get("post_id"),
        content: row.get("content"),
        author_id,
        author: AuthorRef {
            id: author_id,
            username: row.get("author_username"),
        },
        created_at: row.get("created_at"),
    }
}
