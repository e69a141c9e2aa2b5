use sqlx::postgres::PgRow;
use sqlx::{PgExecutor, Row};
use uuid::Uuid;

use crate::app::error::{missing_author, ServiceError, ServiceResult};
use crate::domain::post::{can_mutate, NewPost, Post, PostPatch};
use crate::domain::user::AuthorRef;
use crate::infra::db::Db;

pub const DEFAULT_LIST_LIMIT: i64 = 50;
pub const MAX_LIST_LIMIT: i64 = 100;

const SELECT_POST: &str = "SELECT p.id, p.title, p.content, p.image, p.author_id, \
            u.username AS author_username, p.created_at, p.updated_at, \
            (SELECT COUNT(*) FROM likes l WHERE l.post_id = p.id) AS like_count, \
            (SELECT COUNT(*) FROM comments c WHERE c.post_id = p.id) AS comment_count \
     FROM posts p \
     JOIN users u ON u.id = p.author_id";

#[derive(Debug, Clone, Default)]
pub struct PostQuery {
    pub author_id: Option<Uuid>,
    pub limit: Option<i64>,
}

#[derive(Clone)]
pub struct PostService {
    db: Db,
}

impl PostService {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    pub async fn create(
        &self,
        author_id: Uuid,
        title: &str,
        content: &str,
        image: Option<String>,
    ) -> ServiceResult<Post> {
        let new_post = NewPost::parse(title, content, image)?;

        let row = sqlx::query(
            "WITH inserted_post AS ( \
                INSERT INTO posts (author_id, title, content, image) \
                VALUES ($1, $2, $3, $4) \
                RETURNING id, title, content, image, author_id, created_at, updated_at \
             ) \
             SELECT p.*, u.username AS author_username, \
                    0::BIGINT AS like_count, 0::BIGINT AS comment_count \
             FROM inserted_post p \
             JOIN users u ON u.id = p.author_id",
        )
        .bind(author_id)
        .bind(&new_post.title)
        .bind(&new_post.content)
        .bind(&new_post.image)
        .fetch_one(self.db.pool())
        .await
        .map_err(missing_author)?;

        let post = post_from_row(&row);
        tracing::info!(post_id = %post.id, author_id = %author_id, "post created");
        Ok(post)
    }

    /// Newest first; ties on `created_at` fall back to id order so paging
    /// clients see a stable sequence.
    pub async fn list(&self, query: PostQuery) -> ServiceResult<Vec<Post>> {
        let limit = query.limit.unwrap_or(DEFAULT_LIST_LIMIT);
        if !(1..=MAX_LIST_LIMIT).contains(&limit) {
            return Err(ServiceError::invalid_input("limit must be between 1 and 100"));
        }

        let rows = sqlx::query(&format!(
            "{SELECT_POST} \
             WHERE ($1::UUID IS NULL OR p.author_id = $1) \
             ORDER BY p.created_at DESC, p.id DESC \
             LIMIT $2"
        ))
        .bind(query.author_id)
        .bind(limit)
        .fetch_all(self.db.pool())
        .await?;

        Ok(rows.iter().map(post_from_row).collect())
    }

    pub async fn get(&self, post_id: Uuid) -> ServiceResult<Post> {
        fetch_post(self.db.pool(), post_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("post not found"))
    }

    /// Ownership is checked before the patch is validated, so a non-author
    /// always gets `Forbidden`.
    pub async fn update(
        &self,
        post_id: Uuid,
        requester_id: Uuid,
        title: Option<String>,
        content: Option<String>,
        image: Option<String>,
    ) -> ServiceResult<Post> {
        let mut tx = self.db.pool().begin().await?;
        authorize_mutation(&mut tx, post_id, requester_id).await?;
        let patch = PostPatch::parse(title, content, image)?;

        if !patch.is_empty() {
            sqlx::query(
                "UPDATE posts \
                 SET title = COALESCE($2, title), \
                     content = COALESCE($3, content), \
                     image = COALESCE($4, image), \
                     updated_at = now() \
                 WHERE id = $1",
            )
            .bind(post_id)
            .bind(patch.title)
            .bind(patch.content)
            .bind(patch.image)
            .execute(&mut *tx)
            .await?;
        }

        let post = fetch_post(&mut *tx, post_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("post not found"))?;
        tx.commit().await?;

        tracing::info!(post_id = %post_id, "post updated");
        Ok(post)
    }

    pub async fn delete(&self, post_id: Uuid, requester_id: Uuid) -> ServiceResult<()> {
        let mut tx = self.db.pool().begin().await?;
        authorize_mutation(&mut tx, post_id, requester_id).await?;

        sqlx::query("DELETE FROM posts WHERE id = $1")
            .bind(post_id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        tracing::info!(post_id = %post_id, "post deleted");
        Ok(())
    }
}

/// Locks the post row for the rest of the transaction and checks that the
/// requester is its author.
async fn authorize_mutation(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    post_id: Uuid,
    requester_id: Uuid,
) -> ServiceResult<()> {
    let author_id: Option<Uuid> =
        sqlx::query_scalar("SELECT author_id FROM posts WHERE id = $1 FOR UPDATE")
            .bind(post_id)
            .fetch_optional(&mut **tx)
            .await?;

    let author_id = author_id.ok_or_else(|| ServiceError::not_found("post not found"))?;
    if !can_mutate(author_id, requester_id) {
        tracing::warn!(post_id = %post_id, requester_id = %requester_id, "rejected mutation by non-author");
        return Err(ServiceError::forbidden("not the author of this post"));
    }
    Ok(())
}

async fn fetch_post<'e, E>(executor: E, post_id: Uuid) -> ServiceResult<Option<Post>>
where
    E: PgExecutor<'e>,
{
    let row = sqlx::query(&format!("{SELECT_POST} WHERE p.id = $1"))
        .bind(post_id)
        .fetch_optional(executor)
        .await?;
    Ok(row.map(|row| post_from_row(&row)))
}

fn post_from_row(row: &PgRow) -> Post {
    let author_id: Uuid = row.get("author_id");
    Post {
        id: row.get("id"),
        title: row.get("title"),
        content: row.get("content"),
        image: row.get("image"),
        author_id,
        author: AuthorRef {
            id: author_id,
            username: row.get("author_username"),
        },
        like_count: row.get("like_count"),
        comment_count: row.get("comment_count"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}
