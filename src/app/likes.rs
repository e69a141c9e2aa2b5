use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::app::error::{ServiceError, ServiceResult};
use crate::domain::like::{LikeStatus, LikeToggle};
use crate::infra::db::Db;

#[derive(Clone)]
pub struct LikeService {
    db: Db,
}

impl LikeService {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    /// Flips the (post, user) like in one transaction.
    ///
    /// Toggles for the same pair are serialized on a transaction-scoped
    /// advisory lock, so N concurrent calls end in the state given by the
    /// parity of N. The primary key on `likes` still guards the one-row
    /// invariant if something bypasses this path.
    pub async fn toggle(&self, post_id: Uuid, user_id: Uuid) -> ServiceResult<LikeToggle> {
        let mut tx = self.db.pool().begin().await?;

        let exists: Option<Uuid> = sqlx::query_scalar("SELECT id FROM posts WHERE id = $1 FOR SHARE")
            .bind(post_id)
            .fetch_optional(&mut *tx)
            .await?;
        if exists.is_none() {
            return Err(ServiceError::not_found("post not found"));
        }

        sqlx::query("SELECT pg_advisory_xact_lock($1)")
            .bind(pair_lock_key(post_id, user_id))
            .execute(&mut *tx)
            .await?;

        let removed = sqlx::query("DELETE FROM likes WHERE post_id = $1 AND user_id = $2")
            .bind(post_id)
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        let liked = if removed.rows_affected() > 0 {
            false
        } else {
            sqlx::query(
                "INSERT INTO likes (post_id, user_id) VALUES ($1, $2) \
                 ON CONFLICT (post_id, user_id) DO NOTHING",
            )
            .bind(post_id)
            .bind(user_id)
            .execute(&mut *tx)
            .await?;
            true
        };

        tx.commit().await?;
        tracing::debug!(post_id = %post_id, user_id = %user_id, liked, "like toggled");
        Ok(LikeToggle { liked })
    }

    pub async fn status(&self, post_id: Uuid, user_id: Option<Uuid>) -> ServiceResult<LikeStatus> {
        let (total_likes, liked): (i64, bool) = sqlx::query_as(
            "SELECT COUNT(*) AS total_likes, \
                    COALESCE(BOOL_OR(user_id = $2), FALSE) AS liked \
             FROM likes WHERE post_id = $1",
        )
        .bind(post_id)
        .bind(user_id)
        .fetch_one(self.db.pool())
        .await?;

        Ok(LikeStatus { total_likes, liked })
    }
}

/// Advisory lock key for a (post, user) pair: the first eight bytes of a
/// SHA-256 over both ids.
fn pair_lock_key(post_id: Uuid, user_id: Uuid) -> i64 {
    let mut hasher = Sha256::new();
    hasher.update(b"likes:");
    hasher.update(post_id.as_bytes());
    hasher.update(user_id.as_bytes());
    let digest = hasher.finalize();

    let mut prefix = [0u8; 8];
    prefix.copy_from_slice(&digest[..8]);
    i64::from_be_bytes(prefix)
}
