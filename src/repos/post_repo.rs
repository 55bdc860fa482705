/*
 * Responsibility
 * - posts CRUD
 * - 作成 / 削除は users.post_ids の更新と同じ transaction で行う
 *   (post と作成者の一覧が食い違った状態を commit しない)
 * - creator_id の FK (CASCADE) 前提で削除挙動を意識
 */
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::repos::error::RepoResult;
use crate::repos::user_repo::UserRow;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PostRow {
    pub id: i64,

    pub title: String,
    pub content: String,
    pub image_url: String,

    pub creator_id: Uuid,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewPost {
    pub title: String,
    pub content: String,
    pub image_url: String,
    pub creator_id: Uuid,
}

#[derive(Debug, Clone)]
pub struct PostChanges {
    pub title: String,
    pub content: String,
    pub image_url: String,
}

#[async_trait]
pub trait PostStore: Send + Sync {
    // Newest first.
    async fn list(&self, limit: i64, offset: i64) -> RepoResult<Vec<PostRow>>;

    async fn count(&self) -> RepoResult<i64>;

    /// Insert a post and append its id to the creator's post list, atomically.
    ///
    /// `Ok(None)` when the creator does not exist; nothing is written then.
    async fn create_for_creator(&self, new_post: NewPost)
    -> RepoResult<Option<(PostRow, UserRow)>>;

    async fn get(&self, post_id: i64) -> RepoResult<Option<PostRow>>;

    async fn update(&self, post_id: i64, changes: PostChanges) -> RepoResult<Option<PostRow>>;

    /// Delete a post owned by `creator_id` and drop it from the creator's list, atomically.
    ///
    /// `Ok(false)` when that creator has no such post.
    async fn delete_for_creator(&self, post_id: i64, creator_id: Uuid) -> RepoResult<bool>;
}

#[derive(Clone, Debug)]
pub struct PgPostRepo {
    pool: PgPool,
}

impl PgPostRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PostStore for PgPostRepo {
    async fn list(&self, limit: i64, offset: i64) -> RepoResult<Vec<PostRow>> {
        let rows = sqlx::query_as::<_, PostRow>(
            r#"
            SELECT
                id, title, content, image_url, creator_id, created_at, updated_at
            FROM posts
            ORDER BY created_at DESC, id DESC
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn count(&self) -> RepoResult<i64> {
        let total = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM posts
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(total)
    }

    async fn create_for_creator(
        &self,
        new_post: NewPost,
    ) -> RepoResult<Option<(PostRow, UserRow)>> {
        // drop without commit = rollback
        let mut tx = self.pool.begin().await?;

        // creator 行をロックして、同じ user への並行する作成/削除を直列化する
        let creator = sqlx::query_scalar::<_, Uuid>(
            r#"
            SELECT id FROM users WHERE id = $1 FOR UPDATE
            "#,
        )
        .bind(new_post.creator_id)
        .fetch_optional(&mut *tx)
        .await?;
        if creator.is_none() {
            return Ok(None);
        }

        let post = sqlx::query_as::<_, PostRow>(
            r#"
            INSERT INTO posts (title, content, image_url, creator_id)
            VALUES ($1, $2, $3, $4)
            RETURNING
                id, title, content, image_url, creator_id, created_at, updated_at
            "#,
        )
        .bind(&new_post.title)
        .bind(&new_post.content)
        .bind(&new_post.image_url)
        .bind(new_post.creator_id)
        .fetch_one(&mut *tx)
        .await?;

        let creator = sqlx::query_as::<_, UserRow>(
            r#"
            UPDATE users
            SET post_ids = array_append(post_ids, $2)
            WHERE id = $1
            RETURNING id, email, password_hash, name, status, post_ids, created_at
            "#,
        )
        .bind(new_post.creator_id)
        .bind(post.id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(Some((post, creator)))
    }

    async fn get(&self, post_id: i64) -> RepoResult<Option<PostRow>> {
        let row = sqlx::query_as::<_, PostRow>(
            r#"
            SELECT
                id, title, content, image_url, creator_id, created_at, updated_at
            FROM posts
            WHERE id = $1
            "#,
        )
        .bind(post_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    async fn update(&self, post_id: i64, changes: PostChanges) -> RepoResult<Option<PostRow>> {
        let row = sqlx::query_as::<_, PostRow>(
            r#"
            UPDATE posts
            SET
                title = $2,
                content = $3,
                image_url = $4,
                updated_at = now()
            WHERE id = $1
            RETURNING
                id, title, content, image_url, creator_id, created_at, updated_at
            "#,
        )
        .bind(post_id)
        .bind(&changes.title)
        .bind(&changes.content)
        .bind(&changes.image_url)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    async fn delete_for_creator(&self, post_id: i64, creator_id: Uuid) -> RepoResult<bool> {
        let mut tx = self.pool.begin().await?;

        let deleted = sqlx::query(
            r#"
            DELETE FROM posts
            WHERE id = $1 AND creator_id = $2
            "#,
        )
        .bind(post_id)
        .bind(creator_id)
        .execute(&mut *tx)
        .await?;
        if deleted.rows_affected() == 0 {
            return Ok(false);
        }

        sqlx::query(
            r#"
            UPDATE users
            SET post_ids = array_remove(post_ids, $2)
            WHERE id = $1
            "#,
        )
        .bind(creator_id)
        .bind(post_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(true)
    }
}
