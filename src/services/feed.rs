//! Feed operations: posts owned by users.
//!
//! Creating or deleting a post touches two records: the post itself and the
//! creator's post list. Both go through a single `PostStore` call so they commit
//! or fail together.
use std::sync::Arc;

use tracing::{debug, warn};
use uuid::Uuid;

use crate::api::v1::dto::feed::PostRequest;
use crate::error::AppError;
use crate::repos::post_repo::{NewPost, PostChanges, PostRow, PostStore};
use crate::repos::user_repo::UserRow;

#[derive(Debug, Clone)]
pub struct PostsPage {
    pub posts: Vec<PostRow>,
    pub total_items: i64,
}

#[derive(Clone)]
pub struct FeedService {
    posts: Arc<dyn PostStore>,
    per_page: i64,
}

impl FeedService {
    pub fn new(posts: Arc<dyn PostStore>, per_page: i64) -> Self {
        Self { posts, per_page }
    }

    /// 1-based page, newest first.
    pub async fn list_posts(&self, page: i64) -> Result<PostsPage, AppError> {
        if page < 1 {
            return Err(AppError::bad_request("INVALID_PAGE", "page must be >= 1"));
        }

        let total_items = self.posts.count().await?;
        let offset = (page - 1).saturating_mul(self.per_page);
        let posts = self.posts.list(self.per_page, offset).await?;

        Ok(PostsPage { posts, total_items })
    }

    /// Persist a post and append it to the creator's posts.
    ///
    /// Returns the new post and the creator as stored after the append.
    pub async fn create_post(
        &self,
        user_id: Uuid,
        req: PostRequest,
    ) -> Result<(PostRow, UserRow), AppError> {
        req.validate().map_err(AppError::invalid_input)?;

        let (post, creator) = self
            .posts
            .create_for_creator(NewPost {
                title: req.title.trim().to_string(),
                content: req.content.trim().to_string(),
                image_url: image_url(&req),
                creator_id: user_id,
            })
            .await?
            .ok_or(AppError::not_found("User"))?;

        debug!(user_id = %user_id, post_id = post.id, "post created");
        Ok((post, creator))
    }

    pub async fn get_post(&self, post_id: i64) -> Result<PostRow, AppError> {
        self.posts
            .get(post_id)
            .await?
            .ok_or(AppError::not_found("Post"))
    }

    /// Replace title, content and image of a post owned by `user_id`.
    pub async fn update_post(
        &self,
        user_id: Uuid,
        post_id: i64,
        req: PostRequest,
    ) -> Result<PostRow, AppError> {
        req.validate().map_err(AppError::invalid_input)?;

        let existing = self.get_post(post_id).await?;
        ensure_creator(&existing, user_id)?;

        self.posts
            .update(
                post_id,
                PostChanges {
                    title: req.title.trim().to_string(),
                    content: req.content.trim().to_string(),
                    image_url: image_url(&req),
                },
            )
            .await?
            .ok_or(AppError::not_found("Post"))
    }

    pub async fn delete_post(&self, user_id: Uuid, post_id: i64) -> Result<(), AppError> {
        let existing = self.get_post(post_id).await?;
        ensure_creator(&existing, user_id)?;

        if !self.posts.delete_for_creator(post_id, user_id).await? {
            return Err(AppError::not_found("Post"));
        }

        debug!(user_id = %user_id, post_id, "post deleted");
        Ok(())
    }
}

fn ensure_creator(post: &PostRow, user_id: Uuid) -> Result<(), AppError> {
    if post.creator_id != user_id {
        warn!(user_id = %user_id, post_id = post.id, "rejected change to another user's post");
        return Err(AppError::Forbidden);
    }
    Ok(())
}

// validate() has already guaranteed a non-blank value
fn image_url(req: &PostRequest) -> String {
    req.image_url.as_deref().unwrap_or_default().trim().to_string()
}
