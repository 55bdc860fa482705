/*
 * Responsibility
 * - Feed (posts) の request/response DTO
 * - 公開 ID を返す場合は、encode 済みの値を返す (内部 ID を漏らさない)
 */
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

const MIN_TEXT_LEN: usize = 5;

/// Body of both create (POST) and update (PUT): every field is replaced.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    // Opaque reference to an already uploaded image
    pub image_url: Option<String>,
}

impl PostRequest {
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.title.trim().chars().count() < MIN_TEXT_LEN {
            return Err("title must be at least 5 characters");
        }
        if self.content.trim().chars().count() < MIN_TEXT_LEN {
            return Err("content must be at least 5 characters");
        }
        match self.image_url.as_deref().map(str::trim) {
            Some(url) if !url.is_empty() => Ok(()),
            _ => Err("No image provided."),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ListPostsQuery {
    pub page: Option<i64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostResponse {
    pub id: String, // encoded
    pub title: String,
    pub content: String,
    pub image_url: String,
    pub creator_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub status: String,
    pub posts: Vec<String>, // encoded post ids, oldest first
}

#[derive(Debug, Serialize)]
pub struct CreatePostResponse {
    pub message: &'static str,
    pub post: PostResponse,
    pub creator: UserResponse,
}

#[derive(Debug, Serialize)]
pub struct PostEnvelope {
    pub message: &'static str,
    pub post: PostResponse,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostsPageResponse {
    pub message: &'static str,
    pub posts: Vec<PostResponse>,
    pub total_items: i64,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}
