/*
 * Responsibility
 * - /feed 系 CRUD handler
 * - Path の post_id は公開 ID → extractor で復号化して内部 ID に変換して受け取る
 * - 作成者チェック (403) は FeedService 側
 */
use axum::{
    Json,
    extract::{
        Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    http::StatusCode,
};

use crate::{
    api::v1::{
        dto::feed::{
            CreatePostResponse, ListPostsQuery, MessageResponse, PostEnvelope, PostRequest,
            PostResponse, PostsPageResponse, UserResponse,
        },
        extractors::{AuthCtxExtractor, public_id::PublicPostId},
    },
    error::AppError,
    repos::{post_repo::PostRow, user_repo::UserRow},
    state::AppState,
};

fn row_to_response(state: &AppState, row: PostRow) -> Result<PostResponse, AppError> {
    Ok(PostResponse {
        id: state.id_codec.encode(row.id)?,
        title: row.title,
        content: row.content,
        image_url: row.image_url,
        creator_id: row.creator_id,
        created_at: row.created_at,
        updated_at: row.updated_at,
    })
}

fn user_to_response(state: &AppState, row: UserRow) -> Result<UserResponse, AppError> {
    // password_hash は返さない
    Ok(UserResponse {
        id: row.id,
        email: row.email,
        name: row.name,
        status: row.status,
        posts: state.id_codec.encode_all(&row.post_ids)?,
    })
}

pub async fn list_posts(
    State(state): State<AppState>,
    AuthCtxExtractor(_ctx): AuthCtxExtractor,
    query: Result<Query<ListPostsQuery>, QueryRejection>,
) -> Result<Json<PostsPageResponse>, AppError> {
    let Query(query) = query?;
    let page = state.feed.list_posts(query.page.unwrap_or(1)).await?;

    let mut posts = Vec::with_capacity(page.posts.len());
    for row in page.posts {
        posts.push(row_to_response(&state, row)?);
    }

    Ok(Json(PostsPageResponse {
        message: "Fetched posts successfully.",
        posts,
        total_items: page.total_items,
    }))
}

pub async fn create_post(
    State(state): State<AppState>,
    AuthCtxExtractor(ctx): AuthCtxExtractor,
    req: Result<Json<PostRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<CreatePostResponse>), AppError> {
    let Json(req) = req?;
    let (post, creator) = state.feed.create_post(ctx.user_id, req).await?;

    Ok((
        StatusCode::CREATED,
        Json(CreatePostResponse {
            message: "Post created successfully!",
            post: row_to_response(&state, post)?,
            creator: user_to_response(&state, creator)?,
        }),
    ))
}

pub async fn get_post(
    State(state): State<AppState>,
    AuthCtxExtractor(_ctx): AuthCtxExtractor,
    post_id: PublicPostId,
) -> Result<Json<PostEnvelope>, AppError> {
    let row = state.feed.get_post(post_id.id).await?;

    Ok(Json(PostEnvelope {
        message: "Post fetched.",
        post: row_to_response(&state, row)?,
    }))
}

pub async fn update_post(
    State(state): State<AppState>,
    AuthCtxExtractor(ctx): AuthCtxExtractor,
    post_id: PublicPostId,
    req: Result<Json<PostRequest>, JsonRejection>,
) -> Result<Json<PostEnvelope>, AppError> {
    let Json(req) = req?;
    let row = state.feed.update_post(ctx.user_id, post_id.id, req).await?;

    Ok(Json(PostEnvelope {
        message: "Post updated!",
        post: row_to_response(&state, row)?,
    }))
}

pub async fn delete_post(
    State(state): State<AppState>,
    AuthCtxExtractor(ctx): AuthCtxExtractor,
    post_id: PublicPostId,
) -> Result<Json<MessageResponse>, AppError> {
    state.feed.delete_post(ctx.user_id, post_id.id).await?;

    Ok(Json(MessageResponse {
        message: "Deleted post.",
    }))
}
