/*
 * Responsibility
 * - v1 の URL 構造を定義
 * - public: /health, /auth/signup, /auth/login
 * - protected: /auth/status, /feed/... (access middleware を route_layer で適用)
 */
use axum::{
    Router,
    routing::{get, post, put},
};

use crate::api::v1::handlers::{
    auth::{get_status, login, signup, update_status},
    feed::{create_post, delete_post, get_post, list_posts, update_post},
    health::health,
};
use crate::middleware::auth::access;
use crate::state::AppState;

pub fn routes(state: AppState) -> Router<AppState> {
    let public = Router::new()
        .route("/health", get(health))
        .route("/auth/signup", put(signup))
        .route("/auth/login", post(login));

    let protected = Router::new()
        .route("/auth/status", get(get_status).patch(update_status))
        .route("/feed/posts", get(list_posts))
        .route("/feed/post", post(create_post))
        .route(
            "/feed/post/{post_id}",
            get(get_post).put(update_post).delete(delete_post),
        );

    public.merge(access::apply(protected, state))
}
