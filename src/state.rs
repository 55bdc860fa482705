/*
 * Responsibility
 * - Router に紐づける共有コンテキスト (AppState)
 *   - ex: accounts / feed service, verifier: gate が使う token 検証, id_codec: IdCodec
 * - Clone 前提で持つ (内部は Arc/Clone cheap)
 */
use std::sync::Arc;

use crate::repos::{PostStore, UserStore};
use crate::services::{
    account::AccountService,
    auth::{JwtService, TokenVerifier},
    feed::FeedService,
    id_codec::IdCodec,
};

#[derive(Clone)]
pub struct AppState {
    pub accounts: Arc<AccountService>,
    pub feed: Arc<FeedService>,
    // access middleware (gate) はこの trait object だけを見る
    pub verifier: Arc<dyn TokenVerifier>,
    pub id_codec: IdCodec,
}

impl AppState {
    /// `tokens` signs at login; `verifier` checks tokens on protected routes.
    pub fn new(
        users: Arc<dyn UserStore>,
        posts: Arc<dyn PostStore>,
        tokens: Arc<JwtService>,
        verifier: Arc<dyn TokenVerifier>,
        id_codec: IdCodec,
        posts_per_page: i64,
    ) -> Self {
        Self {
            accounts: Arc::new(AccountService::new(users, tokens)),
            feed: Arc::new(FeedService::new(posts, posts_per_page)),
            verifier,
            id_codec,
        }
    }
}
