/*
 * Responsibility
 * - middleware の公開インターフェース
 * - auth::access は保護 route のみ、その他は Router 全体に掛ける
 */
pub mod auth;
pub mod cors;
pub mod http;
pub mod security_headers;
