/*
 * Responsibility
 * - Handler から見える「認証済みコンテキスト」の型
 * - middleware が検証して request extensions に格納し、handler はこの型だけを受け取る
 *
 * Notes
 * - JWT の検証ロジックは services::auth::gate 側の責務
 */

use uuid::Uuid;

use crate::services::auth::VerifiedAccessToken;

/// 認証済みのリクエストに付与されるコンテキスト
///
/// - `user_id` は token の `sub` (users.id)
/// - `email` はログイン時点のメールアドレス (ログ相関用。必須ではない)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthCtx {
    pub user_id: Uuid,
    pub email: Option<String>,
}

impl From<VerifiedAccessToken> for AuthCtx {
    fn from(v: VerifiedAccessToken) -> Self {
        Self {
            user_id: v.user_id,
            email: v.email,
        }
    }
}
