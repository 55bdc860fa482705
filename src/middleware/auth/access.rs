//! access token (JWT) 検証 → AuthCtx を extensions に入れる
//!
//! - `Authorization: <scheme> <jwt>` を受け取り、gate (services::auth::gate) に渡す
//! - 成功時は `AuthCtx` を request extensions に格納し、handler は `AuthCtxExtractor` で受け取る
//! - 失敗時はすべて 401 (理由はログにのみ残す)

use axum::{
    Router,
    body::Body,
    extract::State,
    http::{Request, header},
    middleware::{self, Next},
    response::Response,
};

use crate::api::v1::extractors::AuthCtx;
use crate::error::AppError;
use crate::services::auth::{GateError, authorize};
use crate::state::AppState;

/// 保護したい route 群に認証を掛ける。
///
/// `route_layer` なので、マッチしない path は 401 ではなく 404 のまま。
pub fn apply(router: Router<AppState>, state: AppState) -> Router<AppState> {
    // axum 0.8 の from_fn は State extractor を受け取れないため、`from_fn_with_state` で明示的に state を渡す
    router.route_layer(middleware::from_fn_with_state(state, access_middleware))
}

async fn access_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let header = match req.headers().get(header::AUTHORIZATION) {
        None => None,
        Some(value) => Some(value.to_str().map_err(|_| {
            tracing::warn!("authorization header is not visible ASCII");
            AppError::from(GateError::MalformedCredential)
        })?),
    };

    let verified = match authorize(header, state.verifier.as_ref()) {
        Ok(verified) => verified,
        Err(err) => {
            tracing::warn!(reason = %err, "request rejected by authorization gate");
            return Err(err.into());
        }
    };

    let ctx = AuthCtx::from(verified);
    tracing::debug!(user_id = %ctx.user_id, email = ?ctx.email, "request authenticated");

    // middleware → extractor への受け渡し
    req.extensions_mut().insert(ctx);

    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        Json,
        http::{HeaderValue, StatusCode},
        routing::get,
    };
    use tower::ServiceExt;
    use uuid::Uuid;

    use super::*;
    use crate::api::v1::extractors::AuthCtxExtractor;
    use crate::services::auth::jwt::{AccessTokenClaims, TokenVerifier, VerifyError};
    use crate::testing::{memory_state, test_jwt, test_state_with_verifier};

    /// Accepts exactly one opaque token, for a fixed user.
    struct FixedVerifier {
        user_id: Uuid,
    }

    impl TokenVerifier for FixedVerifier {
        fn verify(&self, token: &str) -> Result<AccessTokenClaims, VerifyError> {
            if token != "let-me-in" {
                return Err(VerifyError::Jwt(
                    jsonwebtoken::errors::ErrorKind::InvalidToken.into(),
                ));
            }
            Ok(AccessTokenClaims {
                sub: Some(self.user_id.to_string()),
                email: None,
                iat: None,
                exp: 0,
            })
        }
    }

    async fn whoami(AuthCtxExtractor(ctx): AuthCtxExtractor) -> Json<String> {
        Json(ctx.user_id.to_string())
    }

    fn app_with(state: AppState) -> Router {
        let protected = Router::new().route("/whoami", get(whoami));
        apply(protected, state.clone()).with_state(state)
    }

    async fn call_with(state: AppState, auth: Option<HeaderValue>) -> Response {
        let mut req = Request::builder().uri("/whoami");
        if let Some(value) = auth {
            req = req.header(header::AUTHORIZATION, value);
        }
        app_with(state)
            .oneshot(req.body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    async fn call(auth: Option<HeaderValue>) -> Response {
        call_with(memory_state(), auth).await
    }

    #[tokio::test]
    async fn rejects_request_without_header() {
        let res = call(None).await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn rejects_single_part_header() {
        let res = call(Some(HeaderValue::from_static("some_auth_header"))).await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn rejects_unverifiable_token() {
        let res = call(Some(HeaderValue::from_static("Authorization SomeToken"))).await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn rejects_non_ascii_header() {
        let value = HeaderValue::from_bytes(b"Bearer \xff\xfe").unwrap();
        let res = call(Some(value)).await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn attaches_identity_from_valid_token() {
        let user_id = Uuid::new_v4();
        let token = test_jwt().issue(user_id, "a@a.com").unwrap();
        let value = HeaderValue::from_str(&format!("Bearer {token}")).unwrap();

        let res = call(Some(value)).await;
        assert_eq!(res.status(), StatusCode::OK);

        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: String = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body, user_id.to_string());
    }

    #[tokio::test]
    async fn gate_uses_the_injected_verifier() {
        let user_id = Uuid::new_v4();
        let state = test_state_with_verifier(Arc::new(FixedVerifier { user_id }));

        let res = call_with(
            state.clone(),
            Some(HeaderValue::from_static("Token let-me-in")),
        )
        .await;
        assert_eq!(res.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: String = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body, user_id.to_string());

        // a real, correctly signed JWT means nothing to this verifier
        let token = test_jwt().issue(user_id, "a@a.com").unwrap();
        let value = HeaderValue::from_str(&format!("Bearer {token}")).unwrap();
        let res = call_with(state, Some(value)).await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }
}
