//! Factory: build `JwtService` from application `Config`.
use std::sync::Arc;

use crate::config::Config;
use crate::services::auth::JwtService;

pub fn build_jwt_service(config: &Config) -> Arc<JwtService> {
    Arc::new(JwtService::new(
        &config.jwt_secret,
        config.access_token_ttl_seconds,
        config.access_token_leeway_seconds,
    ))
}
