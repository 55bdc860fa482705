/*
 * Responsibility
 * - /auth 系 handler (signup / login / status)
 * - Json を extractor で受け、AccountService を呼び、DTO に詰め替えるだけ
 * - Json の rejection も AppError (JSON error body) に揃える
 * - status 系は AuthCtxExtractor 必須 (= access middleware を通過済み)
 */
use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
};

use crate::{
    api::v1::{
        dto::auth::{
            LoginRequest, LoginResponse, SignupRequest, SignupResponse, StatusResponse,
            StatusUpdatedResponse, UpdateStatusRequest,
        },
        extractors::AuthCtxExtractor,
    },
    error::AppError,
    state::AppState,
};

pub async fn signup(
    State(state): State<AppState>,
    req: Result<Json<SignupRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<SignupResponse>), AppError> {
    let Json(req) = req?;
    let user = state.accounts.signup(req).await?;

    Ok((
        StatusCode::CREATED,
        Json(SignupResponse {
            message: "User created!",
            user_id: user.id,
        }),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    req: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<LoginResponse>, AppError> {
    let Json(req) = req?;
    let out = state.accounts.login(&req.email, &req.password).await?;

    Ok(Json(LoginResponse {
        token: out.token,
        user_id: out.user_id,
    }))
}

pub async fn get_status(
    State(state): State<AppState>,
    AuthCtxExtractor(ctx): AuthCtxExtractor,
) -> Result<Json<StatusResponse>, AppError> {
    let status = state.accounts.get_status(ctx.user_id).await?;

    Ok(Json(StatusResponse { status }))
}

pub async fn update_status(
    State(state): State<AppState>,
    AuthCtxExtractor(ctx): AuthCtxExtractor,
    req: Result<Json<UpdateStatusRequest>, JsonRejection>,
) -> Result<Json<StatusUpdatedResponse>, AppError> {
    let Json(req) = req?;
    let status = state.accounts.update_status(ctx.user_id, req).await?;

    Ok(Json(StatusUpdatedResponse {
        message: "User updated.",
        status,
    }))
}
