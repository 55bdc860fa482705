//! Account operations: signup, login and the per-user status field.
//!
//! Store failures are always `AppError::Internal` (500). In particular a failing
//! lookup during login is never reported as 401: not being able to check the
//! credentials is a different outcome from the credentials being wrong.
use std::sync::Arc;

use tracing::{error, info};
use uuid::Uuid;

use crate::api::v1::dto::auth::{SignupRequest, UpdateStatusRequest};
use crate::error::AppError;
use crate::repos::error::RepoError;
use crate::repos::user_repo::{NewUser, UserRow, UserStore};
use crate::services::auth::{JwtService, password};

const EMAIL_TAKEN: &str = "E-Mail address already exists!";

/// Service-level login result; handlers map it into `LoginResponse`.
#[derive(Debug, Clone)]
pub struct LoggedIn {
    pub token: String,
    pub user_id: Uuid,
}

#[derive(Clone)]
pub struct AccountService {
    users: Arc<dyn UserStore>,
    tokens: Arc<JwtService>,
}

impl AccountService {
    pub fn new(users: Arc<dyn UserStore>, tokens: Arc<JwtService>) -> Self {
        Self { users, tokens }
    }

    pub async fn signup(&self, req: SignupRequest) -> Result<UserRow, AppError> {
        req.validate().map_err(AppError::invalid_input)?;

        let email = req.email.trim().to_ascii_lowercase();
        if self.users.find_by_email(&email).await?.is_some() {
            return Err(AppError::invalid_input(EMAIL_TAKEN));
        }

        // hashed exactly as given; login verifies the raw input too
        let password_hash = password::hash_password(&req.password).map_err(|e| {
            error!(error = %e, "failed to hash password");
            AppError::Internal
        })?;

        let user = self
            .users
            .create(NewUser {
                email,
                password_hash,
                name: req.name.trim().to_string(),
            })
            .await
            .map_err(|e| match e {
                // lost a race with a concurrent signup for the same email
                RepoError::Conflict => AppError::invalid_input(EMAIL_TAKEN),
                other => other.into(),
            })?;

        info!(user_id = %user.id, "user signed up");
        Ok(user)
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<LoggedIn, AppError> {
        let email = email.trim().to_ascii_lowercase();

        let user = self
            .users
            .find_by_email(&email)
            .await?
            .ok_or_else(|| AppError::unauthorized("A user with this email could not be found."))?;

        let matches = password::verify_password(password, &user.password_hash).map_err(|e| {
            error!(user_id = %user.id, error = %e, "stored password hash is unusable");
            AppError::Internal
        })?;
        if !matches {
            return Err(AppError::unauthorized("Wrong password!"));
        }

        let token = self.tokens.issue(user.id, &user.email)?;

        info!(user_id = %user.id, "user logged in");
        Ok(LoggedIn {
            token,
            user_id: user.id,
        })
    }

    pub async fn get_status(&self, user_id: Uuid) -> Result<String, AppError> {
        let user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or(AppError::not_found("User"))?;

        Ok(user.status)
    }

    pub async fn update_status(
        &self,
        user_id: Uuid,
        req: UpdateStatusRequest,
    ) -> Result<String, AppError> {
        req.validate().map_err(AppError::invalid_input)?;

        let user = self
            .users
            .update_status(user_id, req.status.trim())
            .await?
            .ok_or(AppError::not_found("User"))?;

        Ok(user.status)
    }
}
