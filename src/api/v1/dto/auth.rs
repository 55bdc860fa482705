/*
 * Responsibility
 * - /auth 系の request/response DTO
 * - validation (形式チェック) 用の validate() を持たせる
 */
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub name: String,
}

impl SignupRequest {
    pub fn validate(&self) -> Result<(), &'static str> {
        if !looks_like_email(self.email.trim()) {
            return Err("Please enter a valid email.");
        }
        if self.password.trim().chars().count() < 5 {
            return Err("password must be at least 5 characters");
        }
        if self.name.trim().is_empty() {
            return Err("name is required");
        }

        Ok(())
    }
}

// local@domain.tld (no whitespace)
fn looks_like_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain
                    .split_once('.')
                    .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty())
        }
        None => false,
    }
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    #[serde(default)]
    pub status: String,
}

impl UpdateStatusRequest {
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.status.trim().is_empty() {
            return Err("status cannot be empty");
        }
        Ok(())
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupResponse {
    pub message: &'static str,
    pub user_id: Uuid,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token: String,
    pub user_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: String,
}

#[derive(Debug, Serialize)]
pub struct StatusUpdatedResponse {
    pub message: &'static str,
    pub status: String,
}
