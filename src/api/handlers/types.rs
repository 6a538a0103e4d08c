//! Request/response types for the HTTP surface.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use utoipa::ToSchema;

use crate::bans::BanRecord;
use crate::ledger::UserRecord;

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct CaptchaVerifyRequest {
    pub token: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct CaptchaVerifyResponse {
    pub success: bool,
}

/// Direct identity claim from the game client.
#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct LoginRequest {
    pub id: String,
    pub username: String,
    pub email: String,
    #[serde(default)]
    pub verified: bool,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default)]
    pub hwid: Option<String>,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct LoginResponse {
    pub success: bool,
    pub user: UserRecord,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct BanCheckResponse {
    pub banned: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct BanRequest {
    pub user_id: String,
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct UnbanRequest {
    pub user_id: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct ActionResponse {
    pub success: bool,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct UsersResponse {
    pub total: usize,
    pub users: HashMap<String, UserRecord>,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct BannedResponse {
    pub total: usize,
    pub banned: HashMap<String, BanRecord>,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct StatsResponse {
    pub total_users: usize,
    pub banned_users: usize,
    pub active_users: usize,
    pub total_logins: u64,
}

/// Service summary served at `/`.
#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct StatusResponse {
    pub status: String,
    pub version: String,
    pub users: usize,
    pub banned: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{Context, Result};

    #[test]
    fn login_request_defaults_optional_fields() -> Result<()> {
        let request: LoginRequest = serde_json::from_value(serde_json::json!({
            "id": "u1",
            "username": "alice",
            "email": "a@x.com"
        }))?;
        assert!(!request.verified);
        assert!(request.hwid.is_none());
        Ok(())
    }

    #[test]
    fn login_request_rejects_missing_id() {
        let result: Result<LoginRequest, _> = serde_json::from_value(serde_json::json!({
            "username": "alice",
            "email": "a@x.com"
        }));
        assert!(result.is_err());
    }

    #[test]
    fn ban_check_response_omits_reason_when_not_banned() -> Result<()> {
        let response = BanCheckResponse {
            banned: false,
            reason: None,
        };
        let value = serde_json::to_value(&response)?;
        assert!(value.get("reason").is_none());
        Ok(())
    }

    #[test]
    fn ban_request_round_trips() -> Result<()> {
        let request = BanRequest {
            user_id: "u1".to_string(),
            reason: Some("cheating".to_string()),
        };
        let value = serde_json::to_value(&request)?;
        let user_id = value
            .get("user_id")
            .and_then(serde_json::Value::as_str)
            .context("missing user_id")?;
        assert_eq!(user_id, "u1");
        let decoded: BanRequest = serde_json::from_value(value)?;
        assert_eq!(decoded.reason.as_deref(), Some("cheating"));
        Ok(())
    }
}
