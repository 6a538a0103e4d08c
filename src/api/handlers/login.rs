//! Direct-claim login and ban lookup for the game client.

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;
use tracing::error;

use super::types::{BanCheckResponse, LoginRequest, LoginResponse};
use super::valid_email;
use crate::bans::BanRegistry;
use crate::ledger::{IdentityLedger, LoginError, ProviderProfile};

#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login recorded", body = LoginResponse),
        (status = 400, description = "Missing or invalid claim fields", body = String),
        (status = 403, description = "Banned, or hardware fingerprint mismatch under the strict policy", body = String),
        (status = 500, description = "Record could not be persisted", body = String)
    ),
    tag = "auth"
)]
pub async fn login(
    ledger: Extension<Arc<IdentityLedger>>,
    bans: Extension<Arc<BanRegistry>>,
    payload: Option<Json<LoginRequest>>,
) -> Response {
    let Some(Json(request)) = payload else {
        return (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response();
    };
    if request.id.trim().is_empty() {
        return (StatusCode::BAD_REQUEST, "Missing user id".to_string()).into_response();
    }
    if !request.email.is_empty() && !valid_email(&request.email) {
        return (StatusCode::BAD_REQUEST, "Invalid email".to_string()).into_response();
    }

    // Ban check comes first: banned identities never touch the ledger.
    if let Some(ban) = bans.is_banned(&request.id).await {
        return (
            StatusCode::FORBIDDEN,
            format!("User is banned: {}", ban.reason),
        )
            .into_response();
    }

    let profile = ProviderProfile {
        id: request.id,
        username: request.username,
        email: request.email,
        verified: request.verified,
        avatar: request.avatar,
    };

    match ledger.record_login(&profile, request.hwid.as_deref()).await {
        Ok((user, _created)) => {
            (StatusCode::OK, Json(LoginResponse { success: true, user })).into_response()
        }
        Err(LoginError::HardwareMismatch) => {
            (StatusCode::FORBIDDEN, "HWID mismatch".to_string()).into_response()
        }
        Err(LoginError::Store(err)) => {
            error!("Failed to record login: {err}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to record login".to_string(),
            )
                .into_response()
        }
    }
}

#[utoipa::path(
    get,
    path = "/auth/check_ban/{id}",
    params(("id" = String, Path, description = "Identity id to check")),
    responses(
        (status = 200, description = "Ban state for the id", body = BanCheckResponse)
    ),
    tag = "auth"
)]
pub async fn check_ban(
    bans: Extension<Arc<BanRegistry>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    match bans.is_banned(&id).await {
        Some(ban) => Json(BanCheckResponse {
            banned: true,
            reason: Some(ban.reason),
        }),
        None => Json(BanCheckResponse {
            banned: false,
            reason: None,
        }),
    }
}
