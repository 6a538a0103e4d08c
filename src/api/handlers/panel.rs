//! Admin panel operations, all gated on an owner session.
//!
//! The capability check runs once at handler entry and returns a typed
//! authorization failure before any record set is touched.

use axum::{
    extract::{Extension, Path},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::{Duration, Utc};
use std::sync::Arc;
use tracing::error;

use super::session::extract_session_token;
use super::types::{ActionResponse, BanRequest, BannedResponse, StatsResponse, UnbanRequest, UsersResponse};
use crate::bans::BanRegistry;
use crate::ledger::IdentityLedger;
use crate::session::{Role, Session, SessionAuthority, SessionState};

/// Window in which a user counts as active for panel stats.
const ACTIVE_WINDOW_HOURS: i64 = 24;

/// Resolve the request to an owner session or a typed rejection.
pub(crate) async fn require_owner(
    headers: &HeaderMap,
    authority: &SessionAuthority,
) -> Result<Session, (StatusCode, String)> {
    let Some(token) = extract_session_token(headers) else {
        return Err((StatusCode::UNAUTHORIZED, "Missing session".to_string()));
    };
    match authority.validate(&token).await {
        SessionState::Active(session) if session.role == Role::Owner => Ok(session),
        SessionState::Active(_) => Err((StatusCode::FORBIDDEN, "Owner role required".to_string())),
        SessionState::Expired => Err((StatusCode::UNAUTHORIZED, "Session expired".to_string())),
        SessionState::Invalid => Err((StatusCode::UNAUTHORIZED, "Invalid session".to_string())),
    }
}

#[utoipa::path(
    post,
    path = "/api/panel/ban",
    request_body = BanRequest,
    responses(
        (status = 200, description = "Ban recorded", body = ActionResponse),
        (status = 400, description = "Missing user id", body = String),
        (status = 401, description = "Missing or invalid session", body = String),
        (status = 403, description = "Owner role required", body = String)
    ),
    tag = "panel"
)]
pub async fn ban(
    headers: HeaderMap,
    authority: Extension<Arc<SessionAuthority>>,
    bans: Extension<Arc<BanRegistry>>,
    payload: Option<Json<BanRequest>>,
) -> Response {
    let session = match require_owner(&headers, &authority).await {
        Ok(session) => session,
        Err(rejection) => return rejection.into_response(),
    };
    let Some(Json(request)) = payload else {
        return (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response();
    };
    if request.user_id.trim().is_empty() {
        return (StatusCode::BAD_REQUEST, "Missing user id".to_string()).into_response();
    }

    match bans
        .ban(&request.user_id, request.reason, Some(session.identity_id))
        .await
    {
        Ok(_) => (StatusCode::OK, Json(ActionResponse { success: true })).into_response(),
        Err(err) => {
            error!("Failed to persist ban: {err}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to persist ban".to_string(),
            )
                .into_response()
        }
    }
}

#[utoipa::path(
    post,
    path = "/api/panel/unban",
    request_body = UnbanRequest,
    responses(
        (status = 200, description = "Unbanned, or already not banned", body = ActionResponse),
        (status = 400, description = "Missing user id", body = String),
        (status = 401, description = "Missing or invalid session", body = String),
        (status = 403, description = "Owner role required", body = String)
    ),
    tag = "panel"
)]
pub async fn unban(
    headers: HeaderMap,
    authority: Extension<Arc<SessionAuthority>>,
    bans: Extension<Arc<BanRegistry>>,
    payload: Option<Json<UnbanRequest>>,
) -> Response {
    if let Err(rejection) = require_owner(&headers, &authority).await {
        return rejection.into_response();
    }
    let Some(Json(request)) = payload else {
        return (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response();
    };
    if request.user_id.trim().is_empty() {
        return (StatusCode::BAD_REQUEST, "Missing user id".to_string()).into_response();
    }

    remove_ban(&bans, &request.user_id).await
}

#[utoipa::path(
    post,
    path = "/admin/unban/{id}",
    params(("id" = String, Path, description = "Identity id to unban")),
    responses(
        (status = 200, description = "Unbanned, or already not banned", body = ActionResponse),
        (status = 401, description = "Missing or invalid session", body = String),
        (status = 403, description = "Owner role required", body = String)
    ),
    tag = "panel"
)]
pub async fn unban_by_id(
    headers: HeaderMap,
    authority: Extension<Arc<SessionAuthority>>,
    bans: Extension<Arc<BanRegistry>>,
    Path(id): Path<String>,
) -> Response {
    if let Err(rejection) = require_owner(&headers, &authority).await {
        return rejection.into_response();
    }

    remove_ban(&bans, &id).await
}

async fn remove_ban(bans: &BanRegistry, id: &str) -> Response {
    match bans.unban(id).await {
        // Unban is idempotent: an unknown id still reports success.
        Ok(_) => (StatusCode::OK, Json(ActionResponse { success: true })).into_response(),
        Err(err) => {
            error!("Failed to persist unban: {err}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to persist unban".to_string(),
            )
                .into_response()
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/panel/users",
    responses(
        (status = 200, description = "All user records", body = UsersResponse),
        (status = 401, description = "Missing or invalid session", body = String),
        (status = 403, description = "Owner role required", body = String)
    ),
    tag = "panel"
)]
pub async fn users(
    headers: HeaderMap,
    authority: Extension<Arc<SessionAuthority>>,
    ledger: Extension<Arc<IdentityLedger>>,
) -> Response {
    if let Err(rejection) = require_owner(&headers, &authority).await {
        return rejection.into_response();
    }

    let users = ledger.snapshot().await;
    (
        StatusCode::OK,
        Json(UsersResponse {
            total: users.len(),
            users,
        }),
    )
        .into_response()
}

#[utoipa::path(
    get,
    path = "/admin/banned",
    responses(
        (status = 200, description = "All ban records", body = BannedResponse),
        (status = 401, description = "Missing or invalid session", body = String),
        (status = 403, description = "Owner role required", body = String)
    ),
    tag = "panel"
)]
pub async fn banned(
    headers: HeaderMap,
    authority: Extension<Arc<SessionAuthority>>,
    bans: Extension<Arc<BanRegistry>>,
) -> Response {
    if let Err(rejection) = require_owner(&headers, &authority).await {
        return rejection.into_response();
    }

    let banned = bans.snapshot().await;
    (
        StatusCode::OK,
        Json(BannedResponse {
            total: banned.len(),
            banned,
        }),
    )
        .into_response()
}

#[utoipa::path(
    get,
    path = "/api/panel/stats",
    responses(
        (status = 200, description = "Aggregate counts for the panel dashboard", body = StatsResponse),
        (status = 401, description = "Missing or invalid session", body = String),
        (status = 403, description = "Owner role required", body = String)
    ),
    tag = "panel"
)]
pub async fn stats(
    headers: HeaderMap,
    authority: Extension<Arc<SessionAuthority>>,
    ledger: Extension<Arc<IdentityLedger>>,
    bans: Extension<Arc<BanRegistry>>,
) -> Response {
    if let Err(rejection) = require_owner(&headers, &authority).await {
        return rejection.into_response();
    }

    let users = ledger.snapshot().await;
    let cutoff = Utc::now() - Duration::hours(ACTIVE_WINDOW_HOURS);
    let response = StatsResponse {
        total_users: users.len(),
        banned_users: bans.total().await,
        active_users: users
            .values()
            .filter(|user| user.last_login >= cutoff)
            .count(),
        total_logins: users.values().map(|user| user.total_logins).sum(),
    };

    (StatusCode::OK, Json(response)).into_response()
}
