//! Provider login redirect and OAuth callback.
//!
//! The callback is the only place sessions are born: exchange the code,
//! check the ban list, record the login, then issue the cookie and redirect
//! by role. Any upstream failure aborts before the ledger is touched.

use axum::{
    extract::rejection::QueryRejection,
    extract::{Extension, Query},
    http::{header::SET_COOKIE, StatusCode},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::error;
use utoipa::IntoParams;

use super::session::session_cookie;
use crate::bans::BanRegistry;
use crate::ledger::{IdentityLedger, LoginError};
use crate::oauth::{ExchangeError, OAuthExchange};
use crate::session::{Role, SessionAuthority};

#[derive(IntoParams, Debug, Deserialize, Default)]
#[into_params(parameter_in = Query)]
pub struct AuthorizeArgs {
    /// Extend the session lifetime ("remember me").
    #[serde(default)]
    remember: bool,
}

#[utoipa::path(
    get,
    path = "/auth/discord",
    params(AuthorizeArgs),
    responses(
        (status = 303, description = "Redirect to the identity provider's authorization endpoint"),
        (status = 500, description = "Authorization redirect could not be built", body = String)
    ),
    tag = "auth"
)]
pub async fn authorize(
    exchange: Extension<Arc<OAuthExchange>>,
    Query(args): Query<AuthorizeArgs>,
) -> Response {
    match exchange.begin(args.remember).await {
        Ok(location) => Redirect::to(&location).into_response(),
        Err(err) => {
            error!("Failed to build authorization redirect: {err}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to start login".to_string(),
            )
                .into_response()
        }
    }
}

#[derive(IntoParams, Debug, Deserialize)]
#[into_params(parameter_in = Query)]
pub struct CallbackArgs {
    code: String,
    state: String,
}

#[utoipa::path(
    get,
    path = "/callback",
    params(CallbackArgs),
    responses(
        (status = 303, description = "Session established, redirect by role"),
        (status = 400, description = "Missing code, or unknown/expired state", body = String),
        (status = 401, description = "Provider rejected the code; body carries its description", body = String),
        (status = 403, description = "Identity is banned", body = String),
        (status = 502, description = "Provider returned an invalid response", body = String),
        (status = 503, description = "Provider unavailable, retry later", body = String)
    ),
    tag = "auth"
)]
pub async fn callback(
    exchange: Extension<Arc<OAuthExchange>>,
    bans: Extension<Arc<BanRegistry>>,
    ledger: Extension<Arc<IdentityLedger>>,
    authority: Extension<Arc<SessionAuthority>>,
    query: Result<Query<CallbackArgs>, QueryRejection>,
) -> Response {
    let Ok(Query(args)) = query else {
        return (
            StatusCode::BAD_REQUEST,
            "Missing code or state".to_string(),
        )
            .into_response();
    };

    // The state must be one we issued; it also carries the remember flag.
    let Some(remember) = exchange.take_state(&args.state).await else {
        return (
            StatusCode::BAD_REQUEST,
            "Unknown or expired state".to_string(),
        )
            .into_response();
    };

    let profile = match exchange.exchange(&args.code).await {
        Ok(profile) => profile,
        Err(ExchangeError::Provider(description)) => {
            return (StatusCode::UNAUTHORIZED, description).into_response();
        }
        Err(ExchangeError::Unavailable) => {
            return (
                StatusCode::SERVICE_UNAVAILABLE,
                "Identity provider unavailable".to_string(),
            )
                .into_response();
        }
        Err(ExchangeError::InvalidResponse) => {
            return (
                StatusCode::BAD_GATEWAY,
                "Identity provider returned an invalid response".to_string(),
            )
                .into_response();
        }
    };

    if let Some(ban) = bans.is_banned(&profile.id).await {
        return (
            StatusCode::FORBIDDEN,
            format!("User is banned: {}", ban.reason),
        )
            .into_response();
    }

    // OAuth logins carry no hardware fingerprint; an existing binding is kept.
    if let Err(err) = ledger.record_login(&profile, None).await {
        match err {
            LoginError::HardwareMismatch => {
                return (StatusCode::FORBIDDEN, "HWID mismatch".to_string()).into_response();
            }
            LoginError::Store(err) => {
                error!("Failed to record login: {err}");
                return (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Failed to record login".to_string(),
                )
                    .into_response();
            }
        }
    }

    let token = match authority.establish(&profile.id, remember).await {
        Ok(token) => token,
        Err(err) => {
            error!("Failed to establish session: {err}");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to establish session".to_string(),
            )
                .into_response();
        }
    };

    let destination = match authority.role_for(&profile.id) {
        Role::Owner => "/admin",
        Role::Standard => "/",
    };
    let mut response = Redirect::to(destination).into_response();
    match session_cookie(&token, remember, authority.config()) {
        Ok(cookie) => {
            response.headers_mut().insert(SET_COOKIE, cookie);
        }
        Err(err) => error!("Failed to build session cookie: {err}"),
    }
    response
}
