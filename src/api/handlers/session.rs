//! Session cookie plumbing and logout.

use axum::{
    extract::Extension,
    http::{
        header::{InvalidHeaderValue, AUTHORIZATION, COOKIE, SET_COOKIE},
        HeaderMap, HeaderValue,
    },
    response::{IntoResponse, Redirect, Response},
};
use std::sync::Arc;
use tracing::error;

use crate::session::{SessionAuthority, SessionConfig};

pub(crate) const SESSION_COOKIE_NAME: &str = "warden_session";

#[utoipa::path(
    get,
    path = "/logout",
    responses(
        (status = 303, description = "Session revoked, cookie cleared, redirect home")
    ),
    tag = "auth"
)]
pub async fn logout(headers: HeaderMap, authority: Extension<Arc<SessionAuthority>>) -> Response {
    if let Some(token) = extract_session_token(&headers) {
        authority.revoke(&token).await;
    }

    // Always clear the cookie, even if no session was attached.
    let mut response = Redirect::to("/").into_response();
    match clear_session_cookie(authority.config()) {
        Ok(cookie) => {
            response.headers_mut().insert(SET_COOKIE, cookie);
        }
        Err(err) => error!("Failed to build session cookie: {err}"),
    }
    response
}

/// Build a `HttpOnly` cookie for a freshly established session.
pub(crate) fn session_cookie(
    token: &str,
    remember: bool,
    config: &SessionConfig,
) -> Result<HeaderValue, InvalidHeaderValue> {
    let max_age = config.ttl_for(remember).as_secs();
    let mut cookie = format!(
        "{SESSION_COOKIE_NAME}={token}; Path=/; HttpOnly; SameSite=Lax; Max-Age={max_age}"
    );
    if config.cookie_secure() {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie)
}

fn clear_session_cookie(config: &SessionConfig) -> Result<HeaderValue, InvalidHeaderValue> {
    let mut cookie =
        format!("{SESSION_COOKIE_NAME}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0");
    if config.cookie_secure() {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie)
}

/// Session token from the cookie, or a bearer header for non-browser clients.
pub(crate) fn extract_session_token(headers: &HeaderMap) -> Option<String> {
    if let Some(token) = extract_bearer_token(headers) {
        return Some(token);
    }
    let header = headers.get(COOKIE)?;
    let value = header.to_str().ok()?;
    for pair in value.split(';') {
        let trimmed = pair.trim();
        let mut parts = trimmed.splitn(2, '=');
        let key = parts.next()?.trim();
        let val = parts.next()?.trim();
        if key == SESSION_COOKIE_NAME {
            return Some(val.to_string());
        }
    }
    None
}

fn extract_bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let trimmed = value.trim();
    let token = trimmed
        .strip_prefix("Bearer ")
        .or_else(|| trimmed.strip_prefix("bearer "))?
        .trim();
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::SessionState;
    use anyhow::{Context, Result};

    #[test]
    fn cookie_uses_lifetime_for_remember_flag() -> Result<()> {
        let config = SessionConfig::new()
            .with_default_ttl_seconds(100)
            .with_remember_ttl_seconds(200);

        let cookie = session_cookie("token", false, &config)?;
        assert!(cookie.to_str()?.contains("Max-Age=100"));

        let cookie = session_cookie("token", true, &config)?;
        assert!(cookie.to_str()?.contains("Max-Age=200"));
        Ok(())
    }

    #[test]
    fn cookie_secure_only_when_configured() -> Result<()> {
        let cookie = session_cookie("token", false, &SessionConfig::new())?;
        assert!(!cookie.to_str()?.contains("Secure"));

        let cookie = session_cookie(
            "token",
            false,
            &SessionConfig::new().with_cookie_secure(true),
        )?;
        assert!(cookie.to_str()?.contains("Secure"));
        Ok(())
    }

    #[test]
    fn extract_prefers_bearer_over_cookie() -> Result<()> {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, "Bearer from-header".parse()?);
        headers.insert(COOKIE, format!("{SESSION_COOKIE_NAME}=from-cookie").parse()?);
        assert_eq!(
            extract_session_token(&headers).as_deref(),
            Some("from-header")
        );
        Ok(())
    }

    #[test]
    fn extract_finds_cookie_among_pairs() -> Result<()> {
        let mut headers = HeaderMap::new();
        headers.insert(
            COOKIE,
            format!("theme=dark; {SESSION_COOKIE_NAME}=tok123; lang=en").parse()?,
        );
        assert_eq!(extract_session_token(&headers).as_deref(), Some("tok123"));
        Ok(())
    }

    #[test]
    fn extract_none_without_session() {
        let headers = HeaderMap::new();
        assert!(extract_session_token(&headers).is_none());
    }

    #[tokio::test]
    async fn logout_revokes_and_clears_cookie() -> Result<()> {
        let authority = Arc::new(SessionAuthority::new(SessionConfig::new()));
        let token = authority.establish("u1", false).await?;

        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, format!("{SESSION_COOKIE_NAME}={token}").parse()?);

        let response = logout(headers, Extension(authority.clone())).await;
        let set_cookie = response
            .headers()
            .get(SET_COOKIE)
            .context("missing Set-Cookie")?;
        assert!(set_cookie.to_str()?.contains("Max-Age=0"));
        assert!(matches!(
            authority.validate(&token).await,
            SessionState::Invalid
        ));
        Ok(())
    }
}
