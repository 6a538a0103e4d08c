//! Authorization-code exchange against the identity provider.
//!
//! Two network steps: code → access token, token → profile. OAuth codes are
//! single-use, so nothing here retries; a timed-out or failed exchange is
//! surfaced to the caller and the login aborts before any ledger mutation.

use anyhow::{Context, Result};
use base64::Engine;
use rand::{rngs::OsRng, RngCore};
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, error};
use url::Url;

use crate::ledger::ProviderProfile;

pub const DEFAULT_AUTHORIZE_URL: &str = "https://discord.com/oauth2/authorize";
pub const DEFAULT_TOKEN_URL: &str = "https://discord.com/api/oauth2/token";
pub const DEFAULT_PROFILE_URL: &str = "https://discord.com/api/users/@me";

const DEFAULT_EXCHANGE_TIMEOUT: Duration = Duration::from_secs(10);
const DEFAULT_SCOPES: &str = "identify email";
// Pending authorizations expire well before any provider would expire the code.
const STATE_TTL: Duration = Duration::from_secs(600);

#[derive(Clone, Debug)]
pub struct OAuthConfig {
    client_id: String,
    client_secret: SecretString,
    redirect_url: String,
    authorize_url: String,
    token_url: String,
    profile_url: String,
    scopes: String,
    timeout: Duration,
}

impl OAuthConfig {
    #[must_use]
    pub fn new(client_id: String, client_secret: SecretString, redirect_url: String) -> Self {
        Self {
            client_id,
            client_secret,
            redirect_url,
            authorize_url: DEFAULT_AUTHORIZE_URL.to_string(),
            token_url: DEFAULT_TOKEN_URL.to_string(),
            profile_url: DEFAULT_PROFILE_URL.to_string(),
            scopes: DEFAULT_SCOPES.to_string(),
            timeout: DEFAULT_EXCHANGE_TIMEOUT,
        }
    }

    #[must_use]
    pub fn with_authorize_url(mut self, url: String) -> Self {
        self.authorize_url = url;
        self
    }

    #[must_use]
    pub fn with_token_url(mut self, url: String) -> Self {
        self.token_url = url;
        self
    }

    #[must_use]
    pub fn with_profile_url(mut self, url: String) -> Self {
        self.profile_url = url;
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    #[must_use]
    pub fn redirect_url(&self) -> &str {
        &self.redirect_url
    }

    #[must_use]
    pub fn authorize_url(&self) -> &str {
        &self.authorize_url
    }

    fn client_secret(&self) -> &str {
        self.client_secret.expose_secret()
    }
}

#[derive(Debug, Error)]
pub enum ExchangeError {
    /// The provider rejected the code or token; carries its own description.
    #[error("{0}")]
    Provider(String),
    #[error("identity provider unavailable")]
    Unavailable,
    #[error("identity provider returned an invalid response")]
    InvalidResponse,
}

struct PendingAuthorization {
    remember: bool,
    created_at: Instant,
}

/// Stateless exchange plus the short-lived state map for in-flight
/// authorization redirects.
pub struct OAuthExchange {
    config: OAuthConfig,
    client: Client,
    pending: Mutex<HashMap<String, PendingAuthorization>>,
}

impl OAuthExchange {
    /// # Errors
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: OAuthConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(crate::APP_USER_AGENT)
            .timeout(config.timeout)
            .build()
            .context("failed to build OAuth HTTP client")?;

        Ok(Self {
            config,
            client,
            pending: Mutex::new(HashMap::new()),
        })
    }

    /// Start an authorization: mint a state token remembering the client's
    /// "remember me" choice and build the provider redirect URL.
    ///
    /// # Errors
    /// Returns an error if the configured authorize URL is invalid or the
    /// system RNG fails.
    pub async fn begin(&self, remember: bool) -> Result<String> {
        let state = generate_state()?;

        let mut pending = self.pending.lock().await;
        pending.retain(|_, entry| entry.created_at.elapsed() < STATE_TTL);
        pending.insert(
            state.clone(),
            PendingAuthorization {
                remember,
                created_at: Instant::now(),
            },
        );
        drop(pending);

        let mut url =
            Url::parse(self.config.authorize_url()).context("invalid authorize URL")?;
        url.query_pairs_mut()
            .append_pair("client_id", self.config.client_id())
            .append_pair("redirect_uri", self.config.redirect_url())
            .append_pair("response_type", "code")
            .append_pair("scope", &self.config.scopes)
            .append_pair("state", &state);

        Ok(url.to_string())
    }

    /// Consume a callback state. Returns the "remember me" flag it carried,
    /// or `None` for unknown, expired, or replayed states.
    pub async fn take_state(&self, state: &str) -> Option<bool> {
        let mut pending = self.pending.lock().await;
        pending
            .remove(state)
            .filter(|entry| entry.created_at.elapsed() < STATE_TTL)
            .map(|entry| entry.remember)
    }

    /// Exchange an authorization code for the provider profile.
    ///
    /// # Errors
    /// `Provider` carries the provider's own error description when the
    /// exchange is rejected, `Unavailable` covers network faults and
    /// timeouts, `InvalidResponse` covers unparseable bodies.
    pub async fn exchange(&self, code: &str) -> Result<ProviderProfile, ExchangeError> {
        let access_token = self.fetch_token(code).await?;
        self.fetch_profile(&access_token).await
    }

    async fn fetch_token(&self, code: &str) -> Result<String, ExchangeError> {
        let params = [
            ("client_id", self.config.client_id()),
            ("client_secret", self.config.client_secret()),
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", self.config.redirect_url()),
        ];

        let response = self
            .client
            .post(&self.config.token_url)
            .form(&params)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        let text = response.text().await.map_err(transport_error)?;
        let body: Value = serde_json::from_str(&text).unwrap_or(Value::Null);

        if !status.is_success() {
            // Surface the provider's own message instead of a generic one.
            let description = body
                .get("error_description")
                .and_then(Value::as_str)
                .or_else(|| body.get("error").and_then(Value::as_str))
                .map_or_else(|| format!("token exchange rejected: {status}"), str::to_string);
            debug!(%status, "token exchange rejected by provider");
            return Err(ExchangeError::Provider(description));
        }

        body.get("access_token")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or(ExchangeError::InvalidResponse)
    }

    async fn fetch_profile(&self, access_token: &str) -> Result<ProviderProfile, ExchangeError> {
        let response = self
            .client
            .get(&self.config.profile_url)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(ExchangeError::Provider(format!(
                "profile fetch rejected: {status}"
            )));
        }

        response
            .json::<ProviderProfile>()
            .await
            .map_err(|_| ExchangeError::InvalidResponse)
    }
}

fn transport_error(err: reqwest::Error) -> ExchangeError {
    error!("identity provider request failed: {err}");
    ExchangeError::Unavailable
}

fn generate_state() -> Result<String> {
    let mut bytes = [0u8; 16];
    OsRng
        .try_fill_bytes(&mut bytes)
        .context("failed to generate state token")?;
    Ok(base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes))
}
