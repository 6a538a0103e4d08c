//! Session issuance and validation.
//!
//! Sessions are ephemeral: the authority keeps them in memory, keyed by a
//! SHA-256 hash of the token so raw token values never live server-side.
//! The role is fixed at issuance by comparing the identity id against the
//! configured owner id, and never changes for the life of the session.

use anyhow::{Context, Result};
use base64::Engine;
use chrono::{DateTime, Utc};
use rand::{rngs::OsRng, RngCore};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use utoipa::ToSchema;

const DEFAULT_SESSION_TTL_SECONDS: u64 = 12 * 60 * 60;
const DEFAULT_REMEMBER_TTL_SECONDS: u64 = 30 * 24 * 60 * 60;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Owner,
    Standard,
}

#[derive(Clone, Debug)]
pub struct Session {
    pub identity_id: String,
    pub role: Role,
    pub issued_at: DateTime<Utc>,
    pub remember: bool,
}

/// Validation outcome; expired and unknown tokens are distinct states.
#[derive(Clone, Debug)]
pub enum SessionState {
    Active(Session),
    Expired,
    Invalid,
}

#[derive(Clone, Debug)]
pub struct SessionConfig {
    default_ttl: Duration,
    remember_ttl: Duration,
    owner_id: Option<String>,
    cookie_secure: bool,
}

impl SessionConfig {
    #[must_use]
    pub fn new() -> Self {
        Self {
            default_ttl: Duration::from_secs(DEFAULT_SESSION_TTL_SECONDS),
            remember_ttl: Duration::from_secs(DEFAULT_REMEMBER_TTL_SECONDS),
            owner_id: None,
            cookie_secure: false,
        }
    }

    #[must_use]
    pub fn with_default_ttl_seconds(mut self, seconds: u64) -> Self {
        self.default_ttl = Duration::from_secs(seconds);
        self
    }

    #[must_use]
    pub fn with_remember_ttl_seconds(mut self, seconds: u64) -> Self {
        self.remember_ttl = Duration::from_secs(seconds);
        self
    }

    #[must_use]
    pub fn with_owner_id(mut self, owner_id: Option<String>) -> Self {
        self.owner_id = owner_id;
        self
    }

    #[must_use]
    pub fn with_cookie_secure(mut self, secure: bool) -> Self {
        self.cookie_secure = secure;
        self
    }

    #[must_use]
    pub fn owner_id(&self) -> Option<&str> {
        self.owner_id.as_deref()
    }

    #[must_use]
    pub const fn cookie_secure(&self) -> bool {
        self.cookie_secure
    }

    /// Lifetime applied to a session, depending on its "remember" flag.
    #[must_use]
    pub const fn ttl_for(&self, remember: bool) -> Duration {
        if remember {
            self.remember_ttl
        } else {
            self.default_ttl
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self::new()
    }
}

struct StoredSession {
    session: Session,
    created_at: Instant,
}

/// Exclusive owner of all session state.
pub struct SessionAuthority {
    config: SessionConfig,
    sessions: Mutex<HashMap<Vec<u8>, StoredSession>>,
}

impl SessionAuthority {
    #[must_use]
    pub fn new(config: SessionConfig) -> Self {
        Self {
            config,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    #[must_use]
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Role the configured owner id assigns to `identity_id`.
    #[must_use]
    pub fn role_for(&self, identity_id: &str) -> Role {
        if self.config.owner_id() == Some(identity_id) {
            Role::Owner
        } else {
            Role::Standard
        }
    }

    /// Issue a new session token for `identity_id`.
    ///
    /// The raw token is only returned to the caller for the cookie; the map
    /// stores its hash. Expired entries are pruned on the way in.
    ///
    /// # Errors
    /// Returns an error if the system RNG fails to produce a token.
    pub async fn establish(&self, identity_id: &str, remember: bool) -> Result<String> {
        let token = generate_session_token()?;
        let session = Session {
            identity_id: identity_id.to_string(),
            role: self.role_for(identity_id),
            issued_at: Utc::now(),
            remember,
        };

        let mut sessions = self.sessions.lock().await;
        sessions.retain(|_, stored| {
            stored.created_at.elapsed() < self.config.ttl_for(stored.session.remember)
        });
        sessions.insert(
            hash_session_token(&token),
            StoredSession {
                session,
                created_at: Instant::now(),
            },
        );

        Ok(token)
    }

    pub async fn validate(&self, token: &str) -> SessionState {
        let hash = hash_session_token(token);
        let mut sessions = self.sessions.lock().await;
        let Some(stored) = sessions.get(&hash) else {
            return SessionState::Invalid;
        };
        if stored.created_at.elapsed() < self.config.ttl_for(stored.session.remember) {
            return SessionState::Active(stored.session.clone());
        }
        sessions.remove(&hash);
        SessionState::Expired
    }

    /// Revoked tokens become invalid immediately; revoking an unknown token
    /// is a no-op.
    pub async fn revoke(&self, token: &str) {
        let hash = hash_session_token(token);
        self.sessions.lock().await.remove(&hash);
    }
}

/// 32 random bytes, URL-safe base64. The raw value is only ever sent to the
/// client; server-side state keys off the hash.
fn generate_session_token() -> Result<String> {
    let mut bytes = [0u8; 32];
    OsRng
        .try_fill_bytes(&mut bytes)
        .context("failed to generate session token")?;
    Ok(base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes))
}

fn hash_session_token(token: &str) -> Vec<u8> {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hasher.finalize().to_vec()
}
