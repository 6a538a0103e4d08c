//! Challenge-token verification gate.
//!
//! Used before accepting client-submitted identity claims that are not
//! mediated by OAuth. Any failure mode — missing token, network fault,
//! timeout, non-success verdict — is a plain `false`, never an error.

use anyhow::{Context, Result};
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde_json::{json, Value};
use std::time::Duration;
use tracing::error;

pub const DEFAULT_VERIFY_URL: &str = "https://challenges.cloudflare.com/turnstile/v0/siteverify";

const VERIFY_TIMEOUT: Duration = Duration::from_secs(5);

pub struct CaptchaVerifier {
    secret: SecretString,
    verify_url: String,
    client: Client,
}

impl CaptchaVerifier {
    /// # Errors
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(secret: SecretString, verify_url: String) -> Result<Self> {
        let client = Client::builder()
            .user_agent(crate::APP_USER_AGENT)
            .timeout(VERIFY_TIMEOUT)
            .build()
            .context("failed to build captcha HTTP client")?;

        Ok(Self {
            secret,
            verify_url,
            client,
        })
    }

    pub async fn verify(&self, token: &str) -> bool {
        if token.trim().is_empty() {
            return false;
        }

        let payload = json!({
            "secret": self.secret.expose_secret(),
            "response": token,
        });

        let response = match self.client.post(&self.verify_url).json(&payload).send().await {
            Ok(response) => response,
            Err(err) => {
                error!("captcha verification request failed: {err}");
                return false;
            }
        };

        match response.json::<Value>().await {
            Ok(body) => body
                .get("success")
                .and_then(Value::as_bool)
                .unwrap_or(false),
            Err(err) => {
                error!("captcha verification response unreadable: {err}");
                false
            }
        }
    }
}
