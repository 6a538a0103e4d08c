use crate::{
    api,
    bans::BanRegistry,
    captcha::CaptchaVerifier,
    ledger::{HwidPolicy, IdentityLedger},
    notify::{self, HttpWebhookSender, LogWebhookSender, WebhookSender},
    oauth::{OAuthConfig, OAuthExchange},
    session::{SessionAuthority, SessionConfig},
    store::RecordStore,
};
use anyhow::{Context, Result};
use secrecy::SecretString;
use std::{path::PathBuf, sync::Arc};
use tracing::info;

#[derive(Debug)]
pub struct Args {
    pub port: u16,
    pub data_dir: PathBuf,
    pub owner_id: Option<String>,
    pub hwid_policy: HwidPolicy,
    pub session_ttl_seconds: u64,
    pub session_remember_ttl_seconds: u64,
    pub oauth_client_id: String,
    pub oauth_client_secret: SecretString,
    pub oauth_redirect_url: String,
    pub oauth_authorize_url: String,
    pub oauth_token_url: String,
    pub oauth_profile_url: String,
    pub captcha_secret: SecretString,
    pub captcha_verify_url: String,
    pub webhook_url: Option<SecretString>,
}

/// Execute the server action.
/// # Errors
/// Returns an error if the data directory cannot be created, a component
/// fails to initialize, or the server fails to start.
pub async fn execute(args: Args) -> Result<()> {
    tokio::fs::create_dir_all(&args.data_dir)
        .await
        .with_context(|| {
            format!(
                "failed to create data directory: {}",
                args.data_dir.display()
            )
        })?;

    let sender: Arc<dyn WebhookSender> = match args.webhook_url {
        Some(url) => Arc::new(HttpWebhookSender::new(url)?),
        None => {
            info!("no webhook URL configured, notifications are logged only");
            Arc::new(LogWebhookSender)
        }
    };
    // The worker owns the queue for the life of the process.
    let (notifier, _worker) = notify::spawn_worker(sender);

    let users = RecordStore::open(args.data_dir.join("users.json")).await;
    let bans = RecordStore::open(args.data_dir.join("bans.json")).await;

    // Cookies are marked Secure when the public callback URL is HTTPS.
    let cookie_secure = args.oauth_redirect_url.starts_with("https://");
    let session_config = SessionConfig::new()
        .with_default_ttl_seconds(args.session_ttl_seconds)
        .with_remember_ttl_seconds(args.session_remember_ttl_seconds)
        .with_owner_id(args.owner_id)
        .with_cookie_secure(cookie_secure);

    let oauth_config = OAuthConfig::new(
        args.oauth_client_id,
        args.oauth_client_secret,
        args.oauth_redirect_url,
    )
    .with_authorize_url(args.oauth_authorize_url)
    .with_token_url(args.oauth_token_url)
    .with_profile_url(args.oauth_profile_url);

    let context = api::AppContext {
        ledger: Arc::new(IdentityLedger::new(
            users,
            args.hwid_policy,
            notifier.clone(),
        )),
        bans: Arc::new(BanRegistry::new(bans, notifier)),
        sessions: Arc::new(SessionAuthority::new(session_config)),
        oauth: Arc::new(OAuthExchange::new(oauth_config)?),
        captcha: Arc::new(CaptchaVerifier::new(
            args.captcha_secret,
            args.captcha_verify_url,
        )?),
    };

    api::new(args.port, context).await
}
