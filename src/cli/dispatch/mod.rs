//! Command-line argument dispatch.
//!
//! Maps validated CLI matches to the action the binary executes, collecting
//! every configuration knob into the server's `Args`.

use crate::cli::actions::{server::Args, Action};
use crate::cli::commands::{auth, oauth};
use crate::ledger::HwidPolicy;
use anyhow::{Context, Result};
use std::path::PathBuf;

/// Map validated CLI matches to a server action.
///
/// # Errors
/// Returns an error if required arguments are missing.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let port = matches.get_one::<u16>("port").copied().unwrap_or(8080);
    let data_dir = matches
        .get_one::<String>("data-dir")
        .map(PathBuf::from)
        .context("missing argument: --data-dir")?;
    let owner_id = matches.get_one::<String>("owner-id").cloned();
    let hwid_policy = matches
        .get_one::<HwidPolicy>("hwid-policy")
        .copied()
        .unwrap_or(HwidPolicy::Strict);

    let oauth_opts = oauth::Options::parse(matches)?;
    let auth_opts = auth::Options::parse(matches)?;

    Ok(Action::Server(Args {
        port,
        data_dir,
        owner_id,
        hwid_policy,
        session_ttl_seconds: auth_opts.session_ttl_seconds,
        session_remember_ttl_seconds: auth_opts.session_remember_ttl_seconds,
        oauth_client_id: oauth_opts.client_id,
        oauth_client_secret: oauth_opts.client_secret,
        oauth_redirect_url: oauth_opts.redirect_url,
        oauth_authorize_url: oauth_opts.authorize_url,
        oauth_token_url: oauth_opts.token_url,
        oauth_profile_url: oauth_opts.profile_url,
        captcha_secret: auth_opts.captcha_secret,
        captcha_verify_url: auth_opts.captcha_verify_url,
        webhook_url: auth_opts.webhook_url,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handler_builds_server_action_from_env() {
        temp_env::with_vars(
            [
                ("WARDEN_PORT", Some("9000")),
                ("WARDEN_DATA_DIR", Some("/srv/warden")),
                ("WARDEN_OWNER_ID", Some("owner-1")),
                ("WARDEN_HWID_POLICY", Some("lenient")),
                ("WARDEN_OAUTH_CLIENT_ID", Some("client-id")),
                ("WARDEN_OAUTH_CLIENT_SECRET", Some("client-secret")),
                (
                    "WARDEN_OAUTH_REDIRECT_URL",
                    Some("https://warden.gg/callback"),
                ),
                ("WARDEN_SESSION_TTL_SECONDS", Some("60")),
                ("WARDEN_WEBHOOK_URL", Some("https://hooks.example/warden")),
            ],
            || {
                let command = crate::cli::commands::new();
                let matches = command.get_matches_from(vec!["warden"]);
                let action = handler(&matches).expect("handler succeeds");

                let Action::Server(args) = action;
                assert_eq!(args.port, 9000);
                assert_eq!(args.data_dir, PathBuf::from("/srv/warden"));
                assert_eq!(args.owner_id.as_deref(), Some("owner-1"));
                assert_eq!(args.hwid_policy, HwidPolicy::Lenient);
                assert_eq!(args.session_ttl_seconds, 60);
                assert!(args.webhook_url.is_some());
            },
        );
    }

    #[test]
    fn handler_applies_defaults() {
        temp_env::with_vars(
            [
                ("WARDEN_PORT", None::<&str>),
                ("WARDEN_DATA_DIR", None),
                ("WARDEN_HWID_POLICY", None),
                ("WARDEN_SESSION_TTL_SECONDS", None),
                ("WARDEN_WEBHOOK_URL", None),
                ("WARDEN_OAUTH_CLIENT_ID", Some("client-id")),
                ("WARDEN_OAUTH_CLIENT_SECRET", Some("client-secret")),
                (
                    "WARDEN_OAUTH_REDIRECT_URL",
                    Some("https://warden.gg/callback"),
                ),
            ],
            || {
                let command = crate::cli::commands::new();
                let matches = command.get_matches_from(vec!["warden"]);
                let action = handler(&matches).expect("handler succeeds");

                let Action::Server(args) = action;
                assert_eq!(args.port, 8080);
                assert_eq!(args.data_dir, PathBuf::from("data"));
                assert_eq!(args.hwid_policy, HwidPolicy::Strict);
                assert_eq!(args.session_ttl_seconds, 43200);
                assert!(args.webhook_url.is_none());
                assert_eq!(
                    args.oauth_authorize_url,
                    crate::oauth::DEFAULT_AUTHORIZE_URL
                );
            },
        );
    }
}
