use anyhow::{Context, Result};
use clap::{Arg, ArgMatches, Command};
use secrecy::SecretString;

use crate::oauth::{DEFAULT_AUTHORIZE_URL, DEFAULT_PROFILE_URL, DEFAULT_TOKEN_URL};

pub const ARG_OAUTH_CLIENT_ID: &str = "oauth-client-id";
pub const ARG_OAUTH_CLIENT_SECRET: &str = "oauth-client-secret";
pub const ARG_OAUTH_REDIRECT_URL: &str = "oauth-redirect-url";
pub const ARG_OAUTH_AUTHORIZE_URL: &str = "oauth-authorize-url";
pub const ARG_OAUTH_TOKEN_URL: &str = "oauth-token-url";
pub const ARG_OAUTH_PROFILE_URL: &str = "oauth-profile-url";

pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_OAUTH_CLIENT_ID)
                .long(ARG_OAUTH_CLIENT_ID)
                .help("OAuth application client id")
                .env("WARDEN_OAUTH_CLIENT_ID")
                .required(true),
        )
        .arg(
            Arg::new(ARG_OAUTH_CLIENT_SECRET)
                .long(ARG_OAUTH_CLIENT_SECRET)
                .help("OAuth application client secret")
                .env("WARDEN_OAUTH_CLIENT_SECRET")
                .required(true),
        )
        .arg(
            Arg::new(ARG_OAUTH_REDIRECT_URL)
                .long(ARG_OAUTH_REDIRECT_URL)
                .help("Redirect URL registered with the provider, e.g. https://host/callback")
                .env("WARDEN_OAUTH_REDIRECT_URL")
                .required(true),
        )
        .arg(
            Arg::new(ARG_OAUTH_AUTHORIZE_URL)
                .long(ARG_OAUTH_AUTHORIZE_URL)
                .help("Provider authorization endpoint")
                .env("WARDEN_OAUTH_AUTHORIZE_URL")
                .default_value(DEFAULT_AUTHORIZE_URL),
        )
        .arg(
            Arg::new(ARG_OAUTH_TOKEN_URL)
                .long(ARG_OAUTH_TOKEN_URL)
                .help("Provider token endpoint")
                .env("WARDEN_OAUTH_TOKEN_URL")
                .default_value(DEFAULT_TOKEN_URL),
        )
        .arg(
            Arg::new(ARG_OAUTH_PROFILE_URL)
                .long(ARG_OAUTH_PROFILE_URL)
                .help("Provider profile endpoint")
                .env("WARDEN_OAUTH_PROFILE_URL")
                .default_value(DEFAULT_PROFILE_URL),
        )
}

#[derive(Debug)]
pub struct Options {
    pub client_id: String,
    pub client_secret: SecretString,
    pub redirect_url: String,
    pub authorize_url: String,
    pub token_url: String,
    pub profile_url: String,
}

impl Options {
    /// # Errors
    /// Returns an error if a required argument is absent.
    pub fn parse(matches: &ArgMatches) -> Result<Self> {
        let client_id = matches
            .get_one::<String>(ARG_OAUTH_CLIENT_ID)
            .cloned()
            .context("missing required argument: --oauth-client-id")?;
        let client_secret = matches
            .get_one::<String>(ARG_OAUTH_CLIENT_SECRET)
            .cloned()
            .map(SecretString::from)
            .context("missing required argument: --oauth-client-secret")?;
        let redirect_url = matches
            .get_one::<String>(ARG_OAUTH_REDIRECT_URL)
            .cloned()
            .context("missing required argument: --oauth-redirect-url")?;
        let authorize_url = matches
            .get_one::<String>(ARG_OAUTH_AUTHORIZE_URL)
            .cloned()
            .unwrap_or_else(|| DEFAULT_AUTHORIZE_URL.to_string());
        let token_url = matches
            .get_one::<String>(ARG_OAUTH_TOKEN_URL)
            .cloned()
            .unwrap_or_else(|| DEFAULT_TOKEN_URL.to_string());
        let profile_url = matches
            .get_one::<String>(ARG_OAUTH_PROFILE_URL)
            .cloned()
            .unwrap_or_else(|| DEFAULT_PROFILE_URL.to_string());

        Ok(Self {
            client_id,
            client_secret,
            redirect_url,
            authorize_url,
            token_url,
            profile_url,
        })
    }
}
