use anyhow::{Context, Result};
use clap::{Arg, ArgMatches, Command};
use secrecy::SecretString;

use crate::captcha::DEFAULT_VERIFY_URL;

pub const ARG_SESSION_TTL: &str = "session-ttl-seconds";
pub const ARG_SESSION_REMEMBER_TTL: &str = "session-remember-ttl-seconds";
pub const ARG_CAPTCHA_SECRET: &str = "captcha-secret";
pub const ARG_CAPTCHA_VERIFY_URL: &str = "captcha-verify-url";
pub const ARG_WEBHOOK_URL: &str = "webhook-url";

pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_SESSION_TTL)
                .long(ARG_SESSION_TTL)
                .help("Session lifetime in seconds")
                .env("WARDEN_SESSION_TTL_SECONDS")
                .default_value("43200")
                .value_parser(clap::value_parser!(u64)),
        )
        .arg(
            Arg::new(ARG_SESSION_REMEMBER_TTL)
                .long(ARG_SESSION_REMEMBER_TTL)
                .help("Extended session lifetime for remember-me logins, in seconds")
                .env("WARDEN_SESSION_REMEMBER_TTL_SECONDS")
                .default_value("2592000")
                .value_parser(clap::value_parser!(u64)),
        )
        .arg(
            Arg::new(ARG_CAPTCHA_SECRET)
                .long(ARG_CAPTCHA_SECRET)
                .help("Secret for the captcha verification endpoint")
                .env("WARDEN_CAPTCHA_SECRET")
                .default_value(""),
        )
        .arg(
            Arg::new(ARG_CAPTCHA_VERIFY_URL)
                .long(ARG_CAPTCHA_VERIFY_URL)
                .help("Captcha verification endpoint")
                .env("WARDEN_CAPTCHA_VERIFY_URL")
                .default_value(DEFAULT_VERIFY_URL),
        )
        .arg(
            Arg::new(ARG_WEBHOOK_URL)
                .long(ARG_WEBHOOK_URL)
                .help("Webhook URL for event notifications; omit to log events only")
                .env("WARDEN_WEBHOOK_URL"),
        )
}

#[derive(Debug)]
pub struct Options {
    pub session_ttl_seconds: u64,
    pub session_remember_ttl_seconds: u64,
    pub captcha_secret: SecretString,
    pub captcha_verify_url: String,
    pub webhook_url: Option<SecretString>,
}

impl Options {
    /// # Errors
    /// Returns an error if a defaulted argument is unexpectedly absent.
    pub fn parse(matches: &ArgMatches) -> Result<Self> {
        let session_ttl_seconds = matches
            .get_one::<u64>(ARG_SESSION_TTL)
            .copied()
            .context("missing argument: --session-ttl-seconds")?;
        let session_remember_ttl_seconds = matches
            .get_one::<u64>(ARG_SESSION_REMEMBER_TTL)
            .copied()
            .context("missing argument: --session-remember-ttl-seconds")?;
        let captcha_secret = matches
            .get_one::<String>(ARG_CAPTCHA_SECRET)
            .cloned()
            .map(SecretString::from)
            .unwrap_or_else(|| SecretString::from(String::new()));
        let captcha_verify_url = matches
            .get_one::<String>(ARG_CAPTCHA_VERIFY_URL)
            .cloned()
            .unwrap_or_else(|| DEFAULT_VERIFY_URL.to_string());
        let webhook_url = matches
            .get_one::<String>(ARG_WEBHOOK_URL)
            .cloned()
            .map(SecretString::from);

        Ok(Self {
            session_ttl_seconds,
            session_remember_ttl_seconds,
            captcha_secret,
            captcha_verify_url,
            webhook_url,
        })
    }
}
