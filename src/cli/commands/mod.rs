pub mod auth;
pub mod logging;
pub mod oauth;

use clap::{
    builder::{
        styling::{AnsiColor, Effects, Styles},
        ValueParser,
    },
    Arg, ColorChoice, Command,
};

use crate::ledger::HwidPolicy;

pub fn validator_hwid_policy() -> ValueParser {
    ValueParser::from(
        move |value: &str| -> std::result::Result<HwidPolicy, String> { HwidPolicy::parse(value) },
    )
}

#[must_use]
pub fn new() -> Command {
    let styles = Styles::styled()
        .header(AnsiColor::Yellow.on_default() | Effects::BOLD)
        .usage(AnsiColor::Green.on_default() | Effects::BOLD)
        .literal(AnsiColor::Blue.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::Green.on_default());

    let command = Command::new("warden")
        .about("Identity, session, and ban enforcement")
        .version(env!("CARGO_PKG_VERSION"))
        .color(ColorChoice::Auto)
        .styles(styles)
        .arg(
            Arg::new("port")
                .short('p')
                .long("port")
                .help("Port to listen on")
                .default_value("8080")
                .env("WARDEN_PORT")
                .value_parser(clap::value_parser!(u16)),
        )
        .arg(
            Arg::new("data-dir")
                .short('d')
                .long("data-dir")
                .help("Directory holding the users and bans record sets")
                .default_value("data")
                .env("WARDEN_DATA_DIR"),
        )
        .arg(
            Arg::new("owner-id")
                .long("owner-id")
                .help("Identity id granted the owner role on login")
                .env("WARDEN_OWNER_ID"),
        )
        .arg(
            Arg::new("hwid-policy")
                .long("hwid-policy")
                .help("Hardware binding policy: 'strict' rejects mismatches, 'lenient' rebinds")
                .default_value("strict")
                .env("WARDEN_HWID_POLICY")
                .value_parser(validator_hwid_policy()),
        );

    let command = oauth::with_args(command);
    let command = auth::with_args(command);
    logging::with_args(command)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn required_args() -> Vec<&'static str> {
        vec![
            "warden",
            "--oauth-client-id",
            "client-id",
            "--oauth-client-secret",
            "client-secret",
            "--oauth-redirect-url",
            "https://warden.gg/callback",
        ]
    }

    #[test]
    fn test_new() {
        let command = new();

        assert_eq!(command.get_name(), "warden");
        assert_eq!(
            command.get_about().map(ToString::to_string),
            Some("Identity, session, and ban enforcement".to_string())
        );
        assert_eq!(
            command.get_version().map(ToString::to_string),
            Some(env!("CARGO_PKG_VERSION").to_string())
        );
    }

    #[test]
    fn test_check_port_and_data_dir() {
        let command = new();
        let mut args = required_args();
        args.extend(["--port", "9090", "--data-dir", "/var/lib/warden"]);
        let matches = command.get_matches_from(args);

        assert_eq!(matches.get_one::<u16>("port").copied(), Some(9090));
        assert_eq!(
            matches.get_one::<String>("data-dir").cloned(),
            Some("/var/lib/warden".to_string())
        );
    }

    #[test]
    fn test_hwid_policy_values() {
        let command = new();
        let matches = command.get_matches_from(required_args());
        assert_eq!(
            matches.get_one::<HwidPolicy>("hwid-policy").copied(),
            Some(HwidPolicy::Strict)
        );

        let command = new();
        let mut args = required_args();
        args.extend(["--hwid-policy", "lenient"]);
        let matches = command.get_matches_from(args);
        assert_eq!(
            matches.get_one::<HwidPolicy>("hwid-policy").copied(),
            Some(HwidPolicy::Lenient)
        );

        let command = new();
        let mut args = required_args();
        args.extend(["--hwid-policy", "both"]);
        let result = command.try_get_matches_from(args);
        assert!(result.is_err());
    }

    #[test]
    fn test_check_env() {
        temp_env::with_vars(
            [
                ("WARDEN_PORT", Some("443")),
                ("WARDEN_DATA_DIR", Some("/srv/warden")),
                ("WARDEN_OWNER_ID", Some("owner-1")),
                ("WARDEN_HWID_POLICY", Some("lenient")),
                ("WARDEN_OAUTH_CLIENT_ID", Some("client-id")),
                ("WARDEN_OAUTH_CLIENT_SECRET", Some("client-secret")),
                (
                    "WARDEN_OAUTH_REDIRECT_URL",
                    Some("https://warden.gg/callback"),
                ),
                ("WARDEN_LOG_LEVEL", Some("info")),
            ],
            || {
                let command = new();
                let matches = command.get_matches_from(vec!["warden"]);
                assert_eq!(matches.get_one::<u16>("port").copied(), Some(443));
                assert_eq!(
                    matches.get_one::<String>("data-dir").cloned(),
                    Some("/srv/warden".to_string())
                );
                assert_eq!(
                    matches.get_one::<String>("owner-id").cloned(),
                    Some("owner-1".to_string())
                );
                assert_eq!(
                    matches.get_one::<HwidPolicy>("hwid-policy").copied(),
                    Some(HwidPolicy::Lenient)
                );
                assert_eq!(
                    matches.get_one::<u8>(logging::ARG_VERBOSITY).copied(),
                    Some(2)
                );
            },
        );
    }

    #[test]
    fn test_check_log_level_env() {
        // loop cover all possible value_parse
        let levels = ["error", "warn", "info", "debug", "trace"];
        for (index, &level) in levels.iter().enumerate() {
            temp_env::with_vars(
                [
                    ("WARDEN_LOG_LEVEL", Some(level)),
                    ("WARDEN_OAUTH_CLIENT_ID", Some("client-id")),
                    ("WARDEN_OAUTH_CLIENT_SECRET", Some("client-secret")),
                    (
                        "WARDEN_OAUTH_REDIRECT_URL",
                        Some("https://warden.gg/callback"),
                    ),
                ],
                || {
                    let command = new();
                    let matches = command.get_matches_from(vec!["warden"]);
                    assert_eq!(
                        matches.get_one::<u8>(logging::ARG_VERBOSITY).copied(),
                        u8::try_from(index).ok()
                    );
                },
            );
        }
    }

    #[test]
    fn test_check_log_level_verbosity() {
        let levels = ["error", "warn", "info", "debug", "trace"];
        for (index, _) in levels.iter().enumerate() {
            temp_env::with_vars([("WARDEN_LOG_LEVEL", None::<String>)], || {
                let mut args: Vec<String> =
                    required_args().iter().map(ToString::to_string).collect();

                // Add the appropriate number of "-v" flags based on the index
                if index > 0 {
                    let v = format!("-{}", "v".repeat(index));
                    args.push(v);
                }

                let command = new();

                let matches = command.get_matches_from(args);

                assert_eq!(
                    matches.get_one::<u8>(logging::ARG_VERBOSITY).copied(),
                    u8::try_from(index).ok()
                );
            });
        }
    }

    #[test]
    fn test_missing_oauth_args_fail() {
        temp_env::with_vars(
            [
                ("WARDEN_OAUTH_CLIENT_ID", None::<&str>),
                ("WARDEN_OAUTH_CLIENT_SECRET", None::<&str>),
                ("WARDEN_OAUTH_REDIRECT_URL", None::<&str>),
            ],
            || {
                let command = new();
                let result = command.try_get_matches_from(vec!["warden"]);
                assert_eq!(
                    result.map_err(|e| e.kind()),
                    Err(clap::error::ErrorKind::MissingRequiredArgument)
                );
            },
        );
    }
}
