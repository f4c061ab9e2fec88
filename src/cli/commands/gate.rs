use anyhow::{Context, Result};
use clap::{builder::ValueParser, Arg, ArgAction, Command};

use crate::auth::ThrottleMode;

pub const ARG_API_KEY: &str = "api-key";
pub const ARG_ENFORCE_API_KEY: &str = "enforce-api-key";
pub const ARG_VALIDATE_IDENTIFIERS: &str = "validate-identifiers";
pub const ARG_REQUIRE_SECOND_FACTOR: &str = "require-second-factor";
pub const ARG_THROTTLE_MODE: &str = "throttle-mode";
pub const ARG_THROTTLE_WINDOW_SECONDS: &str = "throttle-window-seconds";
pub const ARG_FAILURE_THRESHOLD: &str = "failure-threshold";
pub const ARG_CHALLENGE_TTL_SECONDS: &str = "challenge-ttl-seconds";

#[must_use]
pub fn validator_throttle_mode() -> ValueParser {
    ValueParser::from(
        move |mode: &str| -> std::result::Result<ThrottleMode, String> {
            ThrottleMode::from_str(mode)
                .ok_or_else(|| "must be one of: allow, warn, block".to_string())
        },
    )
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_API_KEY)
                .long(ARG_API_KEY)
                .help("Shared key login submissions must present")
                .env("GUARDIA_API_KEY"),
        )
        .arg(
            Arg::new(ARG_ENFORCE_API_KEY)
                .long(ARG_ENFORCE_API_KEY)
                .help("Refuse login submissions without the shared key")
                .env("GUARDIA_ENFORCE_API_KEY")
                .action(ArgAction::SetTrue)
                .requires(ARG_API_KEY),
        )
        .arg(
            Arg::new(ARG_VALIDATE_IDENTIFIERS)
                .long(ARG_VALIDATE_IDENTIFIERS)
                .help("Reject usernames and passwords outside 3-20 word characters")
                .env("GUARDIA_VALIDATE_IDENTIFIERS")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new(ARG_REQUIRE_SECOND_FACTOR)
                .long(ARG_REQUIRE_SECOND_FACTOR)
                .help("Require a one-time code after credential verification")
                .env("GUARDIA_REQUIRE_SECOND_FACTOR")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new(ARG_THROTTLE_MODE)
                .long(ARG_THROTTLE_MODE)
                .help("Reaction to a source over the failure threshold: allow, warn or block")
                .env("GUARDIA_THROTTLE_MODE")
                .default_value("warn")
                .value_parser(validator_throttle_mode()),
        )
        .arg(
            Arg::new(ARG_THROTTLE_WINDOW_SECONDS)
                .long(ARG_THROTTLE_WINDOW_SECONDS)
                .help("Trailing window for counting failed attempts, in seconds")
                .env("GUARDIA_THROTTLE_WINDOW_SECONDS")
                .default_value("600")
                .value_parser(clap::value_parser!(u64)),
        )
        .arg(
            Arg::new(ARG_FAILURE_THRESHOLD)
                .long(ARG_FAILURE_THRESHOLD)
                .help("Failed attempts inside the window before the throttle reacts")
                .env("GUARDIA_FAILURE_THRESHOLD")
                .default_value("3")
                .value_parser(clap::value_parser!(i64)),
        )
        .arg(
            Arg::new(ARG_CHALLENGE_TTL_SECONDS)
                .long(ARG_CHALLENGE_TTL_SECONDS)
                .help("Lifetime of an issued one-time code, in seconds")
                .env("GUARDIA_CHALLENGE_TTL_SECONDS")
                .default_value("300")
                .value_parser(clap::value_parser!(u64)),
        )
}

/// Gate options resolved from CLI matches.
#[derive(Debug)]
pub struct Options {
    pub api_key: Option<String>,
    pub enforce_api_key: bool,
    pub validate_identifiers: bool,
    pub require_second_factor: bool,
    pub throttle_mode: ThrottleMode,
    pub throttle_window_seconds: u64,
    pub failure_threshold: i64,
    pub challenge_ttl_seconds: u64,
}

impl Options {
    /// # Errors
    /// Returns an error when defaulted arguments are missing from the matches.
    pub fn parse(matches: &clap::ArgMatches) -> Result<Self> {
        let throttle_mode = matches
            .get_one::<ThrottleMode>(ARG_THROTTLE_MODE)
            .copied()
            .context("missing throttle mode")?;
        let throttle_window_seconds = matches
            .get_one::<u64>(ARG_THROTTLE_WINDOW_SECONDS)
            .copied()
            .context("missing throttle window")?;
        let failure_threshold = matches
            .get_one::<i64>(ARG_FAILURE_THRESHOLD)
            .copied()
            .context("missing failure threshold")?;
        let challenge_ttl_seconds = matches
            .get_one::<u64>(ARG_CHALLENGE_TTL_SECONDS)
            .copied()
            .context("missing challenge ttl")?;

        Ok(Self {
            api_key: matches.get_one::<String>(ARG_API_KEY).cloned(),
            enforce_api_key: matches.get_flag(ARG_ENFORCE_API_KEY),
            validate_identifiers: matches.get_flag(ARG_VALIDATE_IDENTIFIERS),
            require_second_factor: matches.get_flag(ARG_REQUIRE_SECOND_FACTOR),
            throttle_mode,
            throttle_window_seconds,
            failure_threshold,
            challenge_ttl_seconds,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{Options, ARG_THROTTLE_MODE};
    use crate::auth::ThrottleMode;
    use crate::cli::commands;
    use anyhow::Result;

    #[test]
    fn parse_defaults() -> Result<()> {
        let matches = commands::new().get_matches_from(vec![
            "guardia",
            "--dsn",
            "sqlite://guardia.db",
        ]);

        let options = Options::parse(&matches)?;

        assert_eq!(options.api_key, None);
        assert!(!options.enforce_api_key);
        assert!(!options.validate_identifiers);
        assert!(!options.require_second_factor);
        assert_eq!(options.throttle_mode, ThrottleMode::Warn);
        assert_eq!(options.throttle_window_seconds, 600);
        assert_eq!(options.failure_threshold, 3);
        assert_eq!(options.challenge_ttl_seconds, 300);
        Ok(())
    }

    #[test]
    fn parse_full_flags() -> Result<()> {
        let matches = commands::new().get_matches_from(vec![
            "guardia",
            "--dsn",
            "sqlite://guardia.db",
            "--api-key",
            "sekret",
            "--enforce-api-key",
            "--validate-identifiers",
            "--require-second-factor",
            "--throttle-mode",
            "block",
            "--throttle-window-seconds",
            "120",
            "--failure-threshold",
            "5",
            "--challenge-ttl-seconds",
            "60",
        ]);

        let options = Options::parse(&matches)?;

        assert_eq!(options.api_key.as_deref(), Some("sekret"));
        assert!(options.enforce_api_key);
        assert!(options.validate_identifiers);
        assert!(options.require_second_factor);
        assert_eq!(options.throttle_mode, ThrottleMode::Block);
        assert_eq!(options.throttle_window_seconds, 120);
        assert_eq!(options.failure_threshold, 5);
        assert_eq!(options.challenge_ttl_seconds, 60);
        Ok(())
    }

    #[test]
    fn throttle_mode_values_round_trip() {
        for (value, mode) in [
            ("allow", ThrottleMode::Allow),
            ("warn", ThrottleMode::Warn),
            ("block", ThrottleMode::Block),
        ] {
            let matches = commands::new().get_matches_from(vec![
                "guardia",
                "--dsn",
                "sqlite://guardia.db",
                "--throttle-mode",
                value,
            ]);
            assert_eq!(
                matches.get_one::<ThrottleMode>(ARG_THROTTLE_MODE).copied(),
                Some(mode)
            );
        }
    }
}
