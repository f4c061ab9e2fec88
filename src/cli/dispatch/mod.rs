use crate::cli::actions::{server::Args, Action};
use crate::cli::commands::gate;
use anyhow::{Context, Result};

/// # Errors
/// Returns an error if required arguments are missing or inconsistent.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let port = matches.get_one::<u16>("port").copied().unwrap_or(8080);
    let dsn = matches
        .get_one::<String>("dsn")
        .cloned()
        .context("missing required argument: --dsn")?;

    let options = gate::Options::parse(matches)?;

    Ok(Action::Server(Args {
        port,
        dsn,
        api_key: options.api_key,
        enforce_api_key: options.enforce_api_key,
        validate_identifiers: options.validate_identifiers,
        require_second_factor: options.require_second_factor,
        throttle_mode: options.throttle_mode,
        throttle_window_seconds: options.throttle_window_seconds,
        failure_threshold: options.failure_threshold,
        challenge_ttl_seconds: options.challenge_ttl_seconds,
    }))
}

#[cfg(test)]
mod tests {
    use super::handler;
    use crate::auth::ThrottleMode;
    use crate::cli::actions::Action;
    use crate::cli::commands;
    use anyhow::Result;

    #[test]
    fn handler_maps_matches_to_server_args() -> Result<()> {
        let matches = commands::new().get_matches_from(vec![
            "guardia",
            "--port",
            "9090",
            "--dsn",
            "sqlite://gate.db",
            "--throttle-mode",
            "block",
        ]);

        let Action::Server(args) = handler(&matches)?;

        assert_eq!(args.port, 9090);
        assert_eq!(args.dsn, "sqlite://gate.db");
        assert_eq!(args.throttle_mode, ThrottleMode::Block);
        assert!(!args.require_second_factor);
        Ok(())
    }

    #[test]
    fn handler_from_env() -> Result<()> {
        temp_env::with_vars(
            [
                ("GUARDIA_PORT", Some("8443")),
                ("GUARDIA_DSN", Some("sqlite://env.db")),
                ("GUARDIA_API_KEY", Some("sekret")),
                ("GUARDIA_ENFORCE_API_KEY", Some("true")),
            ],
            || -> Result<()> {
                let matches = commands::new().get_matches_from(vec!["guardia"]);

                let Action::Server(args) = handler(&matches)?;

                assert_eq!(args.port, 8443);
                assert_eq!(args.dsn, "sqlite://env.db");
                assert_eq!(args.api_key.as_deref(), Some("sekret"));
                assert!(args.enforce_api_key);
                Ok(())
            },
        )
    }
}
