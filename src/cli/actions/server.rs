use crate::api;
use crate::auth::{GateConfig, ThrottleMode};
use crate::cli::globals::GlobalArgs;
use anyhow::Result;
use std::time::Duration;
use tracing::info;

#[derive(Debug)]
pub struct Args {
    pub port: u16,
    pub dsn: String,
    pub api_key: Option<String>,
    pub enforce_api_key: bool,
    pub validate_identifiers: bool,
    pub require_second_factor: bool,
    pub throttle_mode: ThrottleMode,
    pub throttle_window_seconds: u64,
    pub failure_threshold: i64,
    pub challenge_ttl_seconds: u64,
}

/// Execute the server action.
/// # Errors
/// Returns an error if the database cannot be opened or the server fails to start.
pub async fn execute(args: Args) -> Result<()> {
    log_startup_args(&args);

    let config = GateConfig::new()
        .with_enforce_api_key(args.enforce_api_key)
        .with_validate_identifier_format(args.validate_identifiers)
        .with_require_second_factor(args.require_second_factor)
        .with_throttle_mode(args.throttle_mode)
        .with_throttle_window(Duration::from_secs(args.throttle_window_seconds))
        .with_failure_threshold(args.failure_threshold)
        .with_challenge_ttl(Duration::from_secs(args.challenge_ttl_seconds));

    let globals = GlobalArgs::new(args.api_key);

    api::new(args.port, args.dsn, &globals, config).await
}

fn log_startup_args(args: &Args) {
    // SQLite DSNs carry no credentials, log them as given.
    let entries = [
        ("listen", format!("tcp:{}", args.port)),
        ("dsn", args.dsn.clone()),
        ("throttle_mode", args.throttle_mode.as_str().to_string()),
        (
            "throttle_window_seconds",
            args.throttle_window_seconds.to_string(),
        ),
        ("failure_threshold", args.failure_threshold.to_string()),
        ("enforce_api_key", args.enforce_api_key.to_string()),
        ("api_key_set", args.api_key.is_some().to_string()),
        (
            "validate_identifiers",
            args.validate_identifiers.to_string(),
        ),
        (
            "require_second_factor",
            args.require_second_factor.to_string(),
        ),
        (
            "challenge_ttl_seconds",
            args.challenge_ttl_seconds.to_string(),
        ),
    ];
    log_entries("Startup configuration", &entries);
}

fn log_entries(title: &str, entries: &[(&str, String)]) {
    let max_key_len = entries.iter().map(|(key, _)| key.len()).max().unwrap_or(0);
    let mut message = format!("{title}:");
    for (key, value) in entries {
        let padding = " ".repeat(max_key_len.saturating_sub(key.len()));
        let _ =
            std::fmt::Write::write_fmt(&mut message, format_args!("\n  {key}:{padding} {value}"));
    }
    info!("{message}");
}
