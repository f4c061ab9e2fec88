//! Gate configuration, resolved once at startup.

use std::time::Duration;

const DEFAULT_THROTTLE_WINDOW_SECONDS: u64 = 10 * 60;
const DEFAULT_FAILURE_THRESHOLD: i64 = 3;
const DEFAULT_CHALLENGE_TTL_SECONDS: u64 = 5 * 60;

/// How the throttle policy reacts when a source crosses the failure threshold.
///
/// `Warn` keeps accepting submissions and attaches a warning to their
/// outcomes. `Block` refuses to verify submissions from the source until the
/// window ages out. `Allow` disables throttling entirely.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ThrottleMode {
    Allow,
    Warn,
    Block,
}

impl ThrottleMode {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Self::Allow => "allow",
            Self::Warn => "warn",
            Self::Block => "block",
        }
    }

    pub(crate) fn from_str(value: &str) -> Option<Self> {
        match value.trim() {
            "allow" => Some(Self::Allow),
            "warn" => Some(Self::Warn),
            "block" => Some(Self::Block),
            _ => None,
        }
    }
}

/// Startup configuration for the authentication gate.
///
/// Defaults keep the gate permissive: no api key enforcement, no identifier
/// validation, no second factor, advisory throttling.
#[derive(Clone, Debug)]
pub struct GateConfig {
    enforce_api_key: bool,
    validate_identifier_format: bool,
    require_second_factor: bool,
    throttle_mode: ThrottleMode,
    throttle_window: Duration,
    failure_threshold: i64,
    challenge_ttl: Duration,
}

impl GateConfig {
    #[must_use]
    pub fn new() -> Self {
        Self {
            enforce_api_key: false,
            validate_identifier_format: false,
            require_second_factor: false,
            throttle_mode: ThrottleMode::Warn,
            throttle_window: Duration::from_secs(DEFAULT_THROTTLE_WINDOW_SECONDS),
            failure_threshold: DEFAULT_FAILURE_THRESHOLD,
            challenge_ttl: Duration::from_secs(DEFAULT_CHALLENGE_TTL_SECONDS),
        }
    }

    #[must_use]
    pub fn with_enforce_api_key(mut self, enforce: bool) -> Self {
        self.enforce_api_key = enforce;
        self
    }

    #[must_use]
    pub fn with_validate_identifier_format(mut self, validate: bool) -> Self {
        self.validate_identifier_format = validate;
        self
    }

    #[must_use]
    pub fn with_require_second_factor(mut self, require: bool) -> Self {
        self.require_second_factor = require;
        self
    }

    #[must_use]
    pub fn with_throttle_mode(mut self, mode: ThrottleMode) -> Self {
        self.throttle_mode = mode;
        self
    }

    #[must_use]
    pub fn with_throttle_window(mut self, window: Duration) -> Self {
        self.throttle_window = window;
        self
    }

    #[must_use]
    pub fn with_failure_threshold(mut self, threshold: i64) -> Self {
        self.failure_threshold = threshold;
        self
    }

    #[must_use]
    pub fn with_challenge_ttl(mut self, ttl: Duration) -> Self {
        self.challenge_ttl = ttl;
        self
    }

    #[must_use]
    pub fn enforce_api_key(&self) -> bool {
        self.enforce_api_key
    }

    #[must_use]
    pub fn validate_identifier_format(&self) -> bool {
        self.validate_identifier_format
    }

    #[must_use]
    pub fn require_second_factor(&self) -> bool {
        self.require_second_factor
    }

    #[must_use]
    pub fn throttle_mode(&self) -> ThrottleMode {
        self.throttle_mode
    }

    #[must_use]
    pub fn throttle_window(&self) -> Duration {
        self.throttle_window
    }

    #[must_use]
    pub fn failure_threshold(&self) -> i64 {
        self.failure_threshold
    }

    #[must_use]
    pub fn challenge_ttl(&self) -> Duration {
        self.challenge_ttl
    }
}

impl Default for GateConfig {
    fn default() -> Self {
        Self::new()
    }
}
