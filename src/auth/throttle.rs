//! Sliding-window throttle decisions derived from the attempt ledger.

use std::time::Duration;
use tracing::{error, warn};

use super::config::ThrottleMode;
use super::ledger::AttemptLedger;

/// What the gate should do about a source right now.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ThrottleAction {
    Allow,
    Warn,
    Block,
}

/// Outcome of a single evaluation, derived fresh from the ledger and never
/// stored.
#[derive(Clone, Copy, Debug)]
pub struct ThrottleDecision {
    pub recent_failure_count: i64,
    pub action: ThrottleAction,
}

/// Failure-count policy over a trailing window.
///
/// The policy only reads the ledger; recording attempts is the gate's job.
#[derive(Clone, Debug)]
pub struct ThrottlePolicy {
    ledger: AttemptLedger,
    mode: ThrottleMode,
    window: Duration,
    threshold: i64,
}

impl ThrottlePolicy {
    #[must_use]
    pub fn new(
        ledger: AttemptLedger,
        mode: ThrottleMode,
        window: Duration,
        threshold: i64,
    ) -> Self {
        Self {
            ledger,
            mode,
            window,
            threshold,
        }
    }

    /// Count the source's recent failures and decide what to do about them.
    ///
    /// A ledger read failure degrades to a count of zero and is only logged,
    /// keeping the signal advisory even when the store is down.
    pub async fn evaluate(&self, source: &str) -> ThrottleDecision {
        let count = match self.ledger.count_recent_failures(source, self.window).await {
            Ok(count) => count,
            Err(error) => {
                error!("Failed to count recent failures for {source}: {error}");
                0
            }
        };

        let action = if count < self.threshold {
            ThrottleAction::Allow
        } else {
            match self.mode {
                ThrottleMode::Allow => ThrottleAction::Allow,
                ThrottleMode::Warn => ThrottleAction::Warn,
                ThrottleMode::Block => ThrottleAction::Block,
            }
        };

        if action != ThrottleAction::Allow {
            warn!(
                source,
                recent_failures = count,
                threshold = self.threshold,
                "Failed login threshold reached"
            );
        }

        ThrottleDecision {
            recent_failure_count: count,
            action,
        }
    }
}
