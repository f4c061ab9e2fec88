//! Orchestration of a login submission from verification to session.

use chrono::Utc;
use regex::Regex;
use std::sync::Arc;
use tracing::{debug, error, info};

use super::challenge::{self, ChallengeOutcome, ChallengeSender};
use super::config::{GateConfig, ThrottleMode};
use super::error::AuthError;
use super::ledger::{AttemptLedger, AttemptOutcome};
use super::session::{PendingSession, SessionStore};
use super::throttle::{ThrottleAction, ThrottlePolicy};
use super::verifier::{CredentialVerifier, Verification};

/// Result of one login submission.
#[derive(Clone, Debug)]
pub enum GateOutcome {
    /// Credentials matched and no second factor is required. The session
    /// token is the caller's proof of login.
    Authenticated {
        username: String,
        session_token: String,
        rate_limit_warning: bool,
    },
    /// Credentials matched but a one-time code must be verified before the
    /// login completes. The token names the pending session.
    PendingSecondFactor {
        session_token: String,
        rate_limit_warning: bool,
    },
    InvalidCredentials {
        rate_limit_warning: bool,
    },
    /// Enforcing throttle only: the source has to wait out the window.
    /// Nothing was verified and nothing was recorded.
    RateLimited {
        recent_failure_count: i64,
    },
}

/// The authentication gate. Owns the sequencing between verifier, ledger,
/// throttle policy and the second-factor session store.
pub struct Gate {
    config: GateConfig,
    verifier: CredentialVerifier,
    ledger: AttemptLedger,
    throttle: ThrottlePolicy,
    sessions: Arc<dyn SessionStore>,
    sender: Arc<dyn ChallengeSender>,
}

impl Gate {
    #[must_use]
    pub fn new(
        config: GateConfig,
        verifier: CredentialVerifier,
        ledger: AttemptLedger,
        sessions: Arc<dyn SessionStore>,
        sender: Arc<dyn ChallengeSender>,
    ) -> Self {
        let throttle = ThrottlePolicy::new(
            ledger.clone(),
            config.throttle_mode(),
            config.throttle_window(),
            config.failure_threshold(),
        );
        Self {
            config,
            verifier,
            ledger,
            throttle,
            sessions,
            sender,
        }
    }

    #[must_use]
    pub fn config(&self) -> &GateConfig {
        &self.config
    }

    /// Run one login submission through the gate.
    ///
    /// The attempt is verified first and recorded second, so the throttle
    /// sees a failure in the same submission that produced it. Ledger write
    /// failures are logged and do not change the outcome.
    ///
    /// # Errors
    /// Returns `AuthError` when the credential store is unreachable or a
    /// session cannot be issued.
    pub async fn submit(
        &self,
        source: &str,
        username: &str,
        password: &str,
    ) -> Result<GateOutcome, AuthError> {
        // In enforcing mode an over-threshold source is refused before any
        // verification, and the refused submission leaves no ledger row.
        if self.config.throttle_mode() == ThrottleMode::Block {
            let decision = self.throttle.evaluate(source).await;
            if decision.action == ThrottleAction::Block {
                info!(
                    source,
                    recent_failures = decision.recent_failure_count,
                    "Login refused by throttle"
                );
                return Ok(GateOutcome::RateLimited {
                    recent_failure_count: decision.recent_failure_count,
                });
            }
        }

        let verification = if self.config.validate_identifier_format()
            && !(valid_identifier(username) && valid_identifier(password))
        {
            // Malformed identifiers never reach the credential store.
            debug!(source, "Identifier format rejected");
            Verification::NoMatch
        } else {
            self.verifier.verify(username, password).await?
        };

        let outcome = match verification {
            Verification::Match => AttemptOutcome::Success,
            Verification::NoMatch => AttemptOutcome::Failure,
        };

        if let Err(error) = self.ledger.record(source, username, outcome).await {
            error!("Failed to record login attempt: {error}");
        }

        let rate_limit_warning = match self.config.throttle_mode() {
            ThrottleMode::Warn => {
                self.throttle.evaluate(source).await.action == ThrottleAction::Warn
            }
            ThrottleMode::Allow | ThrottleMode::Block => false,
        };

        match verification {
            Verification::Match if self.config.require_second_factor() => {
                let session_token = self.issue_challenge(username)?;
                Ok(GateOutcome::PendingSecondFactor {
                    session_token,
                    rate_limit_warning,
                })
            }
            Verification::Match => {
                let session_token =
                    challenge::generate_session_token().map_err(AuthError::Session)?;
                debug!(username, "Login complete");
                Ok(GateOutcome::Authenticated {
                    username: username.to_string(),
                    session_token,
                    rate_limit_warning,
                })
            }
            Verification::NoMatch => Ok(GateOutcome::InvalidCredentials { rate_limit_warning }),
        }
    }

    /// Resolve a pending session's one-time code submission.
    ///
    /// The pending session is consumed whatever the outcome, so a challenge
    /// accepts exactly one verification submission. Expiry is checked before
    /// the code, and an expired challenge stays expired even with the right
    /// code in hand.
    ///
    /// # Errors
    /// Returns `AuthError::Session` when the completed session token cannot
    /// be generated.
    pub fn verify_challenge(
        &self,
        session_token: &str,
        submitted_code: &str,
    ) -> Result<ChallengeOutcome, AuthError> {
        let Some(session) = self.sessions.take(session_token) else {
            return Ok(ChallengeOutcome::Mismatch);
        };

        if challenge::expired(
            session.challenge_issued_at,
            self.config.challenge_ttl(),
            Utc::now(),
        ) {
            debug!(username = %session.username, "Second factor challenge expired");
            return Ok(ChallengeOutcome::Expired);
        }

        if !challenge::code_matches(&session.challenge_code, submitted_code) {
            info!(username = %session.username, "Second factor code mismatch");
            return Ok(ChallengeOutcome::Mismatch);
        }

        let session_token = challenge::generate_session_token().map_err(AuthError::Session)?;
        debug!(username = %session.username, "Second factor complete");
        Ok(ChallengeOutcome::Success {
            username: session.username,
            session_token,
        })
    }

    fn issue_challenge(&self, username: &str) -> Result<String, AuthError> {
        let code = challenge::generate_code().map_err(AuthError::Session)?;
        let token = challenge::generate_session_token().map_err(AuthError::Session)?;

        self.sender.send(username, &code).map_err(AuthError::Session)?;

        self.sessions.insert(PendingSession {
            token: token.clone(),
            username: username.to_string(),
            challenge_code: code,
            challenge_issued_at: Utc::now(),
        });

        Ok(token)
    }
}

// Strict identifier shape: 3 to 20 word characters.
fn valid_identifier(value: &str) -> bool {
    Regex::new(r"^[a-zA-Z0-9_]{3,20}$").is_ok_and(|pattern| pattern.is_match(value))
}
