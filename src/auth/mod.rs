//! Credential authentication core: verifier, attempt ledger, throttle policy,
//! the orchestrating gate, and the second-factor challenge flow.

pub mod challenge;
pub mod config;
pub mod error;
pub mod gate;
pub mod ledger;
pub mod session;
pub mod store;
pub mod throttle;
pub mod verifier;

#[cfg(test)]
pub(crate) mod test_support;

pub use challenge::{ChallengeOutcome, ChallengeSender, LogChallengeSender};
pub use config::{GateConfig, ThrottleMode};
pub use error::AuthError;
pub use gate::{Gate, GateOutcome};
pub use ledger::{Attempt, AttemptLedger, AttemptOutcome};
pub use session::{MemorySessionStore, PendingSession, SessionStore};
pub use throttle::{ThrottleAction, ThrottleDecision, ThrottlePolicy};
pub use verifier::{CredentialVerifier, Verification};
