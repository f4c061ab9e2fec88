//! One-time code generation, comparison and delivery for the second factor.

use anyhow::{Context, Result};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::{DateTime, Utc};
use rand::{rngs::OsRng, RngCore};
use std::time::Duration;
use subtle::ConstantTimeEq;
use tracing::info;

const CODE_SPACE: u32 = 1_000_000;
const SESSION_TOKEN_BYTES: usize = 32;

/// Result of resolving a one-time code submission against its pending
/// session.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ChallengeOutcome {
    /// Code matched before expiry. The pending session is consumed and the
    /// caller holds a completed login.
    Success {
        username: String,
        session_token: String,
    },
    /// Unknown token, already-consumed challenge, or wrong code. A wrong
    /// code consumes the challenge, so the caller starts over at login.
    Mismatch,
    /// The challenge aged past its lifetime before the code arrived.
    Expired,
}

/// Out-of-band delivery for issued codes.
pub trait ChallengeSender: Send + Sync {
    /// Deliver the code to the account holder, or fail the issuance.
    fn send(&self, username: &str, code: &str) -> Result<()>;
}

/// Delivery stub for local runs: writes the code to the operator log
/// instead of sending it anywhere.
#[derive(Clone, Copy, Debug)]
pub struct LogChallengeSender;

impl ChallengeSender for LogChallengeSender {
    fn send(&self, username: &str, code: &str) -> Result<()> {
        info!(username, code, "Second factor code issued");
        Ok(())
    }
}

/// Draw a six-digit code from the OS random source.
///
/// Rejection sampling keeps every code equally likely.
pub(crate) fn generate_code() -> Result<String> {
    let bound = u32::MAX - u32::MAX % CODE_SPACE;
    loop {
        let mut bytes = [0u8; 4];
        OsRng
            .try_fill_bytes(&mut bytes)
            .context("failed to draw second factor code")?;
        let value = u32::from_be_bytes(bytes);
        if value < bound {
            return Ok(format!("{:06}", value % CODE_SPACE));
        }
    }
}

/// Create an unguessable session token, URL-safe for headers and cookies.
pub(crate) fn generate_session_token() -> Result<String> {
    let mut bytes = [0u8; SESSION_TOKEN_BYTES];
    OsRng
        .try_fill_bytes(&mut bytes)
        .context("failed to generate session token")?;
    Ok(URL_SAFE_NO_PAD.encode(bytes))
}

pub(crate) fn code_matches(stored: &str, submitted: &str) -> bool {
    bool::from(stored.as_bytes().ct_eq(submitted.as_bytes()))
}

pub(crate) fn expired(issued_at: DateTime<Utc>, ttl: Duration, now: DateTime<Utc>) -> bool {
    let ttl = chrono::Duration::from_std(ttl).unwrap_or(chrono::Duration::MAX);
    now.signed_duration_since(issued_at) >= ttl
}
