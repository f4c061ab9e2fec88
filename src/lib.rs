//! # Guardia (Credential Authentication Gate)
//!
//! `guardia` fronts a credential store with a small authentication service.
//! Every login submission is verified against the store, appended to an
//! attempt ledger, and measured against a sliding-window throttle before a
//! session is issued.
//!
//! ## Attempt Ledger
//!
//! Each submission is recorded with its source address, claimed username,
//! outcome and a fixed-precision RFC 3339 timestamp. The ledger is
//! append-only and best-effort: a slow or locked store never blocks the
//! authentication decision.
//!
//! ## Throttling
//!
//! A source over the failure threshold within the trailing window is either
//! flagged (`warn`, the default) or refused outright (`block`). The count is
//! derived from the ledger on every evaluation, so it recovers on its own as
//! failures age out of the window.
//!
//! ## Second Factor
//!
//! When enabled, a verified login parks in a pending session until the
//! caller returns a six-digit one-time code. Challenges are single-use and
//! expire after a configurable lifetime.

pub mod api;
pub mod auth;
pub mod cli;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_git_commit_hash_format() {
        if GIT_COMMIT_HASH == "unknown" {
            // Acceptable in non-git build environments
            return;
        }
        // Should be a hex string (full SHA-1 is 40 chars, but could be short)
        assert!(
            GIT_COMMIT_HASH.chars().all(|c| c.is_ascii_hexdigit()),
            "GIT_COMMIT_HASH should be a hex string, got: {GIT_COMMIT_HASH}"
        );
        assert!(
            GIT_COMMIT_HASH.len() >= 7,
            "GIT_COMMIT_HASH should be at least 7 characters long, got: {GIT_COMMIT_HASH}"
        );
    }
}
