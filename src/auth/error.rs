//! Typed errors for the authentication core.

/// Faults the gate can hit while talking to its collaborators.
///
/// `LedgerUnavailable` is recovered by the gate: the authentication decision
/// proceeds on the verifier's result alone and the failure only reaches the
/// operator log. `CredentialStore` and `Session` abort the submission.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("credential store unavailable")]
    CredentialStore(#[source] sqlx::Error),
    #[error("attempt ledger unavailable")]
    LedgerUnavailable(#[source] sqlx::Error),
    #[error("session could not be issued")]
    Session(#[source] anyhow::Error),
}
