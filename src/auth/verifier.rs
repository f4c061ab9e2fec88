//! Credential verification against the stored credential set.

use sqlx::{Row, SqlitePool};
use subtle::ConstantTimeEq;
use tracing::Instrument;

use super::error::AuthError;

// Inputs past these bounds fail to match without touching the store.
const MAX_USERNAME_BYTES: usize = 255;
const MAX_PASSWORD_BYTES: usize = 1024;

// Compared against when the username is unknown, so that path performs the
// same work as a wrong password against a real credential.
const DUMMY_SECRET: &str = "f2b1e6c8a9d4407b9c31a57e86d2f0c4";

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Verification {
    Match,
    NoMatch,
}

/// Read-only checker for username/password pairs.
///
/// Lookups are exact and case-sensitive. Secret comparison is constant-time,
/// and an unknown username takes the same store round-trip and comparison as
/// a known one, so the two failure cases are not distinguishable from the
/// outside.
#[derive(Clone, Debug)]
pub struct CredentialVerifier {
    pool: SqlitePool,
}

impl CredentialVerifier {
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Check a claimed pair against the credential set.
    ///
    /// Malformed input (empty username, overlong fields) is `NoMatch`, never
    /// an error.
    ///
    /// # Errors
    /// Returns `AuthError::CredentialStore` when the store cannot be read.
    pub async fn verify(
        &self,
        username: &str,
        password: &str,
    ) -> Result<Verification, AuthError> {
        if username.is_empty()
            || username.len() > MAX_USERNAME_BYTES
            || password.len() > MAX_PASSWORD_BYTES
        {
            return Ok(Verification::NoMatch);
        }

        let query = "SELECT secret FROM credentials WHERE username = ?1";
        let span = tracing::info_span!(
            "db.query",
            db.system = "sqlite",
            db.operation = "SELECT",
            db.statement = query
        );
        let row = sqlx::query(query)
            .bind(username)
            .fetch_optional(&self.pool)
            .instrument(span)
            .await
            .map_err(AuthError::CredentialStore)?;

        match row {
            Some(row) => {
                let secret: String = row.get("secret");
                if bool::from(password.as_bytes().ct_eq(secret.as_bytes())) {
                    Ok(Verification::Match)
                } else {
                    Ok(Verification::NoMatch)
                }
            }
            None => {
                // Unknown username: burn the same comparison, never match.
                let _ = bool::from(password.as_bytes().ct_eq(DUMMY_SECRET.as_bytes()));
                Ok(Verification::NoMatch)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::store::memory_pool;
    use super::{CredentialVerifier, Verification, DUMMY_SECRET, MAX_PASSWORD_BYTES};
    use anyhow::Result;
    use sqlx::SqlitePool;

    async fn seeded_pool() -> Result<SqlitePool> {
        let pool = memory_pool().await?;
        sqlx::query("INSERT INTO credentials (username, secret) VALUES (?1, ?2)")
            .bind("admin")
            .bind("hunter2")
            .execute(&pool)
            .await?;
        Ok(pool)
    }

    #[tokio::test]
    async fn matches_exact_credential() -> Result<()> {
        let verifier = CredentialVerifier::new(seeded_pool().await?);
        assert_eq!(
            verifier.verify("admin", "hunter2").await?,
            Verification::Match
        );
        Ok(())
    }

    #[tokio::test]
    async fn wrong_password_does_not_match() -> Result<()> {
        let verifier = CredentialVerifier::new(seeded_pool().await?);
        assert_eq!(
            verifier.verify("admin", "hunter3").await?,
            Verification::NoMatch
        );
        Ok(())
    }

    #[tokio::test]
    async fn unknown_username_does_not_match() -> Result<()> {
        let verifier = CredentialVerifier::new(seeded_pool().await?);
        assert_eq!(
            verifier.verify("root", "hunter2").await?,
            Verification::NoMatch
        );
        Ok(())
    }

    #[tokio::test]
    async fn username_lookup_is_case_sensitive() -> Result<()> {
        let verifier = CredentialVerifier::new(seeded_pool().await?);
        assert_eq!(
            verifier.verify("Admin", "hunter2").await?,
            Verification::NoMatch
        );
        Ok(())
    }

    #[tokio::test]
    async fn dummy_secret_never_authenticates() -> Result<()> {
        let verifier = CredentialVerifier::new(seeded_pool().await?);
        assert_eq!(
            verifier.verify("root", DUMMY_SECRET).await?,
            Verification::NoMatch
        );
        Ok(())
    }

    #[tokio::test]
    async fn malformed_input_is_no_match() -> Result<()> {
        let verifier = CredentialVerifier::new(seeded_pool().await?);

        assert_eq!(verifier.verify("", "hunter2").await?, Verification::NoMatch);
        assert_eq!(
            verifier.verify(&"a".repeat(300), "hunter2").await?,
            Verification::NoMatch
        );
        assert_eq!(
            verifier
                .verify("admin", &"a".repeat(MAX_PASSWORD_BYTES + 1))
                .await?,
            Verification::NoMatch
        );

        Ok(())
    }
}
