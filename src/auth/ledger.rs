//! Append-only ledger of verification attempts.

use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::{Row, SqlitePool};
use std::time::Duration;
use tracing::Instrument;

use super::error::AuthError;

/// Outcome of a single verification attempt. Stored as 0 (failure) or
/// 1 (success).
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum AttemptOutcome {
    Success,
    Failure,
}

impl AttemptOutcome {
    pub(crate) fn as_i64(self) -> i64 {
        match self {
            Self::Failure => 0,
            Self::Success => 1,
        }
    }
}

/// A recorded attempt. Rows are never mutated once written; ids increase
/// monotonically.
#[derive(Clone, Debug)]
pub struct Attempt {
    pub id: i64,
    pub source: String,
    pub claimed_username: String,
    pub outcome: AttemptOutcome,
    pub occurred_at: DateTime<Utc>,
}

/// Store of every login submission, keyed by an auto-incrementing id and
/// queryable per source over a trailing window.
#[derive(Clone, Debug)]
pub struct AttemptLedger {
    pool: SqlitePool,
}

impl AttemptLedger {
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Append an attempt stamped with the ledger's clock.
    ///
    /// # Errors
    /// Returns `AuthError::LedgerUnavailable` when the store rejects the
    /// write; the caller decides whether that blocks anything.
    pub async fn record(
        &self,
        source: &str,
        claimed_username: &str,
        outcome: AttemptOutcome,
    ) -> Result<Attempt, AuthError> {
        let occurred_at = Utc::now();

        let query = r"
            INSERT INTO login_attempts (source, claimed_username, outcome, occurred_at)
            VALUES (?1, ?2, ?3, ?4)
            RETURNING id
        ";
        let span = tracing::info_span!(
            "db.query",
            db.system = "sqlite",
            db.operation = "INSERT",
            db.statement = query
        );
        let row = sqlx::query(query)
            .bind(source)
            .bind(claimed_username)
            .bind(outcome.as_i64())
            .bind(format_timestamp(occurred_at))
            .fetch_one(&self.pool)
            .instrument(span)
            .await
            .map_err(AuthError::LedgerUnavailable)?;

        Ok(Attempt {
            id: row.get("id"),
            source: source.to_string(),
            claimed_username: claimed_username.to_string(),
            outcome,
            occurred_at,
        })
    }

    /// Count FAILURE attempts for `source` whose timestamp falls within
    /// `[now - window, now]`, lower bound inclusive. The cutoff comes from
    /// the ledger's clock at query time, not the attempts' write times.
    ///
    /// # Errors
    /// Returns `AuthError::LedgerUnavailable` when the store cannot be read.
    pub async fn count_recent_failures(
        &self,
        source: &str,
        window: Duration,
    ) -> Result<i64, AuthError> {
        let cutoff = window_cutoff(Utc::now(), window);

        let query = r"
            SELECT COUNT(*) AS failures
            FROM login_attempts
            WHERE source = ?1
              AND outcome = ?2
              AND occurred_at >= ?3
        ";
        let span = tracing::info_span!(
            "db.query",
            db.system = "sqlite",
            db.operation = "SELECT",
            db.statement = query
        );
        let row = sqlx::query(query)
            .bind(source)
            .bind(AttemptOutcome::Failure.as_i64())
            .bind(format_timestamp(cutoff))
            .fetch_one(&self.pool)
            .instrument(span)
            .await
            .map_err(AuthError::LedgerUnavailable)?;

        Ok(row.get("failures"))
    }
}

// Fixed fractional precision keeps the stored strings the same width, so
// string comparison in SQL matches chronological order.
fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn window_cutoff(now: DateTime<Utc>, window: Duration) -> DateTime<Utc> {
    let seconds = i64::try_from(window.as_secs()).unwrap_or(i64::MAX);
    let delta = chrono::Duration::try_seconds(seconds).unwrap_or(chrono::Duration::MAX);
    // An oversized window degrades to counting the whole ledger.
    now.checked_sub_signed(delta)
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}
