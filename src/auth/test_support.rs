//! Shared fixtures for gate and handler tests.

use anyhow::Result;
use sqlx::SqlitePool;
use std::sync::{Arc, Mutex, PoisonError};

use super::challenge::ChallengeSender;
use super::config::GateConfig;
use super::gate::Gate;
use super::ledger::AttemptLedger;
use super::session::MemorySessionStore;
use super::store::memory_pool;
use super::verifier::CredentialVerifier;

/// Sender that captures the last issued code instead of delivering it.
#[derive(Debug, Default)]
pub(crate) struct CapturingSender {
    last_code: Mutex<Option<String>>,
}

impl CapturingSender {
    pub(crate) fn last_code(&self) -> Option<String> {
        self.last_code
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl ChallengeSender for CapturingSender {
    fn send(&self, _username: &str, code: &str) -> Result<()> {
        *self
            .last_code
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(code.to_string());
        Ok(())
    }
}

pub(crate) struct TestGate {
    pub(crate) gate: Arc<Gate>,
    pub(crate) pool: SqlitePool,
    pub(crate) ledger: AttemptLedger,
    pub(crate) sessions: Arc<MemorySessionStore>,
    pub(crate) sender: Arc<CapturingSender>,
}

/// Gate over a fresh in-memory store seeded with `admin` / `hunter2`.
pub(crate) async fn gate_with_config(config: GateConfig) -> Result<TestGate> {
    let pool = memory_pool().await?;
    seed_credential(&pool, "admin", "hunter2").await?;

    let ledger = AttemptLedger::new(pool.clone());
    let sessions = Arc::new(MemorySessionStore::new(config.challenge_ttl()));
    let sender = Arc::new(CapturingSender::default());
    let gate = Arc::new(Gate::new(
        config,
        CredentialVerifier::new(pool.clone()),
        ledger.clone(),
        sessions.clone(),
        sender.clone(),
    ));

    Ok(TestGate {
        gate,
        pool,
        ledger,
        sessions,
        sender,
    })
}

pub(crate) async fn seed_credential(pool: &SqlitePool, username: &str, secret: &str) -> Result<()> {
    sqlx::query("INSERT INTO credentials (username, secret) VALUES (?1, ?2)")
        .bind(username)
        .bind(secret)
        .execute(pool)
        .await?;
    Ok(())
}
