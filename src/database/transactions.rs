// ABOUTME: Transaction management with RAII guards and bounded retry for storage operations
// ABOUTME: Rolls back uncommitted units of work and retries only transient storage failures
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Formulador Contributors

//! Transaction management with RAII guards and retry patterns
//!
//! - [`TransactionGuard`] rolls back automatically unless `commit()` is reached.
//! - [`retry_transaction`] re-runs a whole unit of work with exponential
//!   backoff when it fails with a transient storage error.
//!
//! ```text
//! retry_transaction(|| async move {
//!     let mut guard = TransactionGuard::new(pool.begin().await?);
//!     let ingredient = IngredientResolver::resolve_or_create(guard.executor()?, name, user_id).await?;
//!     sqlx::query("INSERT INTO formula_lines ...").execute(guard.executor()?).await?;
//!     guard.commit().await?;
//!     Ok(ingredient)
//! }, 3).await
//! ```
//!
//! Because the closure opens its own transaction, a retried attempt starts
//! from a clean slate: nothing from a failed attempt is ever committed.

use std::future::Future;
use std::time::Duration;

use sqlx::{Database, Transaction};
use tokio::time::sleep;
use tracing::{debug, error, warn};

use crate::errors::{AppError, AppResult};

/// Base backoff before the first retry
const BASE_BACKOFF_MS: u64 = 10;

/// Run `f` up to `max_attempts` times, retrying only transient storage errors
///
/// Backoff doubles per attempt: 20ms, 40ms, 80ms, ...
///
/// # Errors
///
/// Returns the first non-transient error immediately, or the last transient
/// error once `max_attempts` is exhausted.
pub async fn retry_transaction<F, Fut, T>(mut f: F, max_attempts: u32) -> AppResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = AppResult<T>>,
{
    let max_attempts = max_attempts.max(1);
    let mut attempts = 0;
    loop {
        match f().await {
            Ok(result) => return Ok(result),
            Err(e) => {
                attempts += 1;
                if !e.is_transient() {
                    debug!(attempts, error = %e, "Transaction failed with non-retryable error");
                    return Err(e);
                }
                if attempts >= max_attempts {
                    error!(
                        attempts,
                        max_attempts,
                        error = %e,
                        "Transaction failed after max retries"
                    );
                    return Err(e);
                }

                let backoff_ms = BASE_BACKOFF_MS * (1 << attempts);
                warn!(
                    attempt = attempts,
                    max_attempts,
                    backoff_ms,
                    error = %e,
                    "Transaction failed with retryable error, retrying after backoff"
                );
                sleep(Duration::from_millis(backoff_ms)).await;
            }
        }
    }
}

/// RAII guard for database transactions ensuring automatic rollback on drop
///
/// If an error propagates before `commit()`, the guard is dropped and `SQLx`
/// rolls the transaction back.
pub struct TransactionGuard<'c, DB: Database> {
    transaction: Option<Transaction<'c, DB>>,
}

impl<'c, DB: Database> TransactionGuard<'c, DB> {
    /// Wrap a transaction obtained from `pool.begin().await`
    #[must_use]
    pub fn new(transaction: Transaction<'c, DB>) -> Self {
        Self {
            transaction: Some(transaction),
        }
    }

    /// Commit the transaction and consume the guard
    ///
    /// # Errors
    ///
    /// Returns an error if the commit fails or the guard was already consumed
    pub async fn commit(mut self) -> AppResult<()> {
        let Some(tx) = self.transaction.take() else {
            return Err(AppError::internal(
                "Transaction already consumed - cannot commit",
            ));
        };
        tx.commit().await.map_err(|e| {
            let mut err = AppError::from(e);
            err.message = format!("Transaction commit failed: {}", err.message);
            err
        })?;
        debug!("TransactionGuard committed");
        Ok(())
    }

    /// Connection for executing queries inside the transaction
    ///
    /// # Errors
    ///
    /// Returns an error if the guard has already been consumed
    pub fn executor(&mut self) -> AppResult<&mut <DB as Database>::Connection> {
        self.transaction.as_deref_mut().ok_or_else(|| {
            AppError::internal("Transaction already consumed - guard used after commit")
        })
    }
}

impl<DB: Database> Drop for TransactionGuard<'_, DB> {
    fn drop(&mut self) {
        if self.transaction.is_some() {
            debug!("TransactionGuard dropped without commit - rolling back");
        }
    }
}

/// Type alias for `SQLite` transaction guard
pub type SqliteTransactionGuard<'c> = TransactionGuard<'c, sqlx::Sqlite>;
