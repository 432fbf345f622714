//! Scoped unit of work over a pooled transaction.

use sqlx_core::database::Database;
use sqlx_core::pool::Pool;
use sqlx_core::transaction::Transaction;

/// Explicit transaction handle passed to repositories.
///
/// Dropping it without [`UnitOfWork::commit`] rolls the transaction back, so an
/// early `?` return or a cancelled future never persists a partial write.
pub struct UnitOfWork<DB: Database> {
    tx: Transaction<'static, DB>,
    scope: &'static str,
}

impl<DB: Database> UnitOfWork<DB> {
    pub async fn begin(pool: &Pool<DB>, scope: &'static str) -> Result<Self, sqlx_core::Error> {
        let tx = pool.begin().await?;
        tracing::debug!(event = "tx_begin", scope, "Transaction started");
        Ok(Self { tx, scope })
    }

    pub fn conn(&mut self) -> &mut DB::Connection {
        &mut self.tx
    }

    #[must_use]
    pub fn scope(&self) -> &'static str {
        self.scope
    }

    pub async fn commit(self) -> Result<(), sqlx_core::Error> {
        let scope = self.scope;
        self.tx.commit().await?;
        tracing::debug!(event = "tx_commit", scope, "Transaction committed");
        Ok(())
    }

    pub async fn rollback(self) -> Result<(), sqlx_core::Error> {
        let scope = self.scope;
        self.tx.rollback().await?;
        tracing::debug!(event = "tx_rollback", scope, "Transaction rolled back");
        Ok(())
    }
}
