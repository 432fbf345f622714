use coffer_db::{PgPool, UnitOfWork};
use sqlx_core::query::query;
use sqlx_postgres::{PgConnection, Postgres};

use crate::settings::DbTxIsolation;

pub async fn apply_tx_isolation(
    conn: &mut PgConnection,
    isolation: DbTxIsolation,
) -> Result<(), sqlx_core::Error> {
    match isolation {
        DbTxIsolation::ReadCommitted => {
            query::<Postgres>("SET TRANSACTION ISOLATION LEVEL READ COMMITTED")
        }
        DbTxIsolation::RepeatableRead => {
            query::<Postgres>("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ")
        }
        DbTxIsolation::Serializable => {
            query::<Postgres>("SET TRANSACTION ISOLATION LEVEL SERIALIZABLE")
        }
    }
    .execute(&mut *conn)
    .await
    .map(|_| ())
}

/// Opens a unit of work with the configured isolation level already set.
pub async fn begin(
    pool: &PgPool,
    isolation: DbTxIsolation,
    scope: &'static str,
) -> Result<UnitOfWork<Postgres>, sqlx_core::Error> {
    let mut uow = UnitOfWork::begin(pool, scope).await?;
    apply_tx_isolation(uow.conn(), isolation).await?;
    Ok(uow)
}

/// Attempts per unit of work before a serialization failure is reported.
pub const MAX_TX_ATTEMPTS: u32 = 8;

/// SQLSTATE 40001 (serialization_failure) and 40P01 (deadlock_detected):
/// the transaction was rolled back and can be rerun unchanged.
pub fn is_serialization_failure(err: &sqlx_core::Error) -> bool {
    err.as_database_error()
        .and_then(|db_err| db_err.code())
        .is_some_and(|code| code == "40001" || code == "40P01")
}
