macro_rules! query {
    ($sql:expr $(, $arg:expr)* $(,)?) => {{
        #[allow(unused_mut)]
        let mut q = sqlx_core::query::query::<sqlx_sqlite::Sqlite>($sql);
        $(q = q.bind($arg);)*
        q
    }};
}

macro_rules! query_as {
    ($ty:ty, $sql:expr $(, $arg:expr)* $(,)?) => {{
        #[allow(unused_mut)]
        let mut q = sqlx_core::query_as::query_as::<sqlx_sqlite::Sqlite, $ty>($sql);
        $(q = q.bind($arg);)*
        q
    }};
}

mod entry_repo;
mod ledger_repo;
mod metadata_repo;
mod models;

pub use entry_repo::LocalEntryRepo;
pub use ledger_repo::SyncLedgerRepo;
pub use metadata_repo::MetadataRepo;
pub use models::{LedgerEntry, LocalEntry};
