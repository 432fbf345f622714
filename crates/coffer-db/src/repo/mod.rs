macro_rules! query {
    ($sql:expr $(, $arg:expr)* $(,)?) => {{
        #[allow(unused_mut)]
        let mut q = sqlx_core::query::query::<sqlx_postgres::Postgres>($sql);
        $(q = q.bind($arg);)*
        q
    }};
}

macro_rules! query_as {
    ($ty:ty, $sql:expr $(, $arg:expr)* $(,)?) => {{
        #[allow(unused_mut)]
        let mut q = sqlx_core::query_as::query_as::<sqlx_postgres::Postgres, $ty>($sql);
        $(q = q.bind($arg);)*
        q
    }};
}

pub(crate) mod prelude {
    pub(crate) use coffer_core::{Entry, EntryVersion, User};
    pub(crate) use sqlx_core::types::Json;
    pub(crate) use sqlx_postgres::PgConnection;
    pub(crate) use uuid::Uuid;
}

mod entries;
mod users;

pub use entries::EntryRepo;
pub use users::UserRepo;
