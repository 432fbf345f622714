use super::prelude::*;
use tracing::{instrument, Span};

pub struct UserRepo<'a> {
    conn: &'a mut PgConnection,
}

impl<'a> UserRepo<'a> {
    pub fn new(conn: &'a mut PgConnection) -> Self {
        Self { conn }
    }

    /// Returns `false` when the login is already taken.
    #[instrument(
        level = "debug",
        skip(self, user),
        fields(user_id = %user.id, db.system = "postgresql", db.operation = "INSERT", db.query = "users.create", db.rows)
    )]
    pub async fn create(&mut self, user: &User) -> Result<bool, sqlx_core::Error> {
        query!(
            r#"
            INSERT INTO users (id, login, password_hash, created_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (login) DO NOTHING
            "#,
            user.id,
            user.login.as_str(),
            user.password_hash.as_str(),
            user.created_at
        )
        .execute(&mut *self.conn)
        .await
        .map(|result| {
            Span::current().record("db.rows", result.rows_affected() as i64);
            result.rows_affected() == 1
        })
    }

    #[instrument(
        level = "debug",
        skip(self, login),
        fields(db.system = "postgresql", db.operation = "SELECT", db.query = "users.get_by_login")
    )]
    pub async fn get_by_login(&mut self, login: &str) -> Result<Option<User>, sqlx_core::Error> {
        query_as!(
            User,
            r#"
            SELECT id, login, password_hash, created_at
            FROM users
            WHERE login = $1
            "#,
            login
        )
        .fetch_optional(&mut *self.conn)
        .await
    }

    #[instrument(
        level = "debug",
        skip(self),
        fields(user_id = %id, db.system = "postgresql", db.operation = "SELECT", db.query = "users.get_by_id")
    )]
    pub async fn get_by_id(&mut self, id: Uuid) -> Result<Option<User>, sqlx_core::Error> {
        query_as!(
            User,
            r#"
            SELECT id, login, password_hash, created_at
            FROM users
            WHERE id = $1
            "#,
            id
        )
        .fetch_optional(&mut *self.conn)
        .await
    }
}
