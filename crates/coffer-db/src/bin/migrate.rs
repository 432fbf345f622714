use coffer_db::{connect_postgres, migrate};

#[tokio::main]
async fn main() {
    let db_url = std::env::var("COFFER_DB_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .expect("COFFER_DB_URL or DATABASE_URL must be set");
    let pool = connect_postgres(&db_url)
        .await
        .expect("failed to connect to database");
    migrate(&pool).await.expect("failed to run migrations");
}
