use coffer_db::local::MetadataRepo;
use sqlx_sqlite::SqliteConnection;
use tokio::sync::RwLock;

pub const ACCESS_TOKEN_KEY: &str = "access_token";

/// In-process copy of the access token.
///
/// Readers share the lock; `set`, `clear` and `load` take it exclusively.
/// Persistence is explicit: `load` at startup, `flush` before exit.
#[derive(Default)]
pub struct TokenCache {
    token: RwLock<Option<String>>,
}

impl TokenCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self) -> Option<String> {
        self.token.read().await.clone()
    }

    pub async fn set(&self, token: String) {
        *self.token.write().await = Some(token);
    }

    pub async fn clear(&self) {
        *self.token.write().await = None;
    }

    pub async fn load(&self, conn: &mut SqliteConnection) -> Result<(), sqlx_core::Error> {
        let stored = MetadataRepo::new(conn).get_value(ACCESS_TOKEN_KEY).await?;
        tracing::debug!(event = "token_cache_loaded", present = stored.is_some());
        *self.token.write().await = stored;
        Ok(())
    }

    pub async fn flush(&self, conn: &mut SqliteConnection) -> Result<(), sqlx_core::Error> {
        let token = self.token.read().await;
        let mut repo = MetadataRepo::new(conn);
        match token.as_deref() {
            Some(value) => repo.set_value(ACCESS_TOKEN_KEY, value).await?,
            None => {
                repo.delete_value(ACCESS_TOKEN_KEY).await?;
            }
        }
        tracing::debug!(event = "token_cache_flushed", present = token.is_some());
        Ok(())
    }
}

impl std::fmt::Debug for TokenCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenCache").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use coffer_db::{connect_sqlite_memory, migrate_local};
    use std::sync::Arc;

    #[tokio::test]
    async fn flush_and_load_roundtrip() {
        let pool = connect_sqlite_memory().await.expect("connect");
        migrate_local(&pool).await.expect("migrate");
        let mut conn = pool.acquire().await.expect("acquire");

        let cache = TokenCache::new();
        cache.set("token-1".to_string()).await;
        cache.flush(&mut conn).await.expect("flush");

        let restored = TokenCache::new();
        restored.load(&mut conn).await.expect("load");
        assert_eq!(restored.get().await.as_deref(), Some("token-1"));

        restored.clear().await;
        restored.flush(&mut conn).await.expect("flush cleared");
        let empty = TokenCache::new();
        empty.set("stale".to_string()).await;
        empty.load(&mut conn).await.expect("load");
        assert_eq!(empty.get().await, None);
    }

    #[tokio::test]
    async fn concurrent_readers_see_latest_write() {
        let cache = Arc::new(TokenCache::new());
        cache.set("a".to_string()).await;
        let readers: Vec<_> = (0..8)
            .map(|_| {
                let cache = Arc::clone(&cache);
                tokio::spawn(async move { cache.get().await })
            })
            .collect();
        for reader in readers {
            assert_eq!(reader.await.expect("join").as_deref(), Some("a"));
        }
        cache.set("b".to_string()).await;
        assert_eq!(cache.get().await.as_deref(), Some("b"));
    }
}
