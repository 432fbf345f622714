use std::sync::Arc;
use std::time::Duration;

use super::SyncEngine;
use crate::modules::system::{ClientError, CommandContext};

pub(crate) async fn handle_sync(ctx: &CommandContext) -> anyhow::Result<()> {
    if ctx.tokens.get().await.is_none() {
        return Err(ClientError::Unauthenticated.into());
    }
    let engine = SyncEngine::new(
        ctx.vault.clone(),
        Arc::clone(&ctx.remote),
        Duration::from_secs(ctx.config.sync_timeout_secs),
    );
    let report = engine.sync().await?;
    println!("{report}");
    Ok(())
}
