use std::sync::Arc;
use std::time::Duration;

use coffer_crypto::Cipher;
use coffer_db::{connect_sqlite, migrate_local};

use crate::cli_args::{Cli, Command};
use crate::modules::auth::{handle_login, handle_logout, handle_register, TokenCache};
use crate::modules::entries::{
    handle_add, handle_ls, handle_rm, handle_show, handle_update, LocalVault,
};
use crate::modules::remote::HttpRemote;
use crate::modules::sync::handle_sync;
use crate::modules::system::{load_config, load_or_create_key, ClientError, CofferHome, CommandContext};

/// Opens the local vault, runs one command and persists the token cache.
pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let home = CofferHome::resolve(cli.home)?;
    home.ensure_exists()?;
    let mut config = load_config(&home)?;
    if let Some(addr) = cli.addr {
        config.addr = addr;
    }
    let key = load_or_create_key(&home)?;

    let pool = connect_sqlite(&home.db_url())
        .await
        .map_err(ClientError::from)?;
    migrate_local(&pool).await?;

    let tokens = Arc::new(TokenCache::new());
    {
        let mut conn = pool.acquire().await.map_err(ClientError::from)?;
        tokens.load(&mut conn).await.map_err(ClientError::from)?;
    }

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.request_timeout_secs))
        .build()?;
    let remote = Arc::new(HttpRemote::new(client, &config.addr, Arc::clone(&tokens)));
    let ctx = CommandContext {
        vault: LocalVault::new(pool.clone(), Arc::new(Cipher::from_key(&key))),
        remote,
        tokens: Arc::clone(&tokens),
        config,
    };

    let result = handle_command(cli.command, &ctx).await;

    let mut conn = pool.acquire().await.map_err(ClientError::from)?;
    tokens.flush(&mut conn).await.map_err(ClientError::from)?;
    drop(conn);
    pool.close().await;
    result
}

pub(crate) async fn handle_command(command: Command, ctx: &CommandContext) -> anyhow::Result<()> {
    match command {
        Command::Register(args) => handle_register(args, ctx).await?,
        Command::Login(args) => handle_login(args, ctx).await?,
        Command::Logout => handle_logout(ctx).await?,
        Command::Add(args) => handle_add(args, ctx).await?,
        Command::Update(args) => handle_update(args, ctx).await?,
        Command::Rm(args) => handle_rm(args, ctx).await?,
        Command::Show(args) => handle_show(args, ctx).await?,
        Command::Ls => handle_ls(ctx).await?,
        Command::Sync => handle_sync(ctx).await?,
    }

    Ok(())
}

/// Text printed after `error: ` when a command fails.
pub fn describe_error(err: &anyhow::Error) -> String {
    match err.downcast_ref::<ClientError>() {
        Some(client_error) => client_error.status_message(),
        None => format!("{err:#}"),
    }
}
