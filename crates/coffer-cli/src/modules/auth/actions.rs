use tracing::info;

use super::args::CredentialsArgs;
use crate::modules::system::{ClientError, CommandContext};

pub(crate) async fn handle_register(
    args: CredentialsArgs,
    ctx: &CommandContext,
) -> anyhow::Result<()> {
    let response = ctx
        .remote
        .register(&args.login, &args.password)
        .await
        .map_err(ClientError::from)?;
    info!(event = "registered", user_id = %response.user_id);
    println!("{}", response.user_id);
    Ok(())
}

pub(crate) async fn handle_login(args: CredentialsArgs, ctx: &CommandContext) -> anyhow::Result<()> {
    let response = ctx
        .remote
        .login(&args.login, &args.password)
        .await
        .map_err(ClientError::from)?;
    ctx.tokens.set(response.access_token).await;
    info!(event = "logged_in", expires_at = %response.expires_at);
    println!("logged in until {}", response.expires_at.to_rfc3339());
    Ok(())
}

pub(crate) async fn handle_logout(ctx: &CommandContext) -> anyhow::Result<()> {
    ctx.tokens.clear().await;
    println!("logged out");
    Ok(())
}
