use std::sync::Arc;

use crate::modules::auth::TokenCache;
use crate::modules::entries::LocalVault;
use crate::modules::remote::HttpRemote;
use crate::modules::system::CliConfig;

/// Dependencies shared by every command handler.
pub struct CommandContext {
    pub config: CliConfig,
    pub vault: LocalVault,
    pub remote: Arc<HttpRemote>,
    pub tokens: Arc<TokenCache>,
}
