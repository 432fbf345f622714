pub mod config;
pub mod errors;
mod types;

pub use config::{load_config, load_or_create_key, save_config, CliConfig, CofferHome};
pub use errors::ClientError;
pub use types::CommandContext;
