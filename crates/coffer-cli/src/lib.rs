#![allow(clippy::pedantic)]
#![allow(clippy::nursery)]
#![deny(clippy::unwrap_used)]
#![allow(clippy::missing_errors_doc)]

pub mod cli_args;
pub mod cli_command;
pub mod modules;

pub use modules::auth::TokenCache;
pub use modules::entries::LocalVault;
pub use modules::remote::HttpRemote;
pub use modules::sync::{SyncEngine, SyncReport};
pub use modules::system::ClientError;
