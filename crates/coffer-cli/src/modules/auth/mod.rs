mod actions;
pub mod args;
mod token_cache;

pub(crate) use actions::{handle_login, handle_logout, handle_register};
pub use token_cache::{TokenCache, ACCESS_TOKEN_KEY};
