mod actions;
pub mod args;
mod store;

pub(crate) use actions::{handle_add, handle_ls, handle_rm, handle_show, handle_update};
pub use store::{EntrySummary, LocalVault, VaultEntry};
