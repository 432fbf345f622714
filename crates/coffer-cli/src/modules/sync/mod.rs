mod actions;
mod engine;

pub(crate) use actions::handle_sync;
pub use engine::{SyncEngine, SyncReport};
