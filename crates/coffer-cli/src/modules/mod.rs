pub mod auth;
pub mod entries;
pub mod remote;
pub mod sync;
pub mod system;
