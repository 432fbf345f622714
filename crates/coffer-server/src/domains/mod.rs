pub mod auth;
pub mod entries;
pub mod errors;
