#![allow(clippy::pedantic)]
#![allow(clippy::nursery)]
#![deny(clippy::unwrap_used)]
#![allow(clippy::missing_errors_doc)]

pub mod api;
pub mod auth;
pub mod constants;
pub mod diff;
pub mod models;
pub mod services;
pub mod validation;

pub use crate::auth::*;
pub use crate::constants::*;
pub use crate::diff::*;
pub use crate::models::*;
pub use crate::services::*;
pub use crate::validation::*;
