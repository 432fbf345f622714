#![allow(clippy::pedantic)]
#![allow(clippy::nursery)]
#![deny(clippy::unwrap_used)]
#![allow(clippy::missing_errors_doc)]

pub mod cipher;
pub mod passwords;

pub use crate::cipher::*;
pub use crate::passwords::*;
