pub mod conflict;
pub mod http;
pub mod service;
