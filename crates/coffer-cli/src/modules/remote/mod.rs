mod http;

pub use http::HttpRemote;
