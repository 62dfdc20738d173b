//! Provider integrations

mod http_loader;

pub use http_loader::HttpScriptLoader;
