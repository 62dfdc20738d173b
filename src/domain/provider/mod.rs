//! External variation provider boundary
//!
//! The provider is reachable only through its client script; these traits
//! model loading that script for one experiment and querying it, both from
//! an isolated context and from the host context during hydration.

mod client;

pub use client::{ProviderClient, ProviderScriptLoader};

#[cfg(test)]
pub use client::mock::MockScriptLoader;
