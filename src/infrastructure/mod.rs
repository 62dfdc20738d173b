//! Infrastructure layer - External service implementations

pub mod bridge;
pub mod logging;
pub mod provider;
pub mod registry;
