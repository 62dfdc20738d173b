//! Provider bridge implementation

mod service;

pub use service::VariationBridge;
