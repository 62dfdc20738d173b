//! Variation registry implementations

mod in_memory;

pub use in_memory::VariationRegistry;
