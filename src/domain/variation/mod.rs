//! Variation domain module
//!
//! Defines the value a resolved experiment decision carries and the trait
//! consumers use to look one up by experiment name.

mod resolver;
mod value;

pub use resolver::VariationResolver;
pub use value::VariationValue;

#[cfg(test)]
pub use resolver::mock::MockVariationResolver;
