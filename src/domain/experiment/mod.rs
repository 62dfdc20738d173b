//! Experiment domain module
//!
//! Types for naming experiments, the per-instance coordination between an
//! experiment and its branch switches, and the switches themselves.

mod context;
mod entity;
mod switch;
mod validation;

// Re-export all public types
pub use context::{ExperimentContext, FallbackPolicy, NameCell};
pub use entity::{ExperimentName, ProviderExperimentId};
pub use switch::{BranchContent, VariationSwitch};
pub use validation::{
    validate_experiment_name, validate_provider_experiment_id, NameValidationError,
    MAX_EXPERIMENT_NAME_LENGTH, MAX_PROVIDER_EXPERIMENT_ID_LENGTH,
};

#[cfg(test)]
pub use switch::mock::RecordingContent;
