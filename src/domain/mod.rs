//! Domain layer - Core business logic and entities

pub mod error;
pub mod experiment;
pub mod provider;
pub mod variation;

pub use error::VariationError;
pub use experiment::{
    validate_experiment_name, validate_provider_experiment_id, BranchContent, ExperimentContext,
    ExperimentName, FallbackPolicy, NameCell, NameValidationError, ProviderExperimentId,
    VariationSwitch,
};
pub use provider::{ProviderClient, ProviderScriptLoader};
pub use variation::{VariationResolver, VariationValue};
